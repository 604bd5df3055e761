//! Per-page orchestration: OCR, classification, extraction, matching.

use std::sync::Arc;

use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::classifier::classify_with_marker;
use super::keyword::KeywordExtractor;
use super::matcher::{PlateMatch, match_plate};
use super::region::RegionExtractor;
use super::rules::{discounted_amount, normalize_amount_with_unit, normalize_date_with_year};
use crate::error::PageError;
use crate::models::config::{ExtractionConfig, NoticeConfig};
use crate::models::notice::{
    Classification, ExtractionResult, Field, MatchedUser, NormalizedRecord, NoticeRow,
};
use crate::models::roster::Roster;
use crate::ocr::{NoticeText, OcrProvider};
use crate::template::Template;

/// Content of one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSource {
    /// Encoded page image; OCR runs on it.
    Image(Vec<u8>),
    /// Text already produced by OCR. Fixed-layout pages cannot use it.
    Text(String),
}

/// A page to process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInput {
    pub file_name: String,
    pub source: PageSource,
}

impl PageInput {
    pub fn image(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            source: PageSource::Image(bytes),
        }
    }

    pub fn text(file_name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            source: PageSource::Text(text.into()),
        }
    }
}

/// Outcome for one page. Pages are never dropped: failures carry a reason.
#[derive(Debug, Clone)]
pub struct PageReport {
    /// Position in the batch.
    pub index: usize,
    pub file_name: String,
    /// `None` only if the page failed before classification.
    pub classification: Option<Classification>,
    /// Raw per-field outcomes, when extraction ran.
    pub extraction: Option<ExtractionResult>,
    pub outcome: Result<NormalizedRecord, PageError>,
}

impl PageReport {
    /// Report for a page that could not even be loaded.
    pub fn failed(index: usize, file_name: impl Into<String>, error: PageError) -> Self {
        Self {
            index,
            file_name: file_name.into(),
            classification: None,
            extraction: None,
            outcome: Err(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn record(&self) -> Option<&NormalizedRecord> {
        self.outcome.as_ref().ok()
    }

    /// Tabular row; failed pages keep their file name and reason.
    pub fn to_row(&self) -> NoticeRow {
        match &self.outcome {
            Ok(record) => NoticeRow::from_record(record),
            Err(e) => NoticeRow::failed(&self.file_name, self.classification, &e.to_string()),
        }
    }
}

/// Build the canonical record for a page.
///
/// Dates are normalized again so that both strategies yield `YYYY/MM/DD`.
/// The roster plate replaces the extracted one on a match.
pub fn compile_record(
    file_name: &str,
    extraction: &ExtractionResult,
    matched: Option<&PlateMatch<'_>>,
    config: &ExtractionConfig,
    current_year: i32,
) -> NormalizedRecord {
    let fine = extraction.raw(Field::Fine).to_string();
    let discounted_fine = normalize_amount_with_unit(&fine, &config.currency_unit)
        .map(|amount| discounted_amount(&amount, config.discount_rate, &config.currency_unit).text);

    let plate_number = match matched {
        Some(m) => m.entry.plate_number.clone(),
        None => extraction.raw(Field::PlateNumber).to_string(),
    };

    NormalizedRecord {
        file_name: file_name.to_string(),
        classification: extraction.classification,
        plate_number,
        date: normalize_date_with_year(extraction.raw(Field::Date), current_year),
        location: extraction.raw(Field::Location).to_string(),
        fine,
        due_date: normalize_date_with_year(extraction.raw(Field::DueDate), current_year),
        description: extraction.raw(Field::Description).to_string(),
        discounted_fine,
        matched_user: matched.map(|m| MatchedUser {
            department: m.entry.department.clone(),
            name: m.entry.name.clone(),
            plate_number: m.entry.plate_number.clone(),
        }),
    }
}

/// Explicit processing context shared by every page of a batch.
///
/// Cloning is cheap; provider, template and roster are shared.
pub struct NoticePipeline<P: OcrProvider + ?Sized> {
    provider: Arc<P>,
    template: Option<Arc<Template>>,
    roster: Arc<Roster>,
    extraction: ExtractionConfig,
    marker: String,
    current_year: Option<i32>,
}

impl<P: OcrProvider + ?Sized> Clone for NoticePipeline<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            template: self.template.clone(),
            roster: Arc::clone(&self.roster),
            extraction: self.extraction.clone(),
            marker: self.marker.clone(),
            current_year: self.current_year,
        }
    }
}

impl<P: OcrProvider + ?Sized> NoticePipeline<P> {
    pub fn new(provider: Arc<P>, config: &NoticeConfig) -> Self {
        Self {
            provider,
            template: None,
            roster: Arc::new(Roster::default()),
            extraction: config.extraction.clone(),
            marker: config.classification.marker.clone(),
            current_year: None,
        }
    }

    pub fn with_template(mut self, template: impl Into<Arc<Template>>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn with_roster(mut self, roster: impl Into<Arc<Roster>>) -> Self {
        self.roster = roster.into();
        self
    }

    /// Fix the year used for dates without one.
    pub fn with_current_year(mut self, year: i32) -> Self {
        self.current_year = Some(year);
        self
    }

    pub fn template(&self) -> Option<&Template> {
        self.template.as_deref()
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    fn year(&self) -> i32 {
        self.current_year.unwrap_or_else(|| Local::now().year())
    }

    /// Process one page. Never panics on bad input; failures are reported.
    pub fn process_page(&self, index: usize, page: &PageInput) -> PageReport {
        // std::time::Instant is unavailable on wasm32.
        let start = Local::now();
        let year = self.year();

        let (text, image) = match &page.source {
            PageSource::Text(text) => (NoticeText::new(text.as_str()), None),
            PageSource::Image(bytes) => {
                let text = self.provider.text_detect(bytes).unwrap_or_else(|e| {
                    warn!("Full-page OCR failed for {}: {}", page.file_name, e);
                    String::new()
                });
                (NoticeText::new(text), Some(bytes.as_slice()))
            }
        };
        debug!("{}: {} lines of text", page.file_name, text.lines.len());

        let classification = classify_with_marker(&text.text, &self.marker);

        let extraction = match classification {
            Classification::FixedLayout => self.extract_fixed_layout(image, year),
            Classification::Generic => Ok(KeywordExtractor::new(&self.extraction)
                .with_current_year(year)
                .extract(&text)),
        };

        let (extraction, outcome) = match extraction {
            Ok(extraction) => {
                let matched = match_plate(extraction.raw(Field::PlateNumber), &self.roster);
                let record =
                    compile_record(&page.file_name, &extraction, matched.as_ref(), &self.extraction, year);
                (Some(extraction), Ok(record))
            }
            Err(e) => {
                warn!("Page {} ({}) failed: {}", index + 1, page.file_name, e);
                (None, Err(e))
            }
        };

        info!(
            "Processed page {} ({}) as {} in {}ms",
            index + 1,
            page.file_name,
            classification,
            (Local::now() - start).num_milliseconds()
        );

        PageReport {
            index,
            file_name: page.file_name.clone(),
            classification: Some(classification),
            extraction,
            outcome,
        }
    }

    fn extract_fixed_layout(&self, image: Option<&[u8]>, year: i32) -> Result<ExtractionResult, PageError> {
        let template = self.template.as_deref().ok_or(PageError::MissingTemplate)?;
        let bytes = image.ok_or(PageError::MissingImage)?;
        let image = image::load_from_memory(bytes).map_err(|e| PageError::Decode(e.to_string()))?;

        Ok(RegionExtractor::new(self.provider.as_ref(), template, &self.extraction)
            .with_current_year(year)
            .extract(&image))
    }

    /// Process pages sequentially; reports keep page order.
    pub fn process_batch(&self, pages: &[PageInput]) -> Vec<PageReport> {
        info!("Processing {} pages with {}", pages.len(), self.provider_name());

        pages
            .iter()
            .enumerate()
            .map(|(index, page)| self.process_page(index, page))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OcrError;
    use crate::models::notice::MATCH_FAILED;
    use crate::models::roster::RosterEntry;
    use crate::ocr::{UnavailableProvider, encode_png};
    use crate::template::Region;
    use image::{DynamicImage, RgbImage};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const GENERIC: &str = "과태료 부과 사전통지서
차량번호 12가 3456
위반일시 2024.03.05
위반장소 서울 종로구 세종대로
위반내용 신호 위반
과태료 50,000원 (감경 10,000원)
납부기한 2024.04.10";

    fn roster() -> Roster {
        Roster::new(vec![
            RosterEntry::new("12가3456", "김철수", "총무팀"),
            RosterEntry::new("34나7890", "이영희", "영업팀"),
        ])
    }

    fn pipeline<P: OcrProvider + ?Sized>(provider: Arc<P>) -> NoticePipeline<P> {
        NoticePipeline::new(provider, &NoticeConfig::default())
            .with_roster(roster())
            .with_current_year(2025)
    }

    /// Full-page call returns the page text, region calls return a fixed reply.
    struct FixedLayoutProvider {
        calls: AtomicUsize,
    }

    impl OcrProvider for FixedLayoutProvider {
        fn text_detect(&self, _image: &[u8]) -> Result<String, OcrError> {
            match self.calls.fetch_add(1, Ordering::SeqCst) {
                0 => Ok("서울경찰청 고지서".to_string()),
                1 => Ok("34 나 7890".to_string()),
                2 => Err(OcrError::Provider("timeout".to_string())),
                _ => Ok("80,000원".to_string()),
            }
        }
    }

    fn png_page() -> Vec<u8> {
        encode_png(&DynamicImage::ImageRgb8(RgbImage::new(120, 120))).unwrap()
    }

    fn template() -> Template {
        let mut regions = BTreeMap::new();
        regions.insert(Field::PlateNumber, Region::new(0, 0, 60, 20).unwrap());
        regions.insert(Field::Date, Region::new(0, 30, 60, 50).unwrap());
        regions.insert(Field::Fine, Region::new(0, 60, 60, 80).unwrap());
        Template::new("police_notice", (120, 120), regions)
    }

    #[test]
    fn test_generic_text_page() {
        let pipeline = pipeline(Arc::new(UnavailableProvider));
        let report = pipeline.process_page(0, &PageInput::text("a.txt", GENERIC));

        assert_eq!(report.classification, Some(Classification::Generic));
        let record = report.record().unwrap();
        assert_eq!(record.plate_number, "12가3456");
        assert_eq!(record.date, "2024/03/05");
        assert_eq!(record.fine, "50,000원");
        assert_eq!(record.discounted_fine.as_deref(), Some("40,000원"));
        assert_eq!(record.due_date, "2024/04/10");
        assert_eq!(record.matched_user.as_ref().unwrap().name, "김철수");
    }

    #[test]
    fn test_unmatched_plate_keeps_extracted_value() {
        let pipeline = pipeline(Arc::new(UnavailableProvider));
        let report = pipeline.process_page(0, &PageInput::text("b.txt", "차량 56다 1111\n과태료 40,000원"));

        let record = report.record().unwrap();
        assert_eq!(record.plate_number, "1111");
        assert!(record.matched_user.is_none());
        assert_eq!(report.to_row().department, MATCH_FAILED);
    }

    #[test]
    fn test_fixed_layout_page() {
        let provider = Arc::new(FixedLayoutProvider {
            calls: AtomicUsize::new(0),
        });
        let pipeline = pipeline(provider).with_template(template());

        let report = pipeline.process_page(3, &PageInput::image("scan.png", png_page()));

        assert_eq!(report.index, 3);
        assert_eq!(report.classification, Some(Classification::FixedLayout));
        let extraction = report.extraction.as_ref().unwrap();
        assert_eq!(extraction.failures().count(), 1);

        let record = report.record().unwrap();
        assert_eq!(record.plate_number, "34나7890");
        assert_eq!(record.matched_user.as_ref().unwrap().department, "영업팀");
        assert_eq!(record.date, "2025/00/00");
        assert_eq!(record.fine, "80,000원");
        assert_eq!(record.discounted_fine.as_deref(), Some("64,000원"));
        assert_eq!(record.location, "");
    }

    #[test]
    fn test_fixed_layout_without_template() {
        let pipeline = pipeline(Arc::new(UnavailableProvider));
        let report = pipeline.process_page(0, &PageInput::text("c.txt", "경찰청 고지"));

        assert_eq!(report.classification, Some(Classification::FixedLayout));
        assert_eq!(report.outcome.unwrap_err(), PageError::MissingTemplate);
    }

    #[test]
    fn test_fixed_layout_text_page_needs_image() {
        let pipeline = pipeline(Arc::new(UnavailableProvider)).with_template(template());
        let report = pipeline.process_page(0, &PageInput::text("d.txt", "경찰청 고지"));

        assert_eq!(report.outcome.unwrap_err(), PageError::MissingImage);
    }

    #[test]
    fn test_ocr_failure_degrades_to_generic() {
        let pipeline = pipeline(Arc::new(UnavailableProvider));
        let report = pipeline.process_page(0, &PageInput::image("e.png", vec![1, 2, 3]));

        assert_eq!(report.classification, Some(Classification::Generic));
        let record = report.record().unwrap();
        assert_eq!(record.plate_number, "");
        assert_eq!(record.date, "2025/00/00");
        assert_eq!(record.discounted_fine, None);
    }

    #[test]
    fn test_batch_keeps_order_and_failures() {
        let pipeline = pipeline(Arc::new(UnavailableProvider));
        let pages = vec![
            PageInput::text("1.txt", GENERIC),
            PageInput::text("2.txt", "경찰청 고지"),
            PageInput::text("3.txt", "차량번호 34나 7890"),
        ];

        let reports = pipeline.process_batch(&pages);

        assert_eq!(
            reports.iter().map(|r| r.file_name.as_str()).collect::<Vec<_>>(),
            vec!["1.txt", "2.txt", "3.txt"]
        );
        assert!(reports[0].is_ok());
        assert!(!reports[1].is_ok());
        assert_eq!(reports[1].to_row().error, PageError::MissingTemplate.to_string());
        assert_eq!(reports[2].record().unwrap().plate_number, "34나7890");
    }

    #[test]
    fn test_failed_report_row() {
        let report = PageReport::failed(2, "missing.png", PageError::Read("not found".to_string()));
        let row = report.to_row();

        assert_eq!(row.file_name, "missing.png");
        assert_eq!(row.classification, "");
        assert_eq!(row.error, "failed to read page: not found");
    }

    #[test]
    fn test_compile_record_without_fine_digits() {
        let mut extraction = ExtractionResult::new(Classification::Generic);
        extraction.record(Field::Fine, "판독 불가".to_string());
        extraction.record(Field::Date, "3월 5일".to_string());

        let record = compile_record("x", &extraction, None, &ExtractionConfig::default(), 2025);

        assert_eq!(record.fine, "판독 불가");
        assert_eq!(record.discounted_fine, None);
        assert_eq!(record.date, "2025/03/05");
        assert_eq!(record.due_date, "2025/00/00");
    }
}
