//! Region-based extraction for fixed-layout notices.

use chrono::{Datelike, Local};
use image::DynamicImage;
use tracing::{debug, warn};

use super::rules::patterns::collapse_whitespace;
use super::rules::{normalize_date_with_year, normalize_fine_region, normalize_plate};
use crate::error::OcrError;
use crate::models::config::ExtractionConfig;
use crate::models::notice::{Classification, ExtractionResult, Field};
use crate::ocr::{OcrProvider, crop_region, encode_png};
use crate::template::{Region, Template};

/// Reads each template region through the OCR provider.
///
/// A failing region marks only its own field as failed.
pub struct RegionExtractor<'a, P: OcrProvider + ?Sized> {
    provider: &'a P,
    template: &'a Template,
    config: &'a ExtractionConfig,
    current_year: i32,
}

impl<'a, P: OcrProvider + ?Sized> RegionExtractor<'a, P> {
    pub fn new(provider: &'a P, template: &'a Template, config: &'a ExtractionConfig) -> Self {
        Self {
            provider,
            template,
            config,
            current_year: Local::now().year(),
        }
    }

    pub fn with_current_year(mut self, year: i32) -> Self {
        self.current_year = year;
        self
    }

    /// Extract every field that has a region; others stay absent.
    pub fn extract(&self, image: &DynamicImage) -> ExtractionResult {
        let mut result = ExtractionResult::new(Classification::FixedLayout);

        for (field, region) in self.template.regions() {
            match self.read_region(image, region) {
                Ok(raw) => {
                    debug!("{} region text: {:?}", field, raw);
                    result.record(field, post_process(field, &raw, self.config, self.current_year));
                }
                Err(e) => {
                    warn!("OCR failed for {} region {}: {}", field, region, e);
                    result.fail(field, e.to_string());
                }
            }
        }

        result
    }

    fn read_region(&self, image: &DynamicImage, region: &Region) -> Result<String, OcrError> {
        let crop = crop_region(image, region)?;
        let png = encode_png(&crop)?;
        self.provider.text_detect(&png)
    }
}

/// Canonicalize OCR text read from a field region.
pub fn post_process(field: Field, raw: &str, config: &ExtractionConfig, current_year: i32) -> String {
    let text = collapse_whitespace(raw);
    if text.is_empty() {
        return text;
    }

    match field {
        Field::PlateNumber => normalize_plate(&text),
        Field::Date | Field::DueDate => normalize_date_with_year(&text, current_year),
        Field::Fine => normalize_fine_region(&text, config),
        Field::Location | Field::Description => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::notice::FieldOutcome;
    use image::RgbImage;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    /// Answers region requests in order from a script; `None` fails the call.
    struct ScriptedProvider {
        replies: Mutex<Vec<Option<&'static str>>>,
    }

    impl ScriptedProvider {
        fn new(mut replies: Vec<Option<&'static str>>) -> Self {
            replies.reverse();
            Self {
                replies: Mutex::new(replies),
            }
        }
    }

    impl OcrProvider for ScriptedProvider {
        fn text_detect(&self, _image: &[u8]) -> Result<String, OcrError> {
            match self.replies.lock().unwrap().pop().flatten() {
                Some(text) => Ok(text.to_string()),
                None => Err(OcrError::Provider("quota exceeded".to_string())),
            }
        }
    }

    fn template(fields: &[Field]) -> Template {
        let regions: BTreeMap<Field, Region> = fields
            .iter()
            .enumerate()
            .map(|(i, f)| {
                let y = 20 * i as u32;
                (*f, Region::new(0, y, 50, y + 10).unwrap())
            })
            .collect();
        Template::new("police_notice", (100, 200), regions)
    }

    fn page() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::new(100, 200))
    }

    #[test]
    fn test_post_process() {
        let config = ExtractionConfig::default();
        assert_eq!(post_process(Field::PlateNumber, "12가 3456", &config, 2025), "12가3456");
        assert_eq!(post_process(Field::Date, "2024. 3. 5.", &config, 2025), "2024/03/05");
        assert_eq!(post_process(Field::Fine, "50,000 원", &config, 2025), "50,000원");
        assert_eq!(
            post_process(Field::Location, " 서울  종로구\n세종대로 ", &config, 2025),
            "서울 종로구 세종대로"
        );
        assert_eq!(post_process(Field::DueDate, "  ", &config, 2025), "");
    }

    #[test]
    fn test_field_failure_is_isolated() {
        let provider = ScriptedProvider::new(vec![
            Some("12가 3456"),
            None,
            Some("서울 종로구"),
            Some("50,000원"),
            Some("2024.04.10"),
            Some("신호위반"),
        ]);
        let template = template(&Field::ALL);
        let config = ExtractionConfig::default();

        let result = RegionExtractor::new(&provider, &template, &config)
            .with_current_year(2025)
            .extract(&page());

        assert_eq!(result.value(Field::PlateNumber), Some("12가3456"));
        assert!(matches!(result.outcome(Field::Date), FieldOutcome::Failed(_)));
        assert_eq!(result.value(Field::Location), Some("서울 종로구"));
        assert_eq!(result.value(Field::Fine), Some("50,000원"));
        assert_eq!(result.value(Field::DueDate), Some("2024/04/10"));
        assert_eq!(result.value(Field::Description), Some("신호위반"));
    }

    #[test]
    fn test_fields_without_region_are_absent() {
        let provider = ScriptedProvider::new(vec![Some(""), Some("30,000")]);
        let template = template(&[Field::PlateNumber, Field::Fine]);
        let config = ExtractionConfig::default();

        let result = RegionExtractor::new(&provider, &template, &config).extract(&page());

        assert_eq!(result.outcome(Field::PlateNumber), &FieldOutcome::Empty);
        assert_eq!(result.value(Field::Fine), Some("30,000원"));
        assert_eq!(result.outcome(Field::Date), &FieldOutcome::Absent);
        assert_eq!(result.outcome(Field::Description), &FieldOutcome::Absent);
    }

    #[test]
    fn test_region_outside_image_fails_only_that_field() {
        let mut regions = BTreeMap::new();
        regions.insert(Field::PlateNumber, Region::new(0, 0, 50, 10).unwrap());
        regions.insert(Field::Fine, Region::new(500, 500, 600, 600).unwrap());
        let template = Template::new("police_notice", (100, 200), regions);
        let provider = ScriptedProvider::new(vec![Some("12가3456")]);
        let config = ExtractionConfig::default();

        let result = RegionExtractor::new(&provider, &template, &config).extract(&page());

        assert_eq!(result.value(Field::PlateNumber), Some("12가3456"));
        assert!(matches!(result.outcome(Field::Fine), FieldOutcome::Failed(_)));
    }
}
