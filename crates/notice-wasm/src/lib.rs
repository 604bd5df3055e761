//! WASM bindings for traffic-violation notice extraction.
//!
//! Only text operations are exposed: OCR runs outside the module and its text
//! is passed in. Fixed-layout notices need the page image and a template, so
//! they are reported as failed pages here.

use std::sync::Arc;

use serde::Serialize;
use wasm_bindgen::prelude::*;

use notice_core::models::notice::ExtractionResult;
use notice_core::{
    Classification, KeywordExtractor, NoticeConfig, NoticePipeline, NoticeRow, NoticeText,
    NormalizedRecord, PageInput, Roster, RosterEntry, UnavailableProvider,
};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn current_year() -> i32 {
    js_sys::Date::new_0().get_full_year() as i32
}

fn roster_from_js(entries: JsValue) -> Result<Roster, JsValue> {
    let entries: Vec<RosterEntry> = serde_wasm_bindgen::from_value(entries)
        .map_err(|e| JsValue::from_str(&format!("invalid roster: {}", e)))?;
    Ok(Roster::new(entries))
}

/// Classify page text: `"fixed_layout"` or `"generic"`.
#[wasm_bindgen]
pub fn classify(text: &str) -> String {
    notice_core::classify(text).as_str().to_string()
}

/// Keyword extraction over generic notice text.
#[wasm_bindgen]
pub fn extract_generic(text: &str) -> Result<JsValue, JsValue> {
    let config = NoticeConfig::default();
    let result: ExtractionResult = KeywordExtractor::new(&config.extraction)
        .with_current_year(current_year())
        .extract(&NoticeText::new(text));

    to_js(&result)
}

/// Normalize a free-form date to `YYYY/MM/DD`.
#[wasm_bindgen]
pub fn normalize_date(raw: &str) -> String {
    notice_core::normalize_date_with_year(raw, current_year())
}

/// Normalize an amount to `50,000원` form; `undefined` without digits.
#[wasm_bindgen]
pub fn normalize_amount(raw: &str) -> Option<String> {
    notice_core::normalize_amount(raw).map(|a| a.text)
}

/// Match a plate against a roster given as `[{plate_number, name, department}]`.
///
/// Returns the entry with its similarity, or `null`.
#[wasm_bindgen]
pub fn match_plate(raw: &str, roster: JsValue) -> Result<JsValue, JsValue> {
    #[derive(Serialize)]
    struct MatchJs<'r> {
        entry: &'r RosterEntry,
        similarity: f64,
    }

    let roster = roster_from_js(roster)?;
    match notice_core::match_plate(raw, &roster) {
        Some(m) => to_js(&MatchJs {
            entry: m.entry,
            similarity: m.similarity,
        }),
        None => Ok(JsValue::NULL),
    }
}

/// Page result handed back to JavaScript.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PageResultJs {
    file_name: String,
    classification: Option<Classification>,
    record: Option<NormalizedRecord>,
    row: NoticeRow,
    error: Option<String>,
}

/// Stateful extractor for OCR'd page text.
#[wasm_bindgen]
pub struct NoticeExtractor {
    pipeline: NoticePipeline<UnavailableProvider>,
}

#[wasm_bindgen]
impl NoticeExtractor {
    /// Create an extractor; `config` is an optional partial configuration object.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<NoticeExtractor, JsValue> {
        let config: NoticeConfig = if config.is_undefined() || config.is_null() {
            NoticeConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| JsValue::from_str(&format!("invalid config: {}", e)))?
        };

        let pipeline = NoticePipeline::new(Arc::new(UnavailableProvider), &config)
            .with_current_year(current_year());

        Ok(Self { pipeline })
    }

    /// Replace the roster used for plate matching.
    #[wasm_bindgen]
    pub fn set_roster(&mut self, roster: JsValue) -> Result<(), JsValue> {
        let roster = roster_from_js(roster)?;
        self.pipeline = self.pipeline.clone().with_roster(roster);
        Ok(())
    }

    /// Number of roster entries.
    #[wasm_bindgen]
    pub fn roster_size(&self) -> usize {
        self.pipeline.roster().len()
    }

    /// Process one page of OCR text.
    #[wasm_bindgen]
    pub fn process_text(&self, file_name: &str, text: &str) -> Result<JsValue, JsValue> {
        let report = self.pipeline.process_page(0, &PageInput::text(file_name, text));

        to_js(&PageResultJs {
            file_name: report.file_name.clone(),
            classification: report.classification,
            record: report.record().cloned(),
            row: report.to_row(),
            error: report.outcome.as_ref().err().map(|e| e.to_string()),
        })
    }

    /// Process pages given as `[{fileName, text}]`; rows keep input order.
    #[wasm_bindgen]
    pub fn process_texts(&self, pages: js_sys::Array) -> Result<JsValue, JsValue> {
        #[derive(serde::Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct PageJs {
            file_name: String,
            text: String,
        }

        let pages = pages
            .iter()
            .map(|page| {
                let page: PageJs = serde_wasm_bindgen::from_value(page)
                    .map_err(|e| JsValue::from_str(&format!("invalid page: {}", e)))?;
                Ok(PageInput::text(page.file_name, page.text))
            })
            .collect::<Result<Vec<_>, JsValue>>()?;

        let rows: Vec<NoticeRow> = self
            .pipeline
            .process_batch(&pages)
            .iter()
            .map(|report| report.to_row())
            .collect();

        to_js(&rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_classify() {
        assert_eq!(classify("서울 경찰청 고지서"), "fixed_layout");
        assert_eq!(classify("경찰청고지서"), "fixed_layout");
        assert_eq!(classify("과태료 부과 사전통지서"), "generic");
    }

    #[wasm_bindgen_test]
    fn test_normalize_amount() {
        assert_eq!(normalize_amount("50000 원").as_deref(), Some("50,000원"));
        assert_eq!(normalize_amount("없음"), None);
    }

    #[wasm_bindgen_test]
    fn test_normalize_date() {
        assert_eq!(normalize_date("2024.3.5"), "2024/03/05");
    }

    #[wasm_bindgen_test]
    fn test_extractor_roster() {
        let mut extractor = NoticeExtractor::new(JsValue::UNDEFINED).unwrap();
        let roster = vec![RosterEntry::new("12가3456", "김철수", "총무팀")];
        extractor
            .set_roster(serde_wasm_bindgen::to_value(&roster).unwrap())
            .unwrap();

        assert_eq!(extractor.roster_size(), 1);
    }
}
