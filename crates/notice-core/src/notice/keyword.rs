//! Keyword-cascade extraction for generic notices.

use chrono::{Datelike, Local};

use super::rules::patterns::{DATE_KEYWORDS, DUE_DATE_KEYWORDS};
use super::rules::{
    DateExtractor, DescriptionExtractor, FieldExtractor, FineExtractor, LocationExtractor,
    PlateKeyExtractor,
};
use crate::models::config::ExtractionConfig;
use crate::models::notice::{Classification, ExtractionResult, Field};
use crate::ocr::NoticeText;

/// Runs one extractor per field over the page text. Never fails; a field
/// nothing was found for is recorded as empty.
pub struct KeywordExtractor<'a> {
    config: &'a ExtractionConfig,
    current_year: i32,
}

impl<'a> KeywordExtractor<'a> {
    pub fn new(config: &'a ExtractionConfig) -> Self {
        Self {
            config,
            current_year: Local::now().year(),
        }
    }

    pub fn with_current_year(mut self, year: i32) -> Self {
        self.current_year = year;
        self
    }

    pub fn extract(&self, text: &NoticeText) -> ExtractionResult {
        let extractors: [(Field, Box<dyn FieldExtractor + '_>); 6] = [
            (Field::PlateNumber, Box::new(PlateKeyExtractor::new())),
            (Field::Date, Box::new(DateExtractor::new(DATE_KEYWORDS, self.current_year))),
            (Field::Location, Box::new(LocationExtractor::new())),
            (Field::Fine, Box::new(FineExtractor::new(self.config))),
            (Field::DueDate, Box::new(DateExtractor::new(DUE_DATE_KEYWORDS, self.current_year))),
            (Field::Description, Box::new(DescriptionExtractor::new())),
        ];

        let mut result = ExtractionResult::new(Classification::Generic);
        for (field, extractor) in extractors {
            result.record(field, extractor.extract(text).unwrap_or_default());
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::notice::FieldOutcome;
    use pretty_assertions::assert_eq;

    const NOTICE: &str = "과태료 부과 사전통지서
고지번호 2025-063822-00
차량번호 12가 3456
위반일시 2024.03.05 14:20
위반장소 서울 종로구 세종대로 앞
위반내용 주정차 위반
과태료 50,000원 (감경 10,000원)
납부기한 2024.04.10";

    #[test]
    fn test_generic_notice() {
        let config = ExtractionConfig::default();
        let result = KeywordExtractor::new(&config)
            .with_current_year(2025)
            .extract(&NoticeText::new(NOTICE));

        assert_eq!(result.classification, Classification::Generic);
        assert_eq!(result.value(Field::PlateNumber), Some("3456"));
        assert_eq!(result.value(Field::Date), Some("2024/03/05"));
        assert_eq!(result.value(Field::Location), Some("위반장소 서울 종로구 세종대로 앞"));
        assert_eq!(result.value(Field::Fine), Some("50,000원"));
        assert_eq!(result.value(Field::DueDate), Some("2024/04/10"));
        assert_eq!(result.value(Field::Description), Some("위반내용 주정차 위반"));
    }

    #[test]
    fn test_empty_text() {
        let config = ExtractionConfig::default();
        let result = KeywordExtractor::new(&config)
            .with_current_year(2025)
            .extract(&NoticeText::new(""));

        assert_eq!(result.outcome(Field::PlateNumber), &FieldOutcome::Empty);
        assert_eq!(result.value(Field::Date), Some("2025/00/00"));
        assert_eq!(result.outcome(Field::Fine), &FieldOutcome::Empty);
    }
}
