//! Violation description from free-form notice text.

use super::patterns::{CONTENT_KEYWORDS, VIOLATION_KEYWORDS};
use super::{Cascade, FieldExtractor};
use crate::ocr::NoticeText;

const MIN_DESCRIPTION_CHARS: usize = 2;

fn accept(line: &str) -> Option<String> {
    let trimmed = line.trim();
    (trimmed.chars().count() > MIN_DESCRIPTION_CHARS).then(|| trimmed.to_string())
}

pub struct DescriptionExtractor;

impl DescriptionExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DescriptionExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for DescriptionExtractor {
    fn extract(&self, text: &NoticeText) -> Option<String> {
        Cascade::new("description")
            // A line naming the violation type.
            .tier("violation_keyword", |t: &NoticeText| {
                VIOLATION_KEYWORDS.iter().find_map(|keyword| {
                    t.lines
                        .iter()
                        .filter(|line| line.contains(keyword))
                        .find_map(|line| accept(line))
                })
            })
            // A label whose value sits on the next line.
            .tier("content_label", |t: &NoticeText| {
                CONTENT_KEYWORDS.iter().find_map(|keyword| {
                    t.lines
                        .windows(2)
                        .filter(|pair| pair[0].contains(keyword))
                        .find_map(|pair| accept(&pair[1]))
                })
            })
            .run(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn description(text: &str) -> Option<String> {
        DescriptionExtractor::new().extract(&NoticeText::new(text))
    }

    #[test]
    fn test_violation_keyword_line() {
        let text = "위반내용\n  주정차 위반(황색실선)  ";
        assert_eq!(description(text).as_deref(), Some("주정차 위반(황색실선)"));
    }

    #[test]
    fn test_keyword_priority() {
        let text = "신호 위반\n속도 위반 20km/h 초과";
        assert_eq!(description(text).as_deref(), Some("속도 위반 20km/h 초과"));
    }

    #[test]
    fn test_content_label_fallback() {
        let text = "위반사항\n갓길 통행";
        assert_eq!(description(text).as_deref(), Some("갓길 통행"));
    }

    #[test]
    fn test_nothing_found() {
        assert_eq!(description("내용\n없음"), None);
        assert_eq!(description(""), None);
    }
}
