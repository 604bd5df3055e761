//! Vehicle plate normalization and key extraction.

use super::patterns::{
    DIGIT_RUN, PLATE_COMPACT, PLATE_EXCLUDED_KEYWORDS, PLATE_KEYWORDS, PLATE_SPACED,
    collapse_whitespace, contains_any, strip_whitespace,
};
use super::{Cascade, FieldExtractor};
use crate::ocr::NoticeText;

/// Normalize a plate read from a template region.
///
/// Returns the first `12가3456`-style match with inner whitespace removed,
/// or the whitespace-collapsed input when nothing matches.
pub fn normalize_plate(raw: &str) -> String {
    let text = collapse_whitespace(raw);

    [&*PLATE_COMPACT, &*PLATE_SPACED]
        .iter()
        .find_map(|pattern| pattern.captures(&text))
        .map(|c| strip_whitespace(&c[1]))
        .unwrap_or(text)
}

/// Four-digit lookup key: the last four digits of the first run of at
/// least four digits, whitespace ignored.
pub fn plate_key(text: &str) -> Option<String> {
    let compact = strip_whitespace(text);
    DIGIT_RUN
        .find_iter(&compact)
        .map(|m| m.as_str())
        .find(|run| run.len() >= 4)
        .map(|run| run[run.len() - 4..].to_string())
}

/// Matching suffix: the last four digits of the final digit run.
///
/// `None` when there are no digits or the final run is shorter than four.
pub fn plate_suffix(text: &str) -> Option<&str> {
    let run = DIGIT_RUN.find_iter(text).last()?.as_str();
    (run.len() >= 4).then(|| &run[run.len() - 4..])
}

/// Generic-notice plate extractor yielding the four-digit key.
pub struct PlateKeyExtractor;

impl PlateKeyExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PlateKeyExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for PlateKeyExtractor {
    fn extract(&self, text: &NoticeText) -> Option<String> {
        Cascade::new("plate")
            .tier("keyword_lines", |t: &NoticeText| {
                t.lines
                    .iter()
                    .enumerate()
                    .filter(|(_, line)| contains_any(line, PLATE_KEYWORDS))
                    .find_map(|(i, _)| plate_key(&t.with_next_line(i)))
            })
            .tier("non_amount_lines", |t: &NoticeText| {
                t.lines
                    .iter()
                    .filter(|line| !contains_any(line, PLATE_EXCLUDED_KEYWORDS))
                    .find_map(|line| plate_key(line))
            })
            .tier("full_text", |t: &NoticeText| plate_key(&t.text))
            .run(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_normalize_plate() {
        assert_eq!(normalize_plate("12가3456"), "12가3456");
        assert_eq!(normalize_plate(" 차량 123 나 4567 "), "123나4567");
        assert_eq!(normalize_plate("판독  불가"), "판독 불가");
        assert_eq!(normalize_plate(""), "");
    }

    #[test]
    fn test_plate_key() {
        assert_eq!(plate_key("12가 3456").as_deref(), Some("3456"));
        assert_eq!(plate_key("12가34 56").as_deref(), Some("3456"));
        assert_eq!(plate_key("123456").as_deref(), Some("3456"));
        assert_eq!(plate_key("12가345"), None);
    }

    #[test]
    fn test_plate_suffix() {
        assert_eq!(plate_suffix("12가3456"), Some("3456"));
        assert_eq!(plate_suffix("1234 가 56"), None);
        assert_eq!(plate_suffix("가나다"), None);
    }

    #[test]
    fn test_keyword_line_wins() {
        let text = NoticeText::new("고지번호 7788\n차량번호\n12가 3456");
        assert_eq!(PlateKeyExtractor::new().extract(&text).as_deref(), Some("3456"));
    }

    #[test]
    fn test_amount_lines_are_skipped() {
        let text = NoticeText::new("과태료 50000원\n34나 9876");
        assert_eq!(PlateKeyExtractor::new().extract(&text).as_deref(), Some("9876"));
    }

    #[test]
    fn test_full_text_fallback() {
        let text = NoticeText::new("과태료 50000원");
        assert_eq!(PlateKeyExtractor::new().extract(&text).as_deref(), Some("0000"));
        assert_eq!(PlateKeyExtractor::new().extract(&NoticeText::new("")), None);
    }
}
