//! Violation location from free-form notice text.

use super::patterns::{LEADING_BULLET, LOCATION_KEYWORDS};
use super::FieldExtractor;
use crate::ocr::NoticeText;

/// Shortest accepted location, in characters, exclusive.
const MIN_LOCATION_CHARS: usize = 3;

/// Finds the first line mentioning a place keyword.
///
/// Keywords are tried in priority order and compared against the lowercased
/// line, so `CCTV` and `IC` match as well.
pub struct LocationExtractor;

impl LocationExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LocationExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for LocationExtractor {
    fn extract(&self, text: &NoticeText) -> Option<String> {
        let lowered: Vec<String> = text.lines.iter().map(|l| l.to_lowercase()).collect();

        LOCATION_KEYWORDS.iter().find_map(|keyword| {
            text.lines
                .iter()
                .zip(&lowered)
                .filter(|(_, lower)| lower.contains(keyword))
                .find_map(|(line, _)| {
                    let cleaned = LEADING_BULLET.replace(line.trim(), "");
                    (cleaned.chars().count() > MIN_LOCATION_CHARS).then(|| cleaned.into_owned())
                })
        })
    }
}
