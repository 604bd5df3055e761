//! Fine amounts: numeral scanning, formatting and the early-payment discount.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::patterns::{
    AMOUNT_TOKEN, FINE_ADJUSTMENT_KEYWORDS, FINE_KEYWORD, GROUPED_NUMERAL, PAYMENT_KEYWORDS,
    PLAIN_NUMERAL, REFERENCE_CODE, WON_NUMERAL, collapse_whitespace, contains_any, fold_digits,
};
use super::{Cascade, FieldExtractor};
use crate::models::config::ExtractionConfig;
use crate::ocr::NoticeText;

/// Default currency unit.
pub const WON: &str = "원";

/// An amount reduced to its integer value and display form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedAmount {
    /// Display form, e.g. `50,000원`.
    pub text: String,
    pub value: u64,
}

/// Keep the digits of `raw` and format them as an amount in won.
///
/// `None` when `raw` has no digits or the value does not fit in `u64`.
pub fn normalize_amount(raw: &str) -> Option<NormalizedAmount> {
    normalize_amount_with_unit(raw, WON)
}

pub fn normalize_amount_with_unit(raw: &str, unit: &str) -> Option<NormalizedAmount> {
    let value = parse_digits(raw)?;
    Some(NormalizedAmount {
        text: format_amount(value, unit),
        value,
    })
}

/// Apply `rate` and round down to whole units.
pub fn discounted_amount(amount: &NormalizedAmount, rate: Decimal, unit: &str) -> NormalizedAmount {
    let value = (Decimal::from(amount.value) * rate)
        .floor()
        .to_u64()
        .unwrap_or(0);

    NormalizedAmount {
        text: format_amount(value, unit),
        value,
    }
}

/// Format with `,` thousands separators and a unit suffix.
pub fn format_amount(value: u64, unit: &str) -> String {
    let digits = value.to_string();
    let mut formatted = String::with_capacity(digits.len() + digits.len() / 3 + unit.len());

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            formatted.push(',');
        }
        formatted.push(c);
    }

    formatted.push_str(unit);
    formatted
}

/// Blank out hyphen-joined document numbers such as `2025-063822-00`.
pub fn strip_reference_codes(text: &str) -> String {
    REFERENCE_CODE.replace_all(text, " ").into_owned()
}

/// Numeral tokens in order: comma-grouped numbers (`1,234,567`) or runs of
/// four or more digits, never adjacent to further digits.
pub fn numeral_tokens(text: &str) -> Vec<&str> {
    scan_numerals(text, &[&*GROUPED_NUMERAL, &*PLAIN_NUMERAL])
}

/// First numeral directly followed by `원`.
fn first_won_numeral(text: &str) -> Option<&str> {
    scan_numerals(text, &[&*WON_NUMERAL]).into_iter().next()
}

/// Try the anchored `patterns` at every digit not preceded by a digit and
/// collect capture group 1, resuming after it.
fn scan_numerals<'t>(text: &'t str, patterns: &[&regex::Regex]) -> Vec<&'t str> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let at_run_start = bytes[pos].is_ascii_digit() && (pos == 0 || !bytes[pos - 1].is_ascii_digit());

        if at_run_start {
            let rest = &text[pos..];
            let hit = patterns
                .iter()
                .find_map(|p| p.captures(rest))
                .and_then(|c| c.get(1));

            if let Some(m) = hit {
                tokens.push(m.as_str());
                pos += m.end();
                continue;
            }
        }

        pos += 1;
    }

    tokens
}

fn parse_digits(text: &str) -> Option<u64> {
    let digits: String = fold_digits(text).chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// First `[0-9,]+` token whose value lies within the configured bounds,
/// formatted. Used for fine regions of fixed-layout notices.
pub fn first_plausible_amount(text: &str, config: &ExtractionConfig) -> Option<String> {
    AMOUNT_TOKEN
        .find_iter(text)
        .filter_map(|m| parse_digits(m.as_str()))
        .find(|v| config.is_plausible_fine(*v))
        .map(|v| format_amount(v, &config.currency_unit))
}

/// Post-process OCR text from a fine region.
pub fn normalize_fine_region(raw: &str, config: &ExtractionConfig) -> String {
    let text = collapse_whitespace(raw);
    first_plausible_amount(&text, config).unwrap_or(text)
}

/// Generic-notice fine extractor.
///
/// Candidates outside the configured bounds are discarded, which keeps
/// reduction amounts, phone numbers and document numbers out.
pub struct FineExtractor<'c> {
    config: &'c ExtractionConfig,
}

impl<'c> FineExtractor<'c> {
    pub fn new(config: &'c ExtractionConfig) -> Self {
        Self { config }
    }

    fn plausible(&self, token: &str) -> Option<u64> {
        parse_digits(token).filter(|v| self.config.is_plausible_fine(*v))
    }

    /// Amount in a keyword segment: the first `<numeral>원`, then any numeral.
    fn amount_in_segment(&self, segment: &str) -> Option<u64> {
        let segment = strip_reference_codes(segment);

        if let Some(value) = first_won_numeral(&segment).and_then(|t| self.plausible(t)) {
            return Some(value);
        }

        numeral_tokens(&segment)
            .into_iter()
            .find_map(|t| self.plausible(t))
    }

    /// Text after `keyword` on `line`, joined with the following line.
    fn after_keyword(&self, text: &NoticeText, index: usize, keyword: &str) -> Option<u64> {
        let line = &text.lines[index];
        let start = line.find(keyword)? + keyword.len();
        let segment = NoticeText::join_with_next(&line[start..], text.lines.get(index + 1));
        self.amount_in_segment(&segment)
    }
}

impl FieldExtractor for FineExtractor<'_> {
    fn extract(&self, text: &NoticeText) -> Option<String> {
        let value = Cascade::new("fine")
            .tier("payment_keyword", |t: &NoticeText| {
                PAYMENT_KEYWORDS.iter().find_map(|keyword| {
                    (0..t.lines.len())
                        .filter(|&i| t.lines[i].contains(keyword))
                        .find_map(|i| self.after_keyword(t, i, keyword))
                })
            })
            .tier("fine_keyword", |t: &NoticeText| {
                (0..t.lines.len())
                    .filter(|&i| {
                        let line = &t.lines[i];
                        line.contains(FINE_KEYWORD) && !contains_any(line, FINE_ADJUSTMENT_KEYWORDS)
                    })
                    .find_map(|i| self.after_keyword(t, i, FINE_KEYWORD))
            })
            .tier("won_suffix", |t: &NoticeText| {
                let cleaned = strip_reference_codes(&t.text);
                first_won_numeral(&cleaned).and_then(|tok| self.plausible(tok))
            })
            .tier("any_numeral", |t: &NoticeText| {
                let cleaned = strip_reference_codes(&t.text);
                numeral_tokens(&cleaned)
                    .into_iter()
                    .find_map(|tok| self.plausible(tok))
            })
            .run(text)?;

        debug!("Fine candidate {}", value);
        Some(format_amount(value, &self.config.currency_unit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fine(text: &str) -> Option<String> {
        let config = ExtractionConfig::default();
        FineExtractor::new(&config).extract(&NoticeText::new(text))
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0, WON), "0원");
        assert_eq!(format_amount(999, WON), "999원");
        assert_eq!(format_amount(50_000, WON), "50,000원");
        assert_eq!(format_amount(1_234_567, WON), "1,234,567원");
    }

    #[test]
    fn test_normalize_amount() {
        let amount = normalize_amount("과태료: 50,000 원").unwrap();
        assert_eq!(amount.value, 50_000);
        assert_eq!(amount.text, "50,000원");
        assert_eq!(normalize_amount("없음"), None);
        assert_eq!(normalize_amount("５０,０００원").unwrap().value, 50_000);
    }

    #[test]
    fn test_discount_rounds_down() {
        let rate = Decimal::new(8, 1);
        let amount = normalize_amount("50,000").unwrap();
        assert_eq!(discounted_amount(&amount, rate, WON).text, "40,000원");

        let odd = normalize_amount("33,333").unwrap();
        assert_eq!(discounted_amount(&odd, rate, WON).value, 26_666);
    }

    #[test]
    fn test_numeral_tokens() {
        assert_eq!(numeral_tokens("50,000원 및 12345"), vec!["50,000", "12345"]);
        assert_eq!(numeral_tokens("1,2345"), vec!["2345"]);
        assert_eq!(numeral_tokens("1,234,5678"), vec!["1,234", "5678"]);
        assert_eq!(numeral_tokens("123 45"), Vec::<&str>::new());
    }

    #[test]
    fn test_strip_reference_codes() {
        assert_eq!(strip_reference_codes("번호 2025-063822-00 끝").trim(), "번호   끝");
    }

    #[test]
    fn test_fine_with_reduction_line() {
        assert_eq!(fine("과태료 50,000원 (감경 10,000원)").as_deref(), Some("50,000원"));
    }

    #[test]
    fn test_payment_keyword_wins() {
        let text = "과태료 60,000원\n납부금액\n48,000원";
        assert_eq!(fine(text).as_deref(), Some("48,000원"));
    }

    #[test]
    fn test_reduction_lines_are_skipped() {
        let text = "감경 과태료 20,000원\n과태료: 40,000원";
        assert_eq!(fine(text).as_deref(), Some("40,000원"));
    }

    #[test]
    fn test_reference_codes_are_not_fines() {
        assert_eq!(fine("고지번호 2025-063822-00"), None);
        assert_eq!(fine("고지번호 2025-063822-00\n금액 70000원").as_deref(), Some("70,000원"));
    }

    #[test]
    fn test_out_of_range_values_are_discarded() {
        assert_eq!(fine("과태료 5,000원"), None);
        assert_eq!(fine("과태료 1,000,000원"), None);
        assert_eq!(fine("전화 0212345678"), None);
    }

    #[test]
    fn test_bare_numeral_fallback() {
        assert_eq!(fine("금액\n30000").as_deref(), Some("30,000원"));
    }

    #[test]
    fn test_fine_region_post_processing() {
        let config = ExtractionConfig::default();
        assert_eq!(normalize_fine_region("금 50,000 원", &config), "50,000원");
        assert_eq!(normalize_fine_region(" 판독  불가 ", &config), "판독 불가");
        assert_eq!(normalize_fine_region("5,000원", &config), "5,000원");
    }
}
