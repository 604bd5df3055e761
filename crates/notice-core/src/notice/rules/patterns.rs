//! Regex patterns and keyword tables for Korean violation notices.
//!
//! Digit classes are spelled `[0-9]` so that parsed values are always ASCII.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    pub static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();

    pub static ref DIGIT_RUN: Regex = Regex::new(r"[0-9]+").unwrap();

    // Plate patterns: 12가3456 / 123가 3456
    pub static ref PLATE_COMPACT: Regex = Regex::new(
        r"([0-9]{2,3}[가-힣][0-9]{4})"
    ).unwrap();

    pub static ref PLATE_SPACED: Regex = Regex::new(
        r"([0-9]{2,3}\s*[가-힣]\s*[0-9]{4})"
    ).unwrap();

    // Date patterns, applied to text reduced by DATE_NOISE
    pub static ref DATE_NOISE: Regex = Regex::new(r"[^0-9./\-년월일]").unwrap();

    pub static ref DATE_YMD: Regex = Regex::new(
        r"([0-9]{2,4})\s*[-./]\s*([0-9]{1,2})\s*[-./]\s*([0-9]{1,2})"
    ).unwrap();

    pub static ref DATE_YEAR_UNIT: Regex = Regex::new(r"([0-9]{2,4})\s*년").unwrap();

    pub static ref DATE_MONTH_UNIT: Regex = Regex::new(r"([0-9]{1,2})\s*월").unwrap();

    pub static ref DATE_DAY_UNIT: Regex = Regex::new(r"([0-9]{1,2})\s*일").unwrap();

    pub static ref DATE_MONTH_DAY: Regex = Regex::new(
        r"(?:^|[^0-9])([0-9]{1,2})\s*[-./]\s*([0-9]{1,2})(?:[^0-9]|$)"
    ).unwrap();

    // Document numbers such as 2025-063822-00
    pub static ref REFERENCE_CODE: Regex = Regex::new(
        r"[0-9]{2,4}\s*-\s*[0-9]{3,6}\s*-\s*[0-9]{1,4}"
    ).unwrap();

    // Numerals, anchored at a position not preceded by a digit
    pub static ref GROUPED_NUMERAL: Regex = Regex::new(
        r"^([0-9]{1,3}(?:,[0-9]{3})+)(?:[^0-9]|$)"
    ).unwrap();

    pub static ref PLAIN_NUMERAL: Regex = Regex::new(r"^([0-9]{4,})(?:[^0-9]|$)").unwrap();

    pub static ref WON_NUMERAL: Regex = Regex::new(
        r"^([0-9]{1,3}(?:,[0-9]{3})+|[0-9]{4,})\s*원"
    ).unwrap();

    pub static ref AMOUNT_TOKEN: Regex = Regex::new(r"[0-9,]+").unwrap();

    pub static ref LEADING_BULLET: Regex = Regex::new(r"^\s*[-•]\s*").unwrap();
}

/// Lines likely to carry the plate number.
pub const PLATE_KEYWORDS: &[&str] = &["차량번호", "차량", "대상"];

/// Lines carrying money rather than the plate.
pub const PLATE_EXCLUDED_KEYWORDS: &[&str] = &["원", "금액", "과태료", "범칙금"];

pub const DATE_KEYWORDS: &[&str] = &["일시", "일자", "위반일", "발생일"];

pub const DUE_DATE_KEYWORDS: &[&str] = &["납부기한", "납기", "기한", "만료일"];

pub const LOCATION_KEYWORDS: &[&str] = &[
    "장소",
    "위치",
    "위반장소",
    "발생장소",
    "지점",
    "cctv",
    "ic",
    "앞",
    "방향",
    "뒤",
    "주변",
    "근처",
    "단지",
    "어린이보호구역",
    "로",
    "길",
    "대로",
    "교차로",
];

/// Amount actually due.
pub const PAYMENT_KEYWORDS: &[&str] = &["납부금액", "납기내금액"];

pub const FINE_KEYWORD: &str = "과태료";

/// Reduction or surcharge lines that mention the fine keyword.
pub const FINE_ADJUSTMENT_KEYWORDS: &[&str] = &["감경", "가산"];

pub const VIOLATION_KEYWORDS: &[&str] = &[
    "주정차",
    "속도",
    "신호",
    "어린이보호",
    "중앙선",
    "끼어들기",
    "횡단보도",
    "안전거리",
    "진로변경",
    "통행금지",
    "일시정지",
];

/// Labels followed by the violation text on the next line.
pub const CONTENT_KEYWORDS: &[&str] = &["내용", "위반", "사유", "항목"];

/// Collapse whitespace runs to a single space and trim.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Remove all whitespace.
pub fn strip_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, "").into_owned()
}

/// Replace full-width digits (`０`-`９`) with their ASCII forms.
pub fn fold_digits(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '０'..='９' => char::from(b'0' + (c as u32 - '０' as u32) as u8),
            _ => c,
        })
        .collect()
}

/// Whether `text` contains any of `keywords`.
pub fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}
