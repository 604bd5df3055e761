//! Date normalization to `YYYY/MM/DD`.
//!
//! Notices print dates in many shapes (`2024.3.5`, `24-3-5`, `20240305`,
//! `2024년 3월 5일`, `03-05`, ...). Every shape is reduced to year, month and
//! day strings and rendered uniformly; unknown segments become `00` and a
//! missing year falls back to the current one.

use chrono::{Datelike, Local};

use super::patterns::{
    DATE_DAY_UNIT, DATE_MONTH_DAY, DATE_MONTH_UNIT, DATE_NOISE, DATE_YEAR_UNIT, DATE_YMD,
    DIGIT_RUN, WHITESPACE, fold_digits,
};
use super::{Cascade, FieldExtractor};
use crate::ocr::NoticeText;

/// Date segments as found in the text, before range checks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateParts {
    pub year: Option<String>,
    pub month: Option<String>,
    pub day: Option<String>,
}

impl DateParts {
    fn ymd(year: impl Into<String>, month: &str, day: &str) -> Self {
        Self {
            year: Some(year.into()),
            month: Some(month.to_string()),
            day: Some(day.to_string()),
        }
    }

    fn month_day(month: &str, day: &str) -> Self {
        Self {
            year: None,
            month: Some(month.to_string()),
            day: Some(day.to_string()),
        }
    }

    /// Render as `YYYY/MM/DD`.
    pub fn render(&self, current_year: i32) -> String {
        let year = match self.year.as_deref() {
            None => Some(i64::from(current_year)),
            Some(y) if y.len() == 2 => format!("20{}", y).parse().ok(),
            Some(y) => y.parse().ok(),
        };

        let Some(year) = year else {
            return format!("{:04}/00/00", current_year);
        };

        format!(
            "{:04}/{}/{}",
            year,
            segment(self.month.as_deref(), 12),
            segment(self.day.as_deref(), 31)
        )
    }
}

fn segment(value: Option<&str>, max: u32) -> String {
    match value.and_then(|v| v.parse::<u32>().ok()) {
        Some(v) if (1..=max).contains(&v) => format!("{:02}", v),
        _ => "00".to_string(),
    }
}

/// Normalize a free-form date using the current local year as default.
pub fn normalize_date(raw: &str) -> String {
    normalize_date_with_year(raw, Local::now().year())
}

/// Normalize a free-form date; `current_year` fills a missing year.
pub fn normalize_date_with_year(raw: &str, current_year: i32) -> String {
    parse_date_parts(raw).render(current_year)
}

/// Split a free-form date into its segments.
pub fn parse_date_parts(raw: &str) -> DateParts {
    let folded = fold_digits(raw);
    let cleaned = DATE_NOISE.replace_all(&folded, " ");
    let cleaned = WHITESPACE.replace_all(&cleaned, " ");
    let cleaned = cleaned.trim();

    if cleaned.is_empty() {
        return DateParts::default();
    }

    Cascade::new("date")
        .tier("compact_yyyymmdd", |s: &str| {
            exact_digit_run(s, 8).map(|r| DateParts::ymd(&r[..4], &r[4..6], &r[6..]))
        })
        .tier("compact_yymmdd", |s: &str| {
            exact_digit_run(s, 6).map(|r| DateParts::ymd(format!("20{}", &r[..2]), &r[2..4], &r[4..]))
        })
        .tier("separated_ymd", |s: &str| {
            DATE_YMD
                .captures(s)
                .map(|c| DateParts::ymd(&c[1], &c[2], &c[3]))
        })
        .tier("unit_markers", unit_markers)
        .tier("month_day", |s: &str| {
            DATE_MONTH_DAY
                .captures(s)
                .map(|c| DateParts::month_day(&c[1], &c[2]))
        })
        .tier("digit_runs", digit_runs)
        .run(cleaned)
        .unwrap_or_default()
}

/// First digit run of exactly `len` digits.
fn exact_digit_run(text: &str, len: usize) -> Option<&str> {
    DIGIT_RUN
        .find_iter(text)
        .map(|m| m.as_str())
        .find(|run| run.len() == len)
}

/// `2024년 3월 5일`, any marker optional.
fn unit_markers(text: &str) -> Option<DateParts> {
    let year = DATE_YEAR_UNIT.captures(text).map(|c| c[1].to_string());
    let month = DATE_MONTH_UNIT.captures(text).map(|c| c[1].to_string());
    let day = DATE_DAY_UNIT.captures(text).map(|c| c[1].to_string());

    if year.is_none() && month.is_none() && day.is_none() {
        return None;
    }

    Some(DateParts { year, month, day })
}

/// Last resort: guess from the shape of bare digit runs.
fn digit_runs(text: &str) -> Option<DateParts> {
    let runs: Vec<&str> = DIGIT_RUN.find_iter(text).map(|m| m.as_str()).collect();

    let parts = match runs.as_slice() {
        [] => return None,
        [single] => match single.len() {
            4 => DateParts::month_day(&single[..2], &single[2..]),
            3 => DateParts::month_day(&single[..1], &single[1..]),
            _ => DateParts {
                month: Some(single.to_string()),
                ..DateParts::default()
            },
        },
        [a, b, ..] => match (a.len(), b.len()) {
            (4, 3 | 4) => {
                let (month, day) = split_month_day(b);
                DateParts::ymd(*a, month, day)
            }
            (4, n) if n <= 2 => DateParts {
                year: Some(a.to_string()),
                month: Some(b.to_string()),
                day: None,
            },
            (n, 3 | 4) if n <= 2 => {
                let (month, day) = split_month_day(b);
                DateParts::month_day(month, day)
            }
            (n, m) if n <= 2 && m <= 2 => DateParts::month_day(a, b),
            _ => DateParts::default(),
        },
    };

    Some(parts)
}

/// `305` → (`3`, `05`), `1205` → (`12`, `05`).
fn split_month_day(run: &str) -> (&str, &str) {
    if run.len() == 3 {
        (&run[..1], &run[1..])
    } else {
        (&run[..2], &run[2..])
    }
}

/// Keyword-anchored date extractor.
///
/// Keywords are tried in priority order; the first line containing one is
/// normalized together with the following line. Without any keyword the whole
/// text is normalized, so the result is never empty.
pub struct DateExtractor {
    keywords: &'static [&'static str],
    current_year: i32,
}

impl DateExtractor {
    pub fn new(keywords: &'static [&'static str], current_year: i32) -> Self {
        Self {
            keywords,
            current_year,
        }
    }
}

impl FieldExtractor for DateExtractor {
    fn extract(&self, text: &NoticeText) -> Option<String> {
        let segment = self
            .keywords
            .iter()
            .find_map(|keyword| {
                text.lines
                    .iter()
                    .position(|line| line.contains(keyword))
                    .map(|i| text.with_next_line(i))
            })
            .unwrap_or_else(|| text.text.clone());

        Some(normalize_date_with_year(&segment, self.current_year))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notice::rules::patterns::{DATE_KEYWORDS, DUE_DATE_KEYWORDS};
    use pretty_assertions::assert_eq;

    const YEAR: i32 = 2025;

    fn norm(raw: &str) -> String {
        normalize_date_with_year(raw, YEAR)
    }

    #[test]
    fn test_common_shapes() {
        assert_eq!(norm("2024.3.5"), "2024/03/05");
        assert_eq!(norm("24-3-5"), "2024/03/05");
        assert_eq!(norm("20240305"), "2024/03/05");
        assert_eq!(norm("240305"), "2024/03/05");
        assert_eq!(norm("2024/12/31"), "2024/12/31");
    }

    #[test]
    fn test_missing_year_uses_current() {
        assert_eq!(norm("03-05"), "2025/03/05");
        assert_eq!(norm("3.5"), "2025/03/05");
    }

    #[test]
    fn test_unit_markers() {
        assert_eq!(norm("2024년 3월 5일"), "2024/03/05");
        assert_eq!(norm("3월 5일"), "2025/03/05");
        assert_eq!(norm("2024년 3월"), "2024/03/00");
    }

    #[test]
    fn test_empty_and_garbage() {
        assert_eq!(norm(""), "2025/00/00");
        assert_eq!(norm("   "), "2025/00/00");
        assert_eq!(norm("해당 없음"), "2025/00/00");
    }

    #[test]
    fn test_out_of_range_segments() {
        assert_eq!(norm("2024.13.5"), "2024/00/05");
        assert_eq!(norm("2024.3.32"), "2024/03/00");
        assert_eq!(norm("2024.0.0"), "2024/00/00");
    }

    #[test]
    fn test_full_width_digits() {
        assert_eq!(norm("２０２４．３．５"), "2024/03/00");
        assert_eq!(norm("２０２４.３.５"), "2024/03/05");
    }

    #[test]
    fn test_surrounding_text_is_ignored() {
        assert_eq!(norm("위반일시: 2024.03.05 14:20"), "2024/03/05");
        assert_eq!(norm("납부기한 2024-04-10 까지"), "2024/04/10");
    }

    #[test]
    fn test_digit_run_heuristics() {
        assert_eq!(norm("2024 0305"), "2024/03/05");
        assert_eq!(norm("2024 305"), "2024/03/05");
        assert_eq!(norm("2024 3"), "2024/03/00");
        assert_eq!(norm("3 5"), "2025/03/05");
        assert_eq!(norm("1 305"), "2025/03/05");
        assert_eq!(norm("0305"), "2025/03/05");
        assert_eq!(norm("305"), "2025/03/05");
        assert_eq!(norm("7"), "2025/07/00");
        assert_eq!(norm("99999"), "2025/00/00");
    }

    #[test]
    fn test_eight_digit_run_only_when_exact() {
        assert_eq!(norm("123456789"), "2025/00/00");
    }

    #[test]
    fn test_date_extractor_keyword_priority() {
        let text = NoticeText::new("고지서\n납부기한 2024.04.10\n위반일시\n2024.03.05 14:20");

        let date = DateExtractor::new(DATE_KEYWORDS, YEAR).extract(&text);
        assert_eq!(date.as_deref(), Some("2024/03/05"));

        let due = DateExtractor::new(DUE_DATE_KEYWORDS, YEAR).extract(&text);
        assert_eq!(due.as_deref(), Some("2024/04/10"));
    }

    #[test]
    fn test_date_extractor_without_keyword_uses_full_text() {
        let text = NoticeText::new("고지서\n2024.03.05");
        let date = DateExtractor::new(DATE_KEYWORDS, YEAR).extract(&text);
        assert_eq!(date.as_deref(), Some("2024/03/05"));

        let empty = DateExtractor::new(DATE_KEYWORDS, YEAR).extract(&NoticeText::new(""));
        assert_eq!(empty.as_deref(), Some("2025/00/00"));
    }
}
