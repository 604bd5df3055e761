//! Rule-based field extractors and normalizers for violation notices.

pub mod amounts;
pub mod dates;
pub mod description;
pub mod location;
pub mod patterns;
pub mod plates;

pub use amounts::{
    FineExtractor, NormalizedAmount, WON, discounted_amount, first_plausible_amount,
    format_amount, normalize_amount, normalize_amount_with_unit, normalize_fine_region,
    numeral_tokens, strip_reference_codes,
};
pub use dates::{DateExtractor, DateParts, normalize_date, normalize_date_with_year, parse_date_parts};
pub use description::DescriptionExtractor;
pub use location::LocationExtractor;
pub use plates::{PlateKeyExtractor, normalize_plate, plate_key, plate_suffix};

use tracing::debug;

use crate::ocr::NoticeText;

/// Trait for keyword-based field extractors.
pub trait FieldExtractor {
    /// Extract the field from page text; `None` when every tier misses.
    fn extract(&self, text: &NoticeText) -> Option<String>;
}

type Tier<'a, I, T> = Box<dyn Fn(&I) -> Option<T> + 'a>;

/// Ordered list of named tiers; the first tier yielding `Some` wins.
pub struct Cascade<'a, I: ?Sized, T> {
    name: &'static str,
    tiers: Vec<(&'static str, Tier<'a, I, T>)>,
}

impl<'a, I: ?Sized, T> Cascade<'a, I, T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            tiers: Vec::new(),
        }
    }

    pub fn tier(mut self, name: &'static str, rule: impl Fn(&I) -> Option<T> + 'a) -> Self {
        self.tiers.push((name, Box::new(rule)));
        self
    }

    pub fn run(&self, input: &I) -> Option<T> {
        self.tiers.iter().find_map(|(tier, rule)| {
            let value = rule(input)?;
            debug!("{}: matched tier '{}'", self.name, tier);
            Some(value)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cascade_short_circuits() {
        let cascade = Cascade::new("test")
            .tier("never", |_: &str| None)
            .tier("length", |s: &str| Some(s.len()))
            .tier("unreachable", |_: &str| -> Option<usize> { panic!("ran past first hit") });

        assert_eq!(cascade.run("abc"), Some(3));
    }

    #[test]
    fn test_empty_cascade() {
        let cascade: Cascade<'_, str, u32> = Cascade::new("empty");
        assert_eq!(cascade.run("x"), None);
    }
}
