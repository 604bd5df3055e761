//! Plate matching against the roster.

use strsim::normalized_levenshtein;
use tracing::debug;

use super::rules::plate_suffix;
use crate::models::roster::{Roster, RosterEntry};

/// A roster entry resolved from an extracted plate.
#[derive(Debug, Clone, PartialEq)]
pub struct PlateMatch<'r> {
    pub entry: &'r RosterEntry,
    /// Normalized edit similarity in `[0, 1]`.
    pub similarity: f64,
}

/// Resolve `raw` to a roster entry.
///
/// Only entries whose plate shares the last four digits of `raw`'s final digit
/// run are candidates; among them the most similar plate wins, the earliest
/// entry on ties.
pub fn match_plate<'r>(raw: &str, roster: &'r Roster) -> Option<PlateMatch<'r>> {
    let suffix = plate_suffix(raw)?;
    let mut best: Option<PlateMatch<'r>> = None;

    for entry in roster
        .entries()
        .iter()
        .filter(|e| plate_suffix(&e.plate_number) == Some(suffix))
    {
        let similarity = normalized_levenshtein(raw, &entry.plate_number);
        if best.as_ref().is_none_or(|b| similarity > b.similarity) {
            best = Some(PlateMatch { entry, similarity });
        }
    }

    match &best {
        Some(m) => debug!(
            "Matched '{}' to {} ({:.2})",
            raw, m.entry.plate_number, m.similarity
        ),
        None => debug!("No roster entry ends in {}", suffix),
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn roster() -> Roster {
        Roster::new(vec![
            RosterEntry::new("12가3456", "김철수", "총무팀"),
            RosterEntry::new("98나3456", "이영희", "영업팀"),
            RosterEntry::new("45다7777", "박민수", "개발팀"),
        ])
    }

    #[test]
    fn test_suffix_gates_candidates() {
        let roster = roster();
        let m = match_plate("98나 3456", &roster).unwrap();
        assert_eq!(m.entry.name, "이영희");

        assert!(match_plate("12가3457", &roster).is_none());
    }

    #[test]
    fn test_key_only_match_takes_first_on_tie() {
        let roster = roster();
        let m = match_plate("3456", &roster).unwrap();
        assert_eq!(m.entry.name, "김철수");
        assert!((m.similarity - 4.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_short_or_missing_digits() {
        let roster = roster();
        assert!(match_plate("", &roster).is_none());
        assert!(match_plate("12가345", &roster).is_none());
        assert!(match_plate("3456", &Roster::default()).is_none());
    }

    #[test]
    fn test_exact_plate_scores_one() {
        let roster = roster();
        let m = match_plate("45다7777", &roster).unwrap();
        assert_eq!(m.similarity, 1.0);
    }
}
