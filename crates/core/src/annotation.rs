//! Extraction of structured readings from free-text notes.
//!
//! Notes may embed a labeled secondary reading, e.g. `"after lunch,
//! Pressure: 130-140"`. Absence of a match is a normal outcome, never an
//! error.

use std::sync::LazyLock;

use regex::Regex;

static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("digit-run regex is valid"));

/// Extracts a labeled numeric reading from a note.
///
/// Scans the substring after the first occurrence of `label` for digit runs:
/// two or more numbers yield `"A-B"` (only the first two are used), a single
/// number yields `"A"`, and a missing label or no trailing digits yield
/// `None`.
#[must_use]
pub fn extract_labeled_reading(note: &str, label: &str) -> Option<String> {
    let (_, rest) = note.split_once(label)?;
    let mut runs = DIGIT_RUN.find_iter(rest).map(|m| m.as_str());
    match (runs.next(), runs.next()) {
        (Some(a), Some(b)) => Some(format!("{a}-{b}")),
        (Some(a), None) => Some(a.to_owned()),
        (None, _) => None,
    }
}

/// Splits a two-part reading like `"130-140"` into its integer components.
///
/// Returns `None` for single-value readings.
#[must_use]
pub fn split_reading_pair(reading: &str) -> Option<(i64, i64)> {
    let (hi, lo) = reading.split_once('-')?;
    Some((hi.parse().ok()?, lo.parse().ok()?))
}
