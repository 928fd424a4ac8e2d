//! Available-date normalization.

use chrono::NaiveDate;

const ACCEPTED_FORMATS: [&str; 2] = ["%m/%d/%Y", "%Y-%m-%d"];

/// Normalize a move-in date to `YYYY-MM-DD`.
///
/// The time component (anything after the first space or a `T`) is dropped,
/// then `m/d/yyyy` and ISO forms are accepted. Returns `None` for
/// anything else.
#[must_use]
pub fn normalize_available_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let date_part = raw.split_whitespace().next()?;
    let date_part = date_part.split('T').next().unwrap_or(date_part);

    ACCEPTED_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
        .map(|date| date.format("%Y-%m-%d").to_string())
}
