//! Street address parsing for community cards.
//!
//! Listing pages render addresses as a single line using a bullet delimiter:
//! `1099 Admiral Ct. • San Bruno, CA 94066`. The only rewrite
//! performed is `One` → `1` for the street number.

use log::info;
use serde::{Deserialize, Serialize};

use crate::crawl_engine::{CrawlError, CrawlResult};

/// Delimiter between the street part and the city/state/zip part
pub const ADDRESS_DELIMITER: char = '•';

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Address {
    pub number: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

/// Parse `<number> <street> • <city>, <state> <zip>` into its parts.
///
/// Fails with [`CrawlError::MalformedAddress`] when the delimiter or one of
/// the expected sub-splits is missing, or when any part comes out empty.
pub fn parse_address(raw: &str) -> CrawlResult<Address> {
    let malformed = || CrawlError::MalformedAddress(raw.to_string());

    let raw = raw.trim();
    if raw.is_empty() {
        return Err(malformed());
    }

    let (number_and_street, city_state_zip) =
        raw.split_once(ADDRESS_DELIMITER).ok_or_else(malformed)?;

    let (number, street) = number_and_street
        .trim()
        .split_once(' ')
        .ok_or_else(malformed)?;

    let (city, state_zip) = city_state_zip
        .trim()
        .split_once(',')
        .ok_or_else(malformed)?;

    let (state, zip) = state_zip.trim().split_once(' ').ok_or_else(malformed)?;

    let number = match number.trim() {
        "One" => "1",
        other => other,
    };

    let address = Address {
        number: number.to_string(),
        street: street.trim().to_string(),
        city: city.trim().to_string(),
        state: state.trim().to_string(),
        zip: zip.trim().to_string(),
    };

    if [
        &address.number,
        &address.street,
        &address.city,
        &address.state,
        &address.zip,
    ]
    .iter()
    .any(|part| part.is_empty())
    {
        return Err(malformed());
    }

    Ok(address)
}

/// Parse an optional DOM capture; a missing capture is malformed.
pub fn parse_optional_address(raw: Option<&str>) -> CrawlResult<Address> {
    match raw {
        Some(text) => parse_address(text),
        None => Err(CrawlError::MalformedAddress(String::new())),
    }
}

/// Normalize a phone number to `ddd-ddd-dddd`.
///
/// Only decimal digits are kept; anything other than exactly ten digits
/// yields `None`.
#[must_use]
pub fn format_phone(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();

    if digits.len() != 10 {
        info!("Unexpected phone number: {raw:?}");
        return None;
    }

    Some(format!("{}-{}-{}", &digits[0..3], &digits[3..6], &digits[6..]))
}
