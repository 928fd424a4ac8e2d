//! Reconciliation of rendered unit cards with embedded unit records.
//!
//! The card supplies the identity, prices and links; the embedded record
//! supplies layout, availability and promotions. A card whose record cannot
//! be found (or lacks an availability date) is not emitted.

use serde_json::Value;

use super::dates::normalize_available_date;
use super::embedded::EmbeddedData;
use super::image::resolve_image;
use super::schema::{Unit, UnitSummary};
use crate::crawl_engine::{CrawlError, CrawlResult};
use crate::utils::resolve_url;

const UNIT_NAME_FIELDS: [&str; 2] = ["name", "unitName"];
const BEDROOM_FIELDS: [&str; 3] = ["bedroomNumber", "bedrooms", "beds"];
const BATHROOM_FIELDS: [&str; 3] = ["bathroomNumber", "bathrooms", "baths"];
const SQFT_FIELDS: [&str; 3] = ["squareFeet", "sqft", "area"];

/// Availability fields for units not designated as furnished, by priority
const UNFURNISHED_DATE_FIELDS: [&str; 3] = [
    "availableDateUnfurnished",
    "availableDate",
    "furnishedAvailableDate",
];
const FURNISHED_DATE_FIELD: &str = "availableDateFurnished";
const DESIGNATED_FURNISHED: &str = "Designated";

/// Unit id as rendered: first title line, without the `Apt.` prefix
#[must_use]
pub fn derive_unit_id(raw_title: &str) -> Option<String> {
    let first_line = raw_title.lines().map(str::trim).find(|l| !l.is_empty())?;
    let id = first_line
        .strip_prefix("Apt.")
        .unwrap_or(first_line)
        .trim();
    (!id.is_empty()).then(|| id.to_string())
}

/// Key used against the embedded records: the building prefix is dropped.
///
/// `3-204` → `204`; `204` → `204`.
#[must_use]
pub fn match_key(unit_id: &str) -> &str {
    unit_id
        .split_once('-')
        .map_or(unit_id, |(_, rest)| rest)
}

/// Keep digits and the decimal point: `$3,120/mo` → `3120`
#[must_use]
pub fn normalize_price(text: &str) -> Option<String> {
    let price: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let price = price.trim_matches('.').to_string();
    (!price.is_empty()).then_some(price)
}

/// JSON scalar as text; `null`, missing and structured values are `None`
#[must_use]
pub fn value_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn first_text(record: &Value, fields: &[&str]) -> Option<String> {
    fields.iter().find_map(|f| value_text(record.get(*f)))
}

/// First embedded record whose name equals `key`
#[must_use]
pub fn find_unit_record<'a>(units: &'a [Value], key: &str) -> Option<&'a Value> {
    units.iter().find(|record| {
        UNIT_NAME_FIELDS
            .iter()
            .any(|f| value_text(record.get(*f)).as_deref() == Some(key))
    })
}

/// Pick the availability field for the record's furnish status
fn select_available_date(record: &Value) -> Option<String> {
    let furnish_status = value_text(record.get("furnishStatus"));
    if furnish_status.as_deref() == Some(DESIGNATED_FURNISHED) {
        return value_text(record.get(FURNISHED_DATE_FIELD));
    }
    first_text(record, &UNFURNISHED_DATE_FIELDS)
}

/// Newline-joined titles of the promotions referenced by `record`
fn resolve_specials(record: &Value, promotions: &[Value]) -> Option<String> {
    let references = record.get("promotions").and_then(Value::as_array)?;

    let titles: Vec<String> = references
        .iter()
        .filter_map(|reference| match reference {
            Value::Object(_) => value_text(reference.get("promotionId")),
            other => value_text(Some(other)),
        })
        .filter_map(|id| {
            promotions
                .iter()
                .find(|p| value_text(p.get("promotionId")).as_deref() == Some(id.as_str()))
                .and_then(|p| first_text(p, &["promotionTitle", "title"]))
        })
        .collect();

    (!titles.is_empty()).then(|| titles.join("\n"))
}

fn resolve_unit_details(record: &Value, furnished_price_text: Option<&str>) -> Option<String> {
    let finish_package = record
        .get("finishPackage")
        .and_then(|fp| first_text(fp, &["description", "name"]));
    let furnished_note = furnished_price_text
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| format!("Furnished: {p}"));

    let parts: Vec<String> = finish_package.into_iter().chain(furnished_note).collect();
    (!parts.is_empty()).then(|| parts.join("\n"))
}

fn floor_plan_name(record: &Value) -> Option<String> {
    record
        .get("floorPlan")
        .and_then(|fp| value_text(fp.get("name")))
        .or_else(|| value_text(record.get("floorPlanName")))
}

/// Build one [`Unit`] from a rendered card and the community's embedded data.
///
/// Fails with [`CrawlError::UnitNotReconciled`] when the title yields no id,
/// the price has no digits, no embedded record matches, or the matched
/// record has none of the availability fields.
pub fn reconcile_unit(
    summary: &UnitSummary,
    data: &EmbeddedData,
    community_url: &str,
) -> CrawlResult<Unit> {
    let not_reconciled = |unit_id: &str, reason: &str| CrawlError::UnitNotReconciled {
        unit_id: unit_id.to_string(),
        reason: reason.to_string(),
    };

    let unit_id = derive_unit_id(&summary.raw_title)
        .ok_or_else(|| not_reconciled(&summary.raw_title, "title has no unit id"))?;

    let key = match_key(&unit_id);
    let record = find_unit_record(&data.units, key)
        .ok_or_else(|| not_reconciled(&unit_id, &format!("no embedded record named {key:?}")))?;

    let raw_date = select_available_date(record)
        .ok_or_else(|| not_reconciled(&unit_id, "no availability date field present"))?;
    let available_date = normalize_available_date(&raw_date)
        .ok_or_else(|| not_reconciled(&unit_id, &format!("unrecognized date {raw_date:?}")))?;

    let rent = normalize_price(&summary.price_text)
        .ok_or_else(|| not_reconciled(&unit_id, "price has no digits"))?;

    let (image_url, image_filename) = summary
        .image_url
        .as_deref()
        .and_then(|src| resolve_image(community_url, src))
        .map_or((None, None), |(url, name)| (Some(url), Some(name)));

    Ok(Unit {
        bedrooms: first_text(record, &BEDROOM_FIELDS),
        bathrooms: first_text(record, &BATHROOM_FIELDS),
        sqft: first_text(record, &SQFT_FIELDS),
        rent,
        furnished_rent: summary
            .furnished_price_text
            .as_deref()
            .and_then(normalize_price),
        available_date,
        floor_plan_name: floor_plan_name(record),
        specials: resolve_specials(record, &data.promotions),
        unit_details: resolve_unit_details(record, summary.furnished_price_text.as_deref()),
        image_url,
        image_filename,
        virtual_tour: summary
            .virtual_tour
            .as_deref()
            .and_then(|href| resolve_url(community_url, href)),
        detail_url: summary
            .detail_url
            .as_deref()
            .and_then(|href| resolve_url(community_url, href)),
        unit_id,
    })
}
