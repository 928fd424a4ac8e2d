//! Flattening of records into table rows, in header order.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::extract::{Community, Unit};
use crate::utils::community_id;

fn opt(value: Option<&String>) -> String {
    value.cloned().unwrap_or_default()
}

/// Row for `communities.csv`, matching `COMMUNITY_CSV_HEADERS`
#[must_use]
pub fn community_row(community: &Community, scraped_at: DateTime<Utc>) -> Vec<String> {
    vec![
        community_id(&community.url),
        community.name.clone(),
        community.url.clone(),
        community.address.number.clone(),
        community.address.street.clone(),
        community.address.city.clone(),
        community.address.state.clone(),
        community.address.zip.clone(),
        opt(community.phone.as_ref()),
        opt(community.office_hours.as_ref()),
        scraped_at.to_rfc3339_opts(SecondsFormat::Secs, true),
    ]
}

/// Row for `apartments.csv`, matching `APARTMENT_CSV_HEADERS`
#[must_use]
pub fn unit_row(unit: &Unit, community_url: &str) -> Vec<String> {
    vec![
        unit.row_key(community_url),
        community_url.to_string(),
        unit.unit_id.clone(),
        opt(unit.bedrooms.as_ref()),
        opt(unit.bathrooms.as_ref()),
        opt(unit.sqft.as_ref()),
        unit.rent.clone(),
        opt(unit.furnished_rent.as_ref()),
        unit.available_date.clone(),
        opt(unit.floor_plan_name.as_ref()),
        opt(unit.specials.as_ref()),
        opt(unit.unit_details.as_ref()),
        opt(unit.image_url.as_ref()),
        opt(unit.image_filename.as_ref()),
        opt(unit.virtual_tour.as_ref()),
        opt(unit.detail_url.as_ref()),
    ]
}
