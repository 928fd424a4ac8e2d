//! Records produced by extraction.

use serde::{Deserialize, Serialize};

use crate::address::Address;

/// A city link from the catalog page. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    pub url: String,
    pub name: String,
    /// Inferred from the first path segment of `url`
    pub state: String,
}

/// A community card on a city page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommunityLink {
    /// Canonical URL (identity)
    pub url: String,
    pub name: String,
    pub address_text: Option<String>,
}

/// Header data rendered on a community's own page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommunityProfile {
    pub name: Option<String>,
    pub address_text: Option<String>,
    pub phone: Option<String>,
    pub office_hours: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Community {
    pub name: String,
    pub url: String,
    pub address: Address,
    pub phone: Option<String>,
    pub office_hours: Option<String>,
}

/// What a rendered unit card shows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitSummary {
    pub raw_title: String,
    pub price_text: String,
    pub furnished_price_text: Option<String>,
    pub image_url: Option<String>,
    pub detail_url: Option<String>,
    pub virtual_tour: Option<String>,
}

/// A unit reconciled from its card and its embedded record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Building-qualified id as rendered, e.g. `3-204`
    pub unit_id: String,
    pub bedrooms: Option<String>,
    pub bathrooms: Option<String>,
    pub sqft: Option<String>,
    pub rent: String,
    pub furnished_rent: Option<String>,
    /// `YYYY-MM-DD`
    pub available_date: String,
    pub floor_plan_name: Option<String>,
    /// Newline-joined promotion titles
    pub specials: Option<String>,
    pub unit_details: Option<String>,
    pub image_url: Option<String>,
    pub image_filename: Option<String>,
    pub virtual_tour: Option<String>,
    pub detail_url: Option<String>,
}

impl Unit {
    /// Dedup key of the unit in the apartments table
    #[must_use]
    pub fn row_key(&self, community_url: &str) -> String {
        match &self.detail_url {
            Some(url) => crate::utils::canonicalize_url(url),
            None => format!("{community_url}#{}", self.unit_id),
        }
    }
}

/// One community with its units, as written to the per-community document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityDocument {
    #[serde(flatten)]
    pub community: Community,
    pub units: Vec<Unit>,
    pub scraped_at: chrono::DateTime<chrono::Utc>,
}
