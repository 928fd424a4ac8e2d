//! Extraction: page markup and embedded data in, reconciled records out.

pub mod cards;
pub mod dates;
pub mod embedded;
pub mod image;
pub mod matcher;
pub mod schema;

pub use cards::{
    is_not_found_page, parse_catalog, parse_community_cards, parse_community_profile,
    parse_unit_cards,
};
pub use dates::normalize_available_date;
pub use embedded::EmbeddedData;
pub use image::{image_filename, resolve_image};
pub use matcher::{derive_unit_id, match_key, normalize_price, reconcile_unit};
pub use schema::{
    City, Community, CommunityDocument, CommunityLink, CommunityProfile, Unit, UnitSummary,
};
