pub mod constants;
pub mod url_utils;

pub use constants::*;
pub use url_utils::{
    canonicalize_url, community_id, is_valid_url, name_key, resolve_url, state_from_city_url, url_slug,
};
