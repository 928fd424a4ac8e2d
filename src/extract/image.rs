//! Content-addressed image file names.

use xxhash_rust::xxh3::xxh3_128;

use crate::utils::resolve_url;

/// `<32 hex chars>.jpg`, derived from the absolute image URL
#[must_use]
pub fn image_filename(absolute_url: &str) -> String {
    let digest = xxh3_128(absolute_url.as_bytes());
    format!("{}.jpg", hex::encode(digest.to_be_bytes()))
}

/// Resolve `src` against the community page, then name it.
///
/// Returns `(absolute_url, filename)`, or `None` when `src` cannot be
/// resolved.
#[must_use]
pub fn resolve_image(community_url: &str, src: &str) -> Option<(String, String)> {
    let absolute = resolve_url(community_url, src)?;
    let filename = image_filename(&absolute);
    Some((absolute, filename))
}
