//! URL manipulation utilities.
//!
//! This module provides the canonicalization that defines a community's
//! identity, relative URL resolution, and the state inference used for
//! cities.

use url::Url;

/// Canonical form of a community URL: no fragment, no query, no trailing slash.
///
/// Unparsable input falls back to string trimming with the same rules so the
/// result is still usable as a dedup key.
#[must_use]
pub fn canonicalize_url(raw: &str) -> String {
    let trimmed = raw.trim();

    match Url::parse(trimmed) {
        Ok(mut url) => {
            url.set_fragment(None);
            url.set_query(None);
            url.as_str().trim_end_matches('/').to_string()
        }
        Err(_) => {
            let without_fragment = trimmed.split('#').next().unwrap_or_default();
            let without_query = without_fragment.split('?').next().unwrap_or_default();
            without_query.trim_end_matches('/').to_string()
        }
    }
}

/// Resolve `href` against `base`, returning `None` if neither parses.
#[must_use]
pub fn resolve_url(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    if let Ok(absolute) = Url::parse(href) {
        return Some(absolute.to_string());
    }

    // Protocol-less host links such as `www.example.com/x`
    if href.starts_with("www.") {
        return Url::parse(&format!("https://{href}")).ok().map(String::from);
    }

    Url::parse(base)
        .and_then(|base| base.join(href))
        .ok()
        .map(String::from)
}

/// Infer the state of a city from the first path segment of its URL.
///
/// `https://host/new-jersey/jersey-city-apartments` → `New Jersey`
#[must_use]
pub fn state_from_city_url(city_url: &str) -> Option<String> {
    let url = Url::parse(city_url).ok()?;
    let segment = url.path_segments()?.find(|s| !s.is_empty())?;

    let state = segment
        .split('-')
        .filter(|word| !word.is_empty())
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ");

    (!state.is_empty()).then_some(state)
}

/// Case- and separator-insensitive key for comparing state or city names
#[must_use]
pub fn name_key(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Last non-empty path segment, used to name per-community documents
#[must_use]
pub fn url_slug(url: &str) -> String {
    let canonical = canonicalize_url(url);
    let slug = Url::parse(&canonical)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut segments| segments.rfind(|s| !s.is_empty()).map(String::from))
                .or_else(|| u.host_str().map(String::from))
        })
        .unwrap_or(canonical);

    sanitize_filename::sanitize(slug)
}

/// Identifier of a community: its canonical path segments joined with `_`.
///
/// `https://host/california/san-bruno-apartments/avalon-a` →
/// `california_san-bruno-apartments_avalon-a`, so communities sharing a slug
/// in different cities stay distinct.
#[must_use]
pub fn community_id(url: &str) -> String {
    let canonical = canonicalize_url(url);
    let id = Url::parse(&canonical)
        .ok()
        .and_then(|u| {
            let segments: Vec<&str> = u.path_segments()?.filter(|s| !s.is_empty()).collect();
            (!segments.is_empty()).then(|| segments.join("_"))
        })
        .unwrap_or_else(|| url_slug(&canonical));

    sanitize_filename::sanitize(id)
}

/// Check if a URL is an absolute http(s) URL
#[must_use]
pub fn is_valid_url(url: &str) -> bool {
    if url.is_empty() {
        return false;
    }

    match Url::parse(url) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
