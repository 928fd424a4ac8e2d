//! Document queries over rendered page markup.
//!
//! Every function here takes a markup snapshot captured from a session and
//! returns plain records. Nothing in this module talks to the browser.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;

use super::schema::{City, CommunityLink, CommunityProfile, UnitSummary};
use crate::utils::constants::{
    CATALOG_CITY_LINK_SELECTOR, COMMUNITY_CARD_ADDRESS_SELECTOR, COMMUNITY_CARD_LINK_SELECTOR,
    COMMUNITY_CARD_SELECTOR, NOT_FOUND_HEADING_SELECTOR, NOT_FOUND_HEADING_TEXT,
    PROFILE_ADDRESS_SELECTOR, PROFILE_NAME_SELECTOR, PROFILE_OFFICE_HOURS_SELECTOR,
    PROFILE_PHONE_SELECTOR, UNIT_CARD_SELECTOR, UNIT_FURNISHED_PRICE_SELECTOR,
    UNIT_IMAGE_SELECTOR, UNIT_LINK_SELECTOR, UNIT_PRICE_SELECTOR, UNIT_TITLE_SELECTOR,
    UNIT_VIRTUAL_TOUR_SELECTOR,
};
use crate::utils::{canonicalize_url, resolve_url, state_from_city_url};

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("BUG: hardcoded whitespace regex is invalid"));

fn selector(css: &'static str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("BUG: hardcoded CSS selector {css:?} is invalid: {e}"))
}

static CATALOG_CITY_LINK: LazyLock<Selector> = LazyLock::new(|| selector(CATALOG_CITY_LINK_SELECTOR));
static COMMUNITY_CARD: LazyLock<Selector> = LazyLock::new(|| selector(COMMUNITY_CARD_SELECTOR));
static COMMUNITY_CARD_LINK: LazyLock<Selector> =
    LazyLock::new(|| selector(COMMUNITY_CARD_LINK_SELECTOR));
static COMMUNITY_CARD_ADDRESS: LazyLock<Selector> =
    LazyLock::new(|| selector(COMMUNITY_CARD_ADDRESS_SELECTOR));
static NOT_FOUND_HEADING: LazyLock<Selector> =
    LazyLock::new(|| selector(NOT_FOUND_HEADING_SELECTOR));
static UNIT_CARD: LazyLock<Selector> = LazyLock::new(|| selector(UNIT_CARD_SELECTOR));
static UNIT_TITLE: LazyLock<Selector> = LazyLock::new(|| selector(UNIT_TITLE_SELECTOR));
static UNIT_PRICE: LazyLock<Selector> = LazyLock::new(|| selector(UNIT_PRICE_SELECTOR));
static UNIT_FURNISHED_PRICE: LazyLock<Selector> =
    LazyLock::new(|| selector(UNIT_FURNISHED_PRICE_SELECTOR));
static UNIT_IMAGE: LazyLock<Selector> = LazyLock::new(|| selector(UNIT_IMAGE_SELECTOR));
static UNIT_LINK: LazyLock<Selector> = LazyLock::new(|| selector(UNIT_LINK_SELECTOR));
static UNIT_VIRTUAL_TOUR: LazyLock<Selector> =
    LazyLock::new(|| selector(UNIT_VIRTUAL_TOUR_SELECTOR));
static PROFILE_NAME: LazyLock<Selector> = LazyLock::new(|| selector(PROFILE_NAME_SELECTOR));
static PROFILE_ADDRESS: LazyLock<Selector> = LazyLock::new(|| selector(PROFILE_ADDRESS_SELECTOR));
static PROFILE_PHONE: LazyLock<Selector> = LazyLock::new(|| selector(PROFILE_PHONE_SELECTOR));
static PROFILE_OFFICE_HOURS: LazyLock<Selector> =
    LazyLock::new(|| selector(PROFILE_OFFICE_HOURS_SELECTOR));

/// Element text on one line with whitespace runs collapsed
fn inline_text(element: ElementRef<'_>) -> Option<String> {
    let joined = element.text().collect::<Vec<_>>().join(" ");
    let text = WHITESPACE_RUN.replace_all(joined.trim(), " ").into_owned();
    (!text.is_empty()).then_some(text)
}

/// Element text keeping one line per non-empty text node
fn line_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn first_text(scope: ElementRef<'_>, sel: &Selector) -> Option<String> {
    scope.select(sel).find_map(inline_text)
}

fn first_attr(scope: ElementRef<'_>, sel: &Selector, attrs: &[&str]) -> Option<String> {
    scope.select(sel).find_map(|el| {
        attrs
            .iter()
            .find_map(|a| el.value().attr(a))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from)
    })
}

/// City links on the catalog page, in page order, without duplicates.
///
/// Links whose URL has no state segment are dropped.
#[must_use]
pub fn parse_catalog(markup: &str, catalog_url: &str) -> Vec<City> {
    let document = Html::parse_document(markup);
    let mut seen = HashSet::new();

    document
        .select(&CATALOG_CITY_LINK)
        .filter_map(|link| {
            let name = inline_text(link)?;
            let href = link
                .value()
                .attr("href")?
                .trim_matches(|c| matches!(c, '/' | '#' | '?' | ' '));
            let href = if href.starts_with("www.") || href.contains("://") {
                href.to_string()
            } else {
                format!("/{href}")
            };
            let url = canonicalize_url(&resolve_url(catalog_url, &href)?);
            let state = state_from_city_url(&url)?;
            seen.insert(url.clone()).then_some(City { url, name, state })
        })
        .collect()
}

/// Whether the page is the site's not-found page
#[must_use]
pub fn is_not_found_page(markup: &str) -> bool {
    let document = Html::parse_document(markup);
    document
        .select(&NOT_FOUND_HEADING)
        .filter_map(inline_text)
        .any(|text| text == NOT_FOUND_HEADING_TEXT)
}

/// Community cards on a city page, in discovery order.
///
/// URLs are canonical; a card repeated on the page is returned once.
#[must_use]
pub fn parse_community_cards(markup: &str, city_url: &str) -> Vec<CommunityLink> {
    let document = Html::parse_document(markup);
    let mut seen = HashSet::new();

    document
        .select(&COMMUNITY_CARD)
        .filter_map(|card| {
            let link = card.select(&COMMUNITY_CARD_LINK).next()?;
            let href = link.value().attr("href")?;
            let url = canonicalize_url(&resolve_url(city_url, href)?);
            let name = inline_text(link).unwrap_or_default();
            let address_text = first_text(card, &COMMUNITY_CARD_ADDRESS);
            seen.insert(url.clone()).then_some(CommunityLink {
                url,
                name,
                address_text,
            })
        })
        .collect()
}

/// Unit cards belonging to `community_url`.
///
/// Cards linking to another community (nearby listings) are excluded; cards
/// without any link are kept.
#[must_use]
pub fn parse_unit_cards(markup: &str, community_url: &str) -> Vec<UnitSummary> {
    let document = Html::parse_document(markup);
    let community = canonicalize_url(community_url);

    document
        .select(&UNIT_CARD)
        .filter_map(|card| {
            let virtual_tour = first_attr(card, &UNIT_VIRTUAL_TOUR, &["href"]);
            let detail_url = card
                .select(&UNIT_LINK)
                .filter(|a| !a.value().classes().any(|c| c == "virtual-tour"))
                .find_map(|a| a.value().attr("href"))
                .and_then(|href| resolve_url(&community, href));

            if let Some(url) = &detail_url
                && !belongs_to(url, &community)
            {
                return None;
            }

            let raw_title = card
                .select(&UNIT_TITLE)
                .next()
                .map_or_else(|| line_text(card), line_text);
            let price_text = first_text(card, &UNIT_PRICE).unwrap_or_default();

            Some(UnitSummary {
                raw_title,
                price_text,
                furnished_price_text: first_text(card, &UNIT_FURNISHED_PRICE),
                image_url: first_attr(card, &UNIT_IMAGE, &["src", "data-src"]),
                detail_url,
                virtual_tour,
            })
        })
        .collect()
}

fn belongs_to(url: &str, community: &str) -> bool {
    url.strip_prefix(community)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(['/', '#', '?']))
}

/// Header block of a community page
#[must_use]
pub fn parse_community_profile(markup: &str) -> CommunityProfile {
    let document = Html::parse_document(markup);
    let root = document.root_element();

    let phone = root
        .select(&PROFILE_PHONE)
        .find_map(|a| a.value().attr("href"))
        .and_then(|href| href.strip_prefix("tel:"))
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from);

    CommunityProfile {
        name: first_text(root, &PROFILE_NAME),
        address_text: first_text(root, &PROFILE_ADDRESS),
        phone,
        office_hours: root
            .select(&PROFILE_OFFICE_HOURS)
            .next()
            .map(line_text)
            .filter(|t| !t.is_empty()),
    }
}
