//! Catalog discovery: which cities to crawl.
//!
//! The catalog page is static, so it is fetched over plain HTTP rather than
//! through a browser session.

use log::info;

use super::context::CrawlContext;
use super::crawl_types::{CrawlError, CrawlResult, Stage, StageOutcome};
use super::retry::run_stage;
use crate::extract::{City, parse_catalog};
use crate::utils::name_key;

async fn fetch_catalog(ctx: &CrawlContext) -> CrawlResult<Vec<City>> {
    let url = ctx.config.catalog_url();
    let proxy = ctx.proxies.next_proxy();
    let response = ctx
        .fetcher
        .get(url, ctx.config.fetch_timeout(), proxy.as_ref())
        .await?;

    if !response.is_success() {
        return Err(CrawlError::navigation(format!(
            "catalog {url} returned status {}",
            response.status
        )));
    }

    let cities = parse_catalog(&response.text(), url);
    if cities.is_empty() {
        return Err(CrawlError::navigation(format!("catalog {url} lists no cities")));
    }
    Ok(cities)
}

/// Cities of the given states, or of every state when `states` is `None`.
///
/// State names match case- and separator-insensitively (`new-york`,
/// `New York`). A filter that matches nothing counts as a failed attempt.
pub async fn discover_state_cities(
    ctx: &CrawlContext,
    states: Option<&[String]>,
) -> CrawlResult<Option<Vec<City>>> {
    let wanted: Option<Vec<String>> = states.map(|s| s.iter().map(|n| name_key(n)).collect());
    let label = match states {
        Some(names) => names.join(", "),
        None => "all states".to_string(),
    };

    run_stage(
        &ctx.stats,
        Stage::StateDiscovery,
        ctx.discovery_policy(),
        &label,
        || select_state_cities(ctx, wanted.as_deref(), &label),
    )
    .await
}

async fn select_state_cities(
    ctx: &CrawlContext,
    wanted: Option<&[String]>,
    label: &str,
) -> CrawlResult<StageOutcome<Vec<City>>> {
    let cities = fetch_catalog(ctx).await?;
    let selected: Vec<City> = match wanted {
        None => cities,
        Some(keys) => cities
            .into_iter()
            .filter(|c| keys.contains(&name_key(&c.state)))
            .collect(),
    };

    if selected.is_empty() {
        return Err(CrawlError::navigation(format!("no cities found for {label}")));
    }
    info!("Discovered {} cities for {label}", selected.len());
    Ok(StageOutcome::Done(selected))
}

/// The catalog city whose name matches `name`, ignoring case
pub async fn discover_named_city(ctx: &CrawlContext, name: &str) -> CrawlResult<Option<City>> {
    run_stage(
        &ctx.stats,
        Stage::CityDiscovery,
        ctx.discovery_policy(),
        name,
        || find_city(ctx, name),
    )
    .await
}

async fn find_city(ctx: &CrawlContext, name: &str) -> CrawlResult<StageOutcome<City>> {
    let wanted = name.trim().to_lowercase();
    let city = fetch_catalog(ctx)
        .await?
        .into_iter()
        .find(|c| c.name.trim().to_lowercase() == wanted)
        .ok_or_else(|| CrawlError::navigation(format!("city {name:?} not in catalog")))?;
    info!("Resolved city {name:?} to {}", city.url);
    Ok(StageOutcome::Done(city))
}
