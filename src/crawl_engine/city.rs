//! City stage: discover a city's communities and crawl them in order.

use log::{debug, info};

use super::community::crawl_community;
use super::context::CrawlContext;
use super::crawl_types::{CrawlResult, Stage, StageOutcome};
use super::retry::run_stage;
use crate::browser::Session;
use crate::extract::{City, is_not_found_page, parse_community_cards};
use crate::net::ProxyCredentials;
use crate::utils::COMMUNITY_TOGGLE_SELECTOR;

/// Counts for one finished city
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CityOutcome {
    /// Community cards on the page
    pub discovered: usize,
    /// Communities this city ran (the rest were already visited)
    pub crawled: usize,
    /// Communities that produced a document
    pub completed: usize,
}

/// Crawl one city under the city retry budget.
///
/// Every attempt opens its own session and closes it before returning.
pub async fn crawl_city(ctx: &CrawlContext, city: &City) -> CrawlResult<Option<CityOutcome>> {
    run_stage(
        &ctx.stats,
        Stage::City,
        ctx.discovery_policy(),
        &city.url,
        || city_attempt(ctx, city),
    )
    .await
}

async fn city_attempt(ctx: &CrawlContext, city: &City) -> CrawlResult<StageOutcome<CityOutcome>> {
    let proxy = ctx.proxies.next_proxy();
    let session = ctx
        .engine
        .new_session(proxy.as_ref(), ctx.viewport())
        .await?;

    let result = visit_city(ctx, session.as_ref(), city, proxy.as_ref()).await;
    session.close().await;
    result
}

async fn visit_city(
    ctx: &CrawlContext,
    session: &dyn Session,
    city: &City,
    proxy: Option<&ProxyCredentials>,
) -> CrawlResult<StageOutcome<CityOutcome>> {
    session
        .navigate(&city.url, ctx.config.page_load_timeout())
        .await?;

    let markup = session.content().await?;
    if is_not_found_page(&markup) {
        return Ok(StageOutcome::Skipped(format!("{} is a 404 page", city.url)));
    }

    session.click(COMMUNITY_TOGGLE_SELECTOR).await?;
    let markup = session.content().await?;
    let links = parse_community_cards(&markup, &city.url);
    info!("{} ({}): {} communities", city.name, city.state, links.len());

    let mut outcome = CityOutcome {
        discovered: links.len(),
        ..CityOutcome::default()
    };

    for link in &links {
        if !ctx.visited.mark(&link.url) {
            debug!("Already visited {}", link.url);
            continue;
        }
        outcome.crawled += 1;
        if crawl_community(ctx, session, link, proxy).await?.is_some() {
            outcome.completed += 1;
        }
    }

    Ok(StageOutcome::Done(outcome))
}
