//! Community stage: one community page, its units and their persistence.

use chrono::Utc;
use log::{debug, info, warn};

use super::context::CrawlContext;
use super::crawl_types::{CrawlResult, Stage, StageOutcome};
use super::retry::run_stage;
use crate::address::{format_phone, parse_optional_address};
use crate::browser::Session;
use crate::extract::{
    Community, CommunityDocument, CommunityLink, EmbeddedData, Unit, is_not_found_page,
    parse_community_profile, parse_unit_cards, reconcile_unit,
};
use crate::net::ProxyCredentials;
use crate::utils::APARTMENT_TOGGLE_SELECTOR;

/// Crawl one community on an already open session.
///
/// Returns the number of reconciled units, `None` when the community was
/// skipped or exhausted its attempts.
pub async fn crawl_community(
    ctx: &CrawlContext,
    session: &dyn Session,
    link: &CommunityLink,
    proxy: Option<&ProxyCredentials>,
) -> CrawlResult<Option<usize>> {
    run_stage(
        &ctx.stats,
        Stage::Community,
        ctx.community_policy(),
        &link.url,
        || scrape_community(ctx, session, link, proxy),
    )
    .await
}

async fn scrape_community(
    ctx: &CrawlContext,
    session: &dyn Session,
    link: &CommunityLink,
    proxy: Option<&ProxyCredentials>,
) -> CrawlResult<StageOutcome<usize>> {
    let url = link.url.as_str();
    session
        .navigate(url, ctx.config.page_load_timeout())
        .await?;

    if let Err(e) = session.click(APARTMENT_TOGGLE_SELECTOR).await {
        debug!("No apartment toggle on {url}: {e}");
    }

    let markup = session.content().await?;
    if is_not_found_page(&markup) {
        return Ok(StageOutcome::Skipped(format!("{url} is a 404 page")));
    }

    let profile = parse_community_profile(&markup);
    let address_text = link
        .address_text
        .as_deref()
        .or(profile.address_text.as_deref());
    let address = match parse_optional_address(address_text) {
        Ok(address) => {
            ctx.stats.record_extraction_ok();
            address
        }
        Err(e) => {
            ctx.stats.record_extraction_failure(&e);
            return Ok(StageOutcome::Skipped(format!("{url}: {e}")));
        }
    };

    let community = Community {
        name: profile
            .name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| link.name.clone()),
        url: url.to_string(),
        address,
        phone: profile.phone.as_deref().and_then(format_phone),
        office_hours: profile.office_hours,
    };

    let (start, end) = ctx.config.embedded_markers();
    let data = EmbeddedData::from_markup(&markup, url, start, end)?;
    let units = reconcile_units(ctx, &markup, &data, url);

    for unit in &units {
        ctx.sink
            .save_unit_image(ctx.fetcher.as_ref(), unit, ctx.config.fetch_timeout(), proxy)
            .await;
    }

    let unit_count = units.len();
    let document = CommunityDocument {
        community,
        units,
        scraped_at: Utc::now(),
    };
    let path = ctx.sink.save_document(document.clone()).await?;

    ctx.sink
        .record_community(&document.community, document.scraped_at)
        .await?;
    ctx.sink.record_units(url, &document.units).await?;

    info!(
        "Community {} done: {unit_count} units, document {}",
        document.community.name,
        path.display()
    );
    Ok(StageOutcome::Done(unit_count))
}

/// Reconcile every rendered card, skipping (and counting) the ones that fail
fn reconcile_units(ctx: &CrawlContext, markup: &str, data: &EmbeddedData, url: &str) -> Vec<Unit> {
    let summaries = parse_unit_cards(markup, url);
    debug!("{url}: {} unit cards", summaries.len());

    summaries
        .iter()
        .filter_map(|summary| match reconcile_unit(summary, data, url) {
            Ok(unit) => {
                ctx.stats.record_extraction_ok();
                Some(unit)
            }
            Err(e) => {
                warn!("{url}: {e}");
                ctx.stats.record_extraction_failure(&e);
                None
            }
        })
        .collect()
}
