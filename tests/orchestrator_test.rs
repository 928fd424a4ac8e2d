//! End-to-end runs of the orchestrator against an in-memory site

use async_trait::async_trait;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use avalon_crawler::crawl_engine::{CrawlScope, ErrorKind, Orchestrator, Stage};
use avalon_crawler::notify::Notifier;

mod common;
use common::*;

#[derive(Default)]
struct RecordingNotifier {
    subjects: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    fn subjects(&self) -> Vec<String> {
        self.subjects.lock().expect("subjects").clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, subject: &str, _body: &str) {
        self.subjects.lock().expect("subjects").push(subject.to_string());
    }
}

fn data_rows(path: &std::path::Path) -> usize {
    std::fs::read_to_string(path)
        .map(|text| text.lines().count().saturating_sub(1))
        .unwrap_or(0)
}

const COMMUNITY_PATH: &str = "/california/san-bruno-apartments/avalon-a";

fn two_cities_sharing_a_community() -> (Arc<FakeSite>, Arc<FakeFetcher>) {
    let site = FakeSite::default()
        .with_page(
            &url("/california/san-bruno-apartments"),
            city_markup(&[(
                "/california/san-bruno-apartments/avalon-a/",
                "Avalon A",
                "1099 Admiral Ct. • San Bruno, CA 94066",
            )]),
        )
        .with_page(
            &url("/california/millbrae-apartments"),
            city_markup(&[(
                "/california/san-bruno-apartments/avalon-a?utm_source=nearby",
                "Avalon A",
                "1099 Admiral Ct. • San Bruno, CA 94066",
            )]),
        )
        .with_page(&url(COMMUNITY_PATH), community_markup(COMMUNITY_PATH, "Avalon A"));

    let fetcher = FakeFetcher::default()
        .with_body(
            CATALOG_URL,
            catalog_markup(&[
                ("/california/san-bruno-apartments/", "San Bruno"),
                ("/california/millbrae-apartments/", "Millbrae"),
                ("/texas/austin-apartments/", "Austin"),
            ]),
        )
        .with_body(&url("/images/204.jpg"), b"jpeg".to_vec());

    (Arc::new(site), Arc::new(fetcher))
}

#[tokio::test]
async fn community_shared_by_two_cities_is_scraped_once() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (site, fetcher) = two_cities_sharing_a_community();
    let engine = Arc::new(FakeEngine::new(Arc::clone(&site)));
    let ctx = test_context(dir.path(), Arc::clone(&engine), fetcher);
    let notifier = Arc::new(RecordingNotifier::default());

    let report = Orchestrator::new(ctx.clone(), notifier.clone())
        .run(CrawlScope::State("California".into()))
        .await;

    assert!(report.completed());
    assert_eq!(report.stats.stage(Stage::StateDiscovery).total_calls, 1);
    assert_eq!(report.stats.stage(Stage::City).total_calls, 2);
    assert_eq!(report.stats.stage(Stage::City).failed_calls, 0);
    assert_eq!(report.stats.stage(Stage::Community).total_calls, 1);
    assert_eq!(site.navigations_to(&url(COMMUNITY_PATH)), 1);
    assert_eq!(site.navigations_to(&url("/texas/austin-apartments")), 0);

    // Every opened session was closed
    assert_eq!(
        engine.opened.load(Ordering::SeqCst),
        engine.closed.load(Ordering::SeqCst)
    );

    assert_eq!(data_rows(&ctx.config.communities_csv_path()), 1);
    // Unit 9-999 has no embedded record and is skipped
    assert_eq!(data_rows(&ctx.config.apartments_csv_path()), 1);
    let apartments = std::fs::read_to_string(ctx.config.apartments_csv_path()).expect("read");
    assert!(apartments.contains("3-204"));
    assert!(apartments.contains("2024-05-03"));
    assert!(!apartments.contains("9-999"));

    let document = ctx
        .config
        .community_docs_dir()
        .join("california_san-bruno-apartments_avalon-a.json");
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(document).expect("document")).expect("json");
    assert_eq!(json.as_array().map(Vec::len), Some(1));
    assert_eq!(json[0]["units"][0]["unit_id"], "3-204");
    assert_eq!(json[0]["phone"], "650-555-0100");

    assert!(ctx.config.images_dir().read_dir().expect("images").next().is_some());

    // The skipped card is reported but does not degrade the run
    let extraction = report.stats.stage(Stage::Extraction);
    assert_eq!((extraction.total_calls, extraction.failed_calls), (3, 1));
    assert_eq!(report.stats.error_count(ErrorKind::UnitNotReconciled), 1);
    assert!(!report.degraded);
    let subjects = notifier.subjects();
    assert!(!subjects.iter().any(|s| s.starts_with("Crawler error")));
    assert!(subjects.iter().any(|s| s.starts_with("Crawler finished")));
}

#[tokio::test]
async fn second_run_adds_no_duplicate_rows() {
    let dir = tempfile::tempdir().expect("tempdir");

    for _ in 0..2 {
        let (site, fetcher) = two_cities_sharing_a_community();
        let engine = Arc::new(FakeEngine::new(site));
        let ctx = test_context(dir.path(), engine, fetcher);
        let report = Orchestrator::new(ctx, Arc::new(RecordingNotifier::default()))
            .run(CrawlScope::WholeSite)
            .await;
        assert!(report.completed());
    }

    let config = test_config(dir.path());
    assert_eq!(data_rows(&config.communities_csv_path()), 1);
    assert_eq!(data_rows(&config.apartments_csv_path()), 1);
}

#[tokio::test]
async fn not_found_city_is_skipped_without_retry() {
    let dir = tempfile::tempdir().expect("tempdir");
    let city_path = "/nevada/ghost-town-apartments";
    let site = Arc::new(FakeSite::default().with_page(&url(city_path), not_found_markup()));
    let fetcher = Arc::new(
        FakeFetcher::default().with_body(CATALOG_URL, catalog_markup(&[(city_path, "Ghost Town")])),
    );
    let engine = Arc::new(FakeEngine::new(Arc::clone(&site)));
    let ctx = test_context(dir.path(), engine, fetcher);

    let report = Orchestrator::new(ctx, Arc::new(RecordingNotifier::default()))
        .run(CrawlScope::NamedCity("ghost town".into()))
        .await;

    assert!(report.completed());
    assert_eq!(report.stats.stage(Stage::CityDiscovery).total_calls, 1);
    assert_eq!(report.stats.stage(Stage::City).total_calls, 1);
    assert_eq!(report.stats.stage(Stage::City).failed_calls, 0);
    assert_eq!(site.navigations_to(&url(city_path)), 1);
    assert!(!report.degraded);
}

#[tokio::test]
async fn unreachable_city_is_retried_then_counted() {
    let dir = tempfile::tempdir().expect("tempdir");
    let city_path = "/oregon/portland-apartments";
    let site = Arc::new(FakeSite::default());
    let fetcher = Arc::new(
        FakeFetcher::default().with_body(CATALOG_URL, catalog_markup(&[(city_path, "Portland")])),
    );
    let engine = Arc::new(FakeEngine::new(Arc::clone(&site)));
    let ctx = test_context(dir.path(), Arc::clone(&engine), fetcher);
    let attempts = usize::from(ctx.config.discovery_attempts());

    let report = Orchestrator::new(ctx, Arc::new(RecordingNotifier::default()))
        .run(CrawlScope::State("oregon".into()))
        .await;

    assert!(report.completed());
    assert_eq!(site.navigations_to(&url(city_path)), attempts);
    assert_eq!(report.stats.stage(Stage::City).total_calls, 1);
    assert_eq!(report.stats.stage(Stage::City).failed_calls, 1);
    assert_eq!(engine.opened.load(Ordering::SeqCst), attempts);
    assert!(report.degraded);
}

#[tokio::test]
async fn unknown_city_counts_a_discovery_failure() {
    let dir = tempfile::tempdir().expect("tempdir");
    let fetcher = Arc::new(FakeFetcher::default().with_body(
        CATALOG_URL,
        catalog_markup(&[("/oregon/portland-apartments", "Portland")]),
    ));
    let engine = Arc::new(FakeEngine::new(Arc::new(FakeSite::default())));
    let ctx = test_context(dir.path(), engine, Arc::clone(&fetcher));

    let report = Orchestrator::new(ctx, Arc::new(RecordingNotifier::default()))
        .run(CrawlScope::NamedCity("Atlantis".into()))
        .await;

    assert!(report.completed());
    assert_eq!(report.stats.stage(Stage::CityDiscovery).failed_calls, 1);
    assert_eq!(report.stats.stage(Stage::City).total_calls, 0);
    assert_eq!(fetcher.requests.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn community_list_dedups_canonical_urls() {
    let dir = tempfile::tempdir().expect("tempdir");
    let site = Arc::new(
        FakeSite::default().with_page(&url(COMMUNITY_PATH), community_markup(COMMUNITY_PATH, "Avalon A")),
    );
    let engine = Arc::new(FakeEngine::new(Arc::clone(&site)));
    let ctx = test_context(dir.path(), Arc::clone(&engine), Arc::new(FakeFetcher::default()));

    let report = Orchestrator::new(ctx, Arc::new(RecordingNotifier::default()))
        .run(CrawlScope::CommunityList(vec![
            url(COMMUNITY_PATH),
            format!("{}/#units", url(COMMUNITY_PATH)),
        ]))
        .await;

    assert!(report.completed());
    assert_eq!(report.communities_visited, 1);
    assert_eq!(report.stats.stage(Stage::Community).total_calls, 1);
    assert_eq!(report.stats.stage(Stage::Community).failed_calls, 0);
    assert_eq!(engine.opened.load(Ordering::SeqCst), 1);
}

/// City page path and its single community page path
fn city_with_one_community(city: &str, community: &str) -> (String, String) {
    (
        format!("/oregon/{city}-apartments"),
        format!("/oregon/{city}-apartments/{community}"),
    )
}

#[tokio::test]
async fn open_sessions_never_exceed_city_limit() {
    let dir = tempfile::tempdir().expect("tempdir");
    let paths: Vec<String> = (0..6)
        .map(|i| format!("/california/city-{i}-apartments"))
        .collect();
    let site = paths
        .iter()
        .fold(FakeSite::default(), |site, path| site.with_page(&url(path), city_markup(&[])))
        .with_latency(Duration::from_millis(20));
    let catalog: Vec<(&str, &str)> = paths.iter().map(|p| (p.as_str(), "City")).collect();
    let fetcher = Arc::new(FakeFetcher::default().with_body(CATALOG_URL, catalog_markup(&catalog)));
    let engine = Arc::new(FakeEngine::new(Arc::new(site)));
    let ctx = test_context(dir.path(), Arc::clone(&engine), fetcher);
    let limit = ctx.config.max_concurrent_cities();

    let report = Orchestrator::new(ctx, Arc::new(RecordingNotifier::default()))
        .run(CrawlScope::State("California".into()))
        .await;

    assert!(report.completed());
    assert_eq!(report.stats.stage(Stage::City).total_calls, 6);
    assert_eq!(report.stats.stage(Stage::City).failed_calls, 0);
    assert_eq!(engine.peak_sessions.load(Ordering::SeqCst), limit);
    assert_eq!(engine.opened.load(Ordering::SeqCst), 6);
    assert_eq!(engine.closed.load(Ordering::SeqCst), 6);
}

#[tokio::test]
async fn unreachable_city_leaves_siblings_running() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (salem, salem_community) = city_with_one_community("salem", "avalon-salem");
    let (eugene, eugene_community) = city_with_one_community("eugene", "avalon-eugene");
    let portland = "/oregon/portland-apartments";

    let site = Arc::new(
        FakeSite::default()
            .with_page(
                &url(&salem),
                city_markup(&[(salem_community.as_str(), "Avalon Salem", "1 Court St • Salem, OR 97301")]),
            )
            .with_page(
                &url(&eugene),
                city_markup(&[(eugene_community.as_str(), "Avalon Eugene", "2 Oak St • Eugene, OR 97401")]),
            )
            .with_page(&url(&salem_community), community_markup(&salem_community, "Avalon Salem"))
            .with_page(&url(&eugene_community), community_markup(&eugene_community, "Avalon Eugene"))
            .with_latency(Duration::from_millis(5)),
    );
    let fetcher = Arc::new(FakeFetcher::default().with_body(
        CATALOG_URL,
        catalog_markup(&[
            (portland, "Portland"),
            (salem.as_str(), "Salem"),
            (eugene.as_str(), "Eugene"),
        ]),
    ));
    let engine = Arc::new(FakeEngine::new(Arc::clone(&site)));
    let ctx = test_context(dir.path(), engine, fetcher);
    let attempts = usize::from(ctx.config.discovery_attempts());

    let report = Orchestrator::new(ctx.clone(), Arc::new(RecordingNotifier::default()))
        .run(CrawlScope::State("Oregon".into()))
        .await;

    assert!(report.completed());
    assert_eq!(site.navigations_to(&url(portland)), attempts);
    assert_eq!(report.stats.stage(Stage::City).total_calls, 3);
    assert_eq!(report.stats.stage(Stage::City).failed_calls, 1);
    assert_eq!(report.stats.stage(Stage::Community).total_calls, 2);
    assert_eq!(report.stats.stage(Stage::Community).failed_calls, 0);
    assert_eq!(site.navigations_to(&url(&salem_community)), 1);
    assert_eq!(site.navigations_to(&url(&eugene_community)), 1);
    assert_eq!(data_rows(&ctx.config.communities_csv_path()), 2);
    assert!(report.degraded);
}

#[tokio::test]
async fn communities_of_a_city_run_in_discovery_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let city = "/california/san-bruno-apartments";
    let communities = [
        format!("{city}/avalon-c"),
        format!("{city}/avalon-a"),
        format!("{city}/avalon-b"),
    ];
    let cards: Vec<(&str, &str, &str)> = communities
        .iter()
        .map(|path| (path.as_str(), "Avalon", "1099 Admiral Ct. • San Bruno, CA 94066"))
        .collect();

    let site = communities
        .iter()
        .fold(
            FakeSite::default().with_page(&url(city), city_markup(&cards)),
            |site, path| site.with_page(&url(path), community_markup(path, "Avalon")),
        )
        .with_latency(Duration::from_millis(5));
    let site = Arc::new(site);
    let fetcher = Arc::new(
        FakeFetcher::default().with_body(CATALOG_URL, catalog_markup(&[(city, "San Bruno")])),
    );
    let engine = Arc::new(FakeEngine::new(Arc::clone(&site)));
    let ctx = test_context(dir.path(), Arc::clone(&engine), fetcher);

    let report = Orchestrator::new(ctx, Arc::new(RecordingNotifier::default()))
        .run(CrawlScope::NamedCity("San Bruno".into()))
        .await;

    assert!(report.completed());
    let expected: Vec<String> = std::iter::once(url(city))
        .chain(communities.iter().map(|path| url(path)))
        .collect();
    assert_eq!(site.navigations(), expected);
    assert_eq!(site.peak_in_flight.load(Ordering::SeqCst), 1);
    assert_eq!(engine.opened.load(Ordering::SeqCst), 1);
    assert_eq!(report.stats.stage(Stage::Community).total_calls, 3);
}

#[tokio::test]
async fn panicked_city_is_counted_and_siblings_finish() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (salem, salem_community) = city_with_one_community("salem", "avalon-salem");
    let crashing = "/oregon/bend-apartments";

    let site = Arc::new(
        FakeSite::default()
            .with_panic(&url(crashing))
            .with_page(
                &url(&salem),
                city_markup(&[(salem_community.as_str(), "Avalon Salem", "1 Court St • Salem, OR 97301")]),
            )
            .with_page(&url(&salem_community), community_markup(&salem_community, "Avalon Salem")),
    );
    let fetcher = Arc::new(FakeFetcher::default().with_body(
        CATALOG_URL,
        catalog_markup(&[(crashing, "Bend"), (salem.as_str(), "Salem")]),
    ));
    let engine = Arc::new(FakeEngine::new(Arc::clone(&site)));
    let ctx = test_context(dir.path(), engine, fetcher);

    let report = Orchestrator::new(ctx.clone(), Arc::new(RecordingNotifier::default()))
        .run(CrawlScope::State("Oregon".into()))
        .await;

    assert!(report.completed());
    assert_eq!(report.stats.stage(Stage::City).total_calls, 2);
    assert_eq!(report.stats.stage(Stage::City).failed_calls, 1);
    assert_eq!(report.stats.error_count(ErrorKind::TaskPanicked), 1);
    assert_eq!(data_rows(&ctx.config.communities_csv_path()), 1);
}
