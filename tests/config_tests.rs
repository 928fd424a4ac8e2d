//! Tests for the type-safe configuration builder and its environment overlay

use avalon_crawler::config::CrawlConfig;
use avalon_crawler::config::env::{ENV_CATALOG_URL, ENV_CITY_COOLDOWN_MS, ENV_PROXY_FILE};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_builder_requires_output_dir() {
    // Does not compile without an output directory:
    // let config = CrawlConfig::builder().build();

    let temp_dir = TempDir::new().expect("tempdir");
    let config = CrawlConfig::builder()
        .output_dir(temp_dir.path())
        .build()
        .expect("valid config");

    assert_eq!(config.output_dir(), temp_dir.path());
    assert_eq!(config.communities_csv_path(), temp_dir.path().join("communities.csv"));
    assert_eq!(config.apartments_csv_path(), temp_dir.path().join("apartments.csv"));
}

#[test]
fn test_builder_optional_fields_have_defaults() {
    let config = CrawlConfig::builder()
        .output_dir("/tmp/out")
        .build()
        .expect("valid config");

    assert_eq!(config.city_cooldown(), Duration::from_secs(2));
    assert_eq!(config.retry_backoff(), Duration::from_secs(1));
    assert!((config.degraded_threshold() - 0.2).abs() < f64::EPSILON);
    assert_eq!(
        config.embedded_markers(),
        ("Fusion.globalContent=", ";Fusion.globalContentConfig")
    );
    assert!(config.proxy_file().is_none());
}

#[test]
fn test_builder_rejects_invalid_values() {
    assert!(CrawlConfig::builder()
        .output_dir("/tmp/out")
        .max_concurrent_cities(0)
        .build()
        .is_err());
    assert!(CrawlConfig::builder()
        .output_dir("/tmp/out")
        .catalog_url("not a url")
        .build()
        .is_err());
    assert!(CrawlConfig::builder()
        .output_dir("/tmp/out")
        .degraded_threshold(1.5)
        .build()
        .is_err());
}

#[test]
fn test_env_overlay_replaces_builder_values() {
    let env: HashMap<&str, &str> = HashMap::from([
        (ENV_CATALOG_URL, "https://mirror.example.test/apartment-locations"),
        (ENV_CITY_COOLDOWN_MS, "0"),
        (ENV_PROXY_FILE, "/etc/crawler/proxies.txt"),
    ]);

    let config = CrawlConfig::builder()
        .output_dir("/tmp/out")
        .apply_env_from(|key| env.get(key).map(|v| (*v).to_string()))
        .expect("overlay")
        .build()
        .expect("valid config");

    assert_eq!(config.catalog_url(), "https://mirror.example.test/apartment-locations");
    assert!(config.city_cooldown().is_zero());
    assert_eq!(config.proxy_file(), Some(Path::new("/etc/crawler/proxies.txt")));
}

#[test]
fn test_env_overlay_rejects_unparsable_numbers() {
    let result = CrawlConfig::builder()
        .output_dir("/tmp/out")
        .apply_env_from(|key| (key == ENV_CITY_COOLDOWN_MS).then(|| "soon".to_string()));
    assert!(result.is_err());
}

#[test]
fn test_config_serializes_without_chrome_dir() {
    let config = CrawlConfig::builder()
        .output_dir("/tmp/out")
        .chrome_data_dir(Some("/tmp/chrome".into()))
        .build()
        .expect("valid config");

    let json = serde_json::to_value(&config).expect("serialize");
    assert_eq!(json["max_concurrent_cities"], 5);
    assert!(json.get("chrome_data_dir").is_none());
}
