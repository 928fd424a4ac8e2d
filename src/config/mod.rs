//! Configuration module for crawl runs
//!
//! This module provides the `CrawlConfig` struct, its type-safe builder and
//! an environment overlay, with validation and sensible defaults.

// Sub-modules
pub mod builder;
pub mod env;
pub mod getters;
pub mod methods;
pub mod types;

// Re-exports for public API
pub use builder::{CrawlConfigBuilder, WithOutputDir};
pub use types::CrawlConfig;
