//! Crawl Engine Module
//!
//! Stage functions (discovery, city, community), the retry executor they run
//! under, the shared run context and the orchestrator that ties them
//! together.

// Sub-modules
pub mod city;
pub mod cleanup;
pub mod community;
pub mod context;
pub mod crawl_types;
pub mod discovery;
pub mod gate;
pub mod orchestrator;
pub mod page_timeout;
pub mod retry;
pub mod run_stats;
pub mod visited;

// Re-export crawl types
pub use crawl_types::{CrawlError, CrawlResult, ErrorKind, Stage, StageOutcome};

// Re-exports for public API
pub use city::{CityOutcome, crawl_city};
pub use cleanup::{CleanupResult, shutdown_browser};
pub use community::crawl_community;
pub use context::CrawlContext;
pub use discovery::{discover_named_city, discover_state_cities};
pub use gate::ConcurrencyGate;
pub use orchestrator::{CrawlScope, Orchestrator, RunReport};
pub use retry::{RetryPolicy, run_stage};
pub use run_stats::{RecordedError, RunStats, StageSnapshot, StatsSnapshot};
pub use visited::VisitedTracker;
