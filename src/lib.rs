pub mod address;
pub mod browser;
pub mod browser_setup;
pub mod config;
pub mod content_saver;
pub mod crawl_engine;
pub mod extract;
pub mod input;
pub mod logging;
pub mod net;
pub mod notify;
pub mod utils;

pub use address::{Address, format_phone, parse_address};
pub use browser::{BrowsingEngine, ChromiumEngine, Session, Viewport};
pub use browser_setup::{download_managed_browser, find_browser_executable, launch_browser};
pub use config::CrawlConfig;
pub use content_saver::{PersistenceSink, TabularStore};
pub use crawl_engine::{
    CrawlContext, CrawlError, CrawlResult, CrawlScope, Orchestrator, RunReport, RunStats,
};
pub use extract::schema::*;
pub use input::read_identifier_list;
pub use net::{FileProxySupplier, HttpFetch, NoProxy, ProxySupplier, ReqwestFetcher};
pub use notify::{LogNotifier, NoopNotifier, Notifier};
