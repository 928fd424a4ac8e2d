//! Command-line entry point: pick a scope, crawl it, report.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

use avalon_crawler::crawl_engine::{CleanupResult, shutdown_browser};
use avalon_crawler::{
    ChromiumEngine, CrawlConfig, CrawlContext, CrawlScope, FileProxySupplier, LogNotifier,
    NoProxy, Notifier, Orchestrator, PersistenceSink, ProxySupplier, ReqwestFetcher, RunReport,
    launch_browser, logging, read_identifier_list,
};

#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    #[command(flatten)]
    mode: Mode,

    /// Directory receiving the CSV tables, documents and images
    #[arg(short, long, env = "CRAWLER_OUTPUT_DIR", default_value = "output")]
    output_dir: PathBuf,

    /// Cities crawled at the same time
    #[arg(long, env = "CRAWLER_MAX_CONCURRENT_CITIES")]
    max_concurrent_cities: Option<usize>,

    /// Show the browser window
    #[arg(long)]
    headed: bool,
}

/// Entry modes; without any, the whole site is crawled
#[derive(clap::Args)]
#[group(required = false, multiple = false)]
struct Mode {
    /// Crawl every city of one state
    #[arg(long)]
    state: Option<String>,

    /// Crawl the states listed in a file, one per line
    #[arg(long, value_name = "FILE")]
    states_file: Option<PathBuf>,

    /// Crawl one city by its catalog name
    #[arg(long)]
    city: Option<String>,

    /// Crawl one community page
    #[arg(long, value_name = "URL")]
    community: Option<String>,

    /// Crawl the community URLs listed in a file, one per line
    #[arg(long, value_name = "FILE")]
    communities_file: Option<PathBuf>,
}

impl Mode {
    fn scope(&self) -> Result<CrawlScope> {
        let scope = if let Some(state) = &self.state {
            CrawlScope::State(state.clone())
        } else if let Some(path) = &self.states_file {
            CrawlScope::StateList(read_identifier_list(path)?)
        } else if let Some(city) = &self.city {
            CrawlScope::NamedCity(city.clone())
        } else if let Some(url) = &self.community {
            CrawlScope::Community(url.clone())
        } else if let Some(path) = &self.communities_file {
            CrawlScope::CommunityList(read_identifier_list(path)?)
        } else {
            CrawlScope::WholeSite
        };
        Ok(scope)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = dotenvy::dotenv()
        && !e.not_found()
    {
        eprintln!("Ignoring unreadable .env file: {e}");
    }

    let args = Args::parse();
    if let Err(e) = logging::init() {
        eprintln!("{e:#}");
    }

    let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);
    match run(args, Arc::clone(&notifier)).await {
        Ok(report) if report.completed() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            error!("Crawler failed to start: {e:#}");
            notifier
                .notify(&format!("Crawler error: {e}"), &format!("{e:#}"))
                .await;
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args, notifier: Arc<dyn Notifier>) -> Result<RunReport> {
    let scope = args.mode.scope()?;

    let mut builder = CrawlConfig::builder()
        .output_dir(args.output_dir)
        .apply_env()?;
    if let Some(limit) = args.max_concurrent_cities {
        builder = builder.max_concurrent_cities(limit);
    }
    if args.headed {
        builder = builder.headless(false);
    }
    let config = builder.build().context("Invalid crawler configuration")?;

    let proxies: Arc<dyn ProxySupplier> = match config.proxy_file() {
        Some(path) => Arc::new(FileProxySupplier::load(path)?),
        None => Arc::new(NoProxy),
    };

    let sink = PersistenceSink::open(&config).context("Failed to open output tables")?;

    let (browser, handler_task, chrome_data_dir) = launch_browser(
        config.headless(),
        config.chrome_data_dir().cloned(),
        config.viewport(),
    )
    .await
    .context("Failed to launch browser")?;
    let browser = Arc::new(browser);

    let engine = Arc::new(ChromiumEngine::new(
        Arc::clone(&browser),
        config.page_load_timeout(),
    ));
    let ctx = CrawlContext::new(
        config,
        sink,
        engine,
        Arc::new(ReqwestFetcher::new()),
        proxies,
    );

    // The orchestrator and its engine handle are dropped here, leaving the
    // browser unshared for shutdown
    let report = Orchestrator::new(ctx, notifier).run(scope).await;

    match shutdown_browser(browser, handler_task, chrome_data_dir).await {
        CleanupResult::Success => info!("Browser shut down"),
        CleanupResult::PartialFailure(errors) => {
            warn!("Browser shutdown incomplete: {}", errors.join("; "));
        }
    }

    Ok(report)
}
