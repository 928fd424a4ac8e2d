//! Process-wide log output.

use tracing_subscriber::EnvFilter;

/// Directive used when `RUST_LOG` does not mention this crate
pub const DEFAULT_DIRECTIVE: &str = "avalon_crawler=info";

/// Install the `fmt` subscriber; `log` records are routed into it too.
pub fn init() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(DEFAULT_DIRECTIVE.parse()?))
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {e}"))
}
