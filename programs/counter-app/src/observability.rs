//! Logging setup for the counter app.
//!
//! Logs go to stderr so that stdout only carries the rendered view.

use anyhow::{Context, Result};
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `level` when set.
pub fn init_subscriber(level: Level) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .with_file(true);

    Registry::default()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to set global default subscriber")
}
