//! Logging setup
//!
//! The terminal is owned by the UI, so logs go to a daily rolling file as
//! structured JSON. The level comes from `SLOT_STUDIO_LOG` (an
//! `EnvFilter` directive), defaulting to `info`.

use std::path::Path;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, prelude::*, registry::Registry, EnvFilter};

pub const LOG_ENV: &str = "SLOT_STUDIO_LOG";
const LOG_FILE_PREFIX: &str = "slot-studio.log";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber writing to `log_dir`
///
/// Without a log directory nothing is installed and events are dropped.
pub fn init_logging(log_dir: Option<&Path>) -> anyhow::Result<()> {
    let Some(log_dir) = log_dir else {
        return Ok(());
    };
    std::fs::create_dir_all(log_dir)?;

    let file_appender = rolling::daily(log_dir, LOG_FILE_PREFIX);
    Registry::default()
        .with(env_filter())
        .with(
            fmt::layer()
                .json()
                .with_writer(file_appender)
                .with_target(true)
                .with_thread_ids(true),
        )
        .try_init()?;

    tracing::info!(dir = %log_dir.display(), "file logging initialized");
    Ok(())
}
