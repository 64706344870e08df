//! Structured Logger
//!
//! Wraps `tracing` to provide console output, daily-rotated NDJSON files,
//! and environment-based level control.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Keeps the background file writer alive. Drop it last, on shutdown.
pub struct LogGuard {
    _file: WorkerGuard,
}

/// Initialize the global structured logger.
///
/// `RUST_LOG` wins over `level` when set. With `json_console` the console
/// layer emits JSON lines as well.
pub fn init_logger<P: AsRef<Path>>(log_dir: P, level: &str, json_console: bool) -> LogGuard {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Rolling file appender: writes NDJSON to `logs/menuscan.log.YYYY-MM-DD`
    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, "menuscan.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .json()
        .with_writer(file_writer)
        .with_ansi(false);

    let registry = tracing_subscriber::registry().with(env_filter).with(file_layer);

    if json_console {
        let _ = registry
            .with(fmt::layer().json().with_writer(std::io::stdout))
            .try_init();
    } else {
        let _ = registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stdout)
                    .with_target(false)
                    .with_ansi(true),
            )
            .try_init();
    }

    LogGuard { _file: guard }
}
