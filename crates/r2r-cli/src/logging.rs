//! Subscriber setup: a daily log file, the in-session diagnostics feed, plus
//! warnings on stderr for the one-shot command.

use anyhow::Result;
use r2r_application::DiagnosticsLayer;
use r2r_core::config::LoggingConfig;
use r2r_infrastructure::R2rPaths;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Installs the global subscriber.
///
/// `RUST_LOG` wins over the configured level; `diagnostics` filters on its
/// own. The returned guard flushes the file writer and must live until exit.
pub fn init(
    config: &LoggingConfig,
    diagnostics: DiagnosticsLayer,
    stderr_warnings: bool,
) -> Result<Option<WorkerGuard>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let (file_layer, guard) = match R2rPaths::log_dir() {
        Ok(dir) => {
            std::fs::create_dir_all(&dir)?;
            let appender = tracing_appender::rolling::daily(&dir, "r2r.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(filter);
            (Some(layer), Some(guard))
        }
        Err(_) => (None, None),
    };

    let stderr_layer = stderr_warnings.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(LevelFilter::WARN)
    });

    tracing_subscriber::registry()
        .with(diagnostics)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()?;

    Ok(guard)
}
