use tracing_appender::non_blocking::WorkerGuard;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, Registry};
use tracing_subscriber::{fmt, prelude::*}; // Enables `.with()` chaining for layers

use crate::shared::config::environment::LogConfig;

/// Installs the global subscriber. When `LOG_DIR` is set a daily rolling
/// plain-text log file is written next to the terminal output; keep the returned guard
/// alive or buffered lines are lost on exit.
pub fn init_logger(config: &LogConfig) -> Option<WorkerGuard> {
    let env_filter =
        EnvFilter::try_new(&config.filter).unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer()
        .with_target(false) // hide module path
        .with_level(true)
        .with_line_number(true)
        .with_file(true)
        .pretty();

    let (file_layer, guard) = match &config.directory {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "storefront-api.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    Registry::default()
        .with(env_filter)
        .with(fmt_layer)
        .with(file_layer)
        .with(ErrorLayer::default())
        .init();

    guard
}
