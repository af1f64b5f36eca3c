//! Structured logging setup using the `tracing` ecosystem.
//!
//! Installs a `tracing-subscriber` registry with a [`Targets`] filter and
//! either JSON output (production) or pretty output (TTY / local dev).
//! The format is detected from the terminal unless forced with `--json`
//! or `--pretty`. Access-log events come from
//! [`middleware::access_log`](crate::middleware::access_log) at `info`.

use tracing::Level;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer, Registry};

use crate::cli::LogLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[must_use]
pub fn resolve_format(pretty: bool, json: bool) -> LogFormat {
    if json {
        LogFormat::Json
    } else if pretty || std::io::IsTerminal::is_terminal(&std::io::stdout()) {
        LogFormat::Pretty
    } else {
        LogFormat::Json
    }
}

/// Filter for `level`. Connection-level chatter from the HTTP stack is
/// capped at `warn` so `debug` stays readable.
#[must_use]
pub fn filter(level: &LogLevel) -> Targets {
    let level = level.to_tracing_level();
    Targets::new()
        .with_default(level)
        .with_target("hyper", Level::WARN.min(level))
        .with_target("hyper_util", Level::WARN.min(level))
        .with_target("rustls", Level::WARN.min(level))
}

pub fn init(level: &LogLevel, format: LogFormat) {
    let output: Box<dyn Layer<Registry> + Send + Sync> = match format {
        LogFormat::Json => fmt::layer().json().with_target(false).boxed(),
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
    };

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(output)
        .with(filter(level))
        .try_init();
}
