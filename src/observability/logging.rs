//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the global `tracing` subscriber
//! - Own the process-wide verbosity and let requests override it temporarily
//!
//! # Design Decisions
//! - `RUST_LOG` selects targets, the reloadable level decides verbosity
//! - Logs go to stderr
//! - Request verbosity uses the numeric scale of the calling tools
//!   (10 debug, 20 info, 30 warning, 40 error)

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry};

const DEFAULT_DIRECTIVES: &str = "automation_helper=trace,tower_http=debug,warn";

/// Handle on the global, reloadable log level.
#[derive(Clone)]
pub struct LogLevelHandle {
    inner: reload::Handle<LevelFilter, Registry>,
}

impl LogLevelHandle {
    pub fn current(&self) -> Option<LevelFilter> {
        self.inner.clone_current()
    }

    /// Switch the global level to `level` until the returned guard drops.
    pub fn scoped(&self, level: LevelFilter) -> LogLevelGuard {
        let previous = self.current();
        if let Err(e) = self.inner.modify(|filter| *filter = level) {
            tracing::warn!(error = %e, "Failed to override log level");
        }
        LogLevelGuard {
            handle: self.clone(),
            previous,
        }
    }
}

/// Restores the previous global log level on drop.
pub struct LogLevelGuard {
    handle: LogLevelHandle,
    previous: Option<LevelFilter>,
}

impl Drop for LogLevelGuard {
    fn drop(&mut self) {
        if let Some(previous) = self.previous {
            let _ = self.handle.inner.modify(|filter| *filter = previous);
        }
    }
}

/// A reloadable level layer for a [`Registry`] and the handle controlling it.
///
/// The handle only works while the subscriber holding the layer is alive.
pub fn level_layer(initial: LevelFilter) -> (reload::Layer<LevelFilter, Registry>, LogLevelHandle) {
    let (layer, handle) = reload::Layer::new(initial);
    (layer, LogLevelHandle { inner: handle })
}

/// Install the global subscriber. Call once at startup.
pub fn init_logging(baseline: &str) -> LogLevelHandle {
    let level = parse_level_str(baseline).unwrap_or(LevelFilter::INFO);
    let (level_layer, handle) = level_layer(level);

    tracing_subscriber::registry()
        .with(level_layer)
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_DIRECTIVES.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    handle
}

pub fn parse_level_str(s: &str) -> Option<LevelFilter> {
    match s.trim().to_lowercase().as_str() {
        "off" => Some(LevelFilter::OFF),
        "error" => Some(LevelFilter::ERROR),
        "warn" | "warning" => Some(LevelFilter::WARN),
        "info" => Some(LevelFilter::INFO),
        "debug" => Some(LevelFilter::DEBUG),
        "trace" => Some(LevelFilter::TRACE),
        _ => None,
    }
}

/// Map a numeric request verbosity onto a level filter.
pub fn level_from_verbosity(verbosity: i32) -> LevelFilter {
    match verbosity {
        i32::MIN..=9 => LevelFilter::TRACE,
        10..=19 => LevelFilter::DEBUG,
        20..=29 => LevelFilter::INFO,
        30..=39 => LevelFilter::WARN,
        _ => LevelFilter::ERROR,
    }
}
