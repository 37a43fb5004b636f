//! Startup orchestration.
//!
//! # Responsibilities
//! - Derive the watch schedules from the site root
//! - Start change detection before the initial build
//! - Build the first snapshot and wire the request path around it
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Watching starts before the first build, so no change can slip between them
//! - Subsystems initialize in order, not concurrently

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::config::{HelperConfig, WatchScheduleRegistry};
use crate::dispatch::{Console, Dispatcher};
use crate::engine::{AutomationEngine, AutomationRegistry};
use crate::health::HealthReporter;
use crate::http::AppState;
use crate::lifecycle::Shutdown;
use crate::observability::logging::LogLevelHandle;
use crate::reload::{ConfigBuilder, FileConfigBuilder, ReloadCoordinator, ReloadError};
use crate::staleness::{ObserverError, StalenessCache};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid watch pattern: {0}")]
    Pattern(#[from] globset::Error),
    #[error("cannot start filesystem observer: {0}")]
    Observer(#[from] ObserverError),
    #[error("initial configuration build failed: {0}")]
    InitialBuild(#[from] ReloadError),
}

/// The running helper, minus its listener.
pub struct Service {
    pub coordinator: ReloadCoordinator,
    pub dispatcher: Arc<Dispatcher>,
    pub health: HealthReporter,
    pub staleness: Arc<StalenessCache>,
    max_timeout: Duration,
}

impl Service {
    /// State for [`crate::http::HttpServer`].
    pub fn app_state(&self) -> AppState {
        AppState {
            dispatcher: Arc::clone(&self.dispatcher),
            health: self.health.clone(),
            max_timeout: self.max_timeout,
        }
    }
}

/// Start the helper for the site in `config` with the built-in collaborators.
pub async fn start(
    config: &HelperConfig,
    shutdown: &Shutdown,
    log_level: Option<LogLevelHandle>,
) -> Result<Service, StartupError> {
    let registry = WatchScheduleRegistry::from_site_root(&config.site.root);
    let builder = Arc::new(FileConfigBuilder::new(&registry)?);
    let engine = Arc::new(AutomationRegistry::with_builtins());
    start_with(config, &registry, builder, engine, shutdown, log_level).await
}

/// Start the helper with caller-supplied builder and engine.
pub async fn start_with(
    config: &HelperConfig,
    registry: &WatchScheduleRegistry,
    builder: Arc<dyn ConfigBuilder>,
    engine: Arc<dyn AutomationEngine>,
    shutdown: &Shutdown,
    log_level: Option<LogLevelHandle>,
) -> Result<Service, StartupError> {
    tracing::info!(
        site_root = %config.site.root.display(),
        schedules = registry.len(),
        "Starting automation helper"
    );

    let staleness = Arc::new(StalenessCache::start(
        registry,
        Duration::from_secs(config.watch.retry_interval_secs),
        shutdown.subscribe(),
    )?);

    let coordinator = ReloadCoordinator::start(builder).await?;
    let dispatcher = Arc::new(Dispatcher::new(
        engine,
        coordinator.clone(),
        staleness.clone(),
        Console::new(log_level),
    ));
    let health = HealthReporter::new(coordinator.clone());

    tracing::info!(
        generation = coordinator.current().generation(),
        sources = coordinator.current().config().len(),
        "Initial configuration loaded"
    );

    Ok(Service {
        coordinator,
        dispatcher,
        health,
        staleness,
        max_timeout: Duration::from_secs(config.timeouts.max_request_secs),
    })
}
