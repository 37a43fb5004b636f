//! Freshness report for liveness checks.

use serde::{Deserialize, Serialize};

use crate::reload::ReloadCoordinator;

/// Body of `GET /health`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    /// Unix time (seconds) the published snapshot was built at.
    pub last_reload_at: f64,
}

/// Reads the published snapshot; never waits for a reload in progress.
#[derive(Clone)]
pub struct HealthReporter {
    coordinator: ReloadCoordinator,
}

impl HealthReporter {
    pub fn new(coordinator: ReloadCoordinator) -> Self {
        Self { coordinator }
    }

    pub fn report(&self) -> HealthReport {
        HealthReport {
            last_reload_at: self.coordinator.current().built_at().unix_seconds(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reload::{BuildError, ConfigBuilder, MonitoringConfig};
    use std::sync::Arc;

    struct EmptyBuilder;

    impl ConfigBuilder for EmptyBuilder {
        fn build_all(&self) -> Result<MonitoringConfig, BuildError> {
            Ok(MonitoringConfig::default())
        }
    }

    #[tokio::test]
    async fn report_follows_reloads() {
        let coordinator = ReloadCoordinator::start(Arc::new(EmptyBuilder)).await.unwrap();
        let reporter = HealthReporter::new(coordinator.clone());

        let first = reporter.report();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        coordinator.reload().await.unwrap();
        let second = reporter.report();

        assert!(second.last_reload_at > first.last_reload_at);
    }
}
