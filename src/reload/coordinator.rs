//! Serialized rebuilds of the shared configuration snapshot.

use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::clock::Stamp;
use crate::observability::metrics;
use crate::reload::builder::{BuildError, ConfigBuilder};
use crate::reload::snapshot::ConfigSnapshot;
use crate::staleness::ChangeTracker;

#[derive(Debug, Error)]
pub enum ReloadError {
    #[error("configuration build failed: {0}")]
    Build(#[from] BuildError),
    #[error("configuration build panicked: {0}")]
    Panicked(String),
}

/// What [`ReloadCoordinator::ensure_fresh`] had to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// The current snapshot was already up to date.
    Fresh,
    /// A reload finished by another caller while we waited made ours unnecessary.
    Coalesced { generation: u64 },
    /// This caller rebuilt the snapshot.
    Reloaded { generation: u64 },
}

/// Owns the published [`ConfigSnapshot`] and is its only writer.
///
/// Cloning is cheap; all clones share the same snapshot and build lock.
#[derive(Clone)]
pub struct ReloadCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    builder: Arc<dyn ConfigBuilder>,
    current: ArcSwap<ConfigSnapshot>,
    build_lock: Arc<Mutex<()>>,
}

impl ReloadCoordinator {
    /// Perform the initial build and publish generation 1.
    pub async fn start(builder: Arc<dyn ConfigBuilder>) -> Result<Self, ReloadError> {
        let initial = {
            let builder = Arc::clone(&builder);
            run_blocking(move || {
                let built_at = Stamp::now();
                builder.clear_caches();
                let config = builder.build_all()?;
                Ok(ConfigSnapshot::new(config, built_at, 1))
            })
            .await?
        };

        tracing::info!(
            sources = initial.config().len(),
            "Initial configuration built"
        );
        metrics::record_snapshot_generation(1);

        Ok(Self {
            inner: Arc::new(Inner {
                builder,
                current: ArcSwap::from_pointee(initial),
                build_lock: Arc::new(Mutex::new(())),
            }),
        })
    }

    /// The currently published snapshot. Never blocks.
    pub fn current(&self) -> Arc<ConfigSnapshot> {
        self.inner.current.load_full()
    }

    /// Rebuild unconditionally, waiting for any in-flight build first.
    pub async fn reload(&self) -> Result<Arc<ConfigSnapshot>, ReloadError> {
        let guard = Arc::clone(&self.inner.build_lock).lock_owned().await;
        self.rebuild(guard).await
    }

    /// Rebuild only if `tracker` reports changes since the current snapshot.
    ///
    /// Callers that observe staleness while another rebuild is running wait
    /// for it and re-check against its result before building again.
    pub async fn ensure_fresh(
        &self,
        tracker: &dyn ChangeTracker,
    ) -> Result<ReloadOutcome, ReloadError> {
        if !tracker.reload_required(self.current().built_at()) {
            return Ok(ReloadOutcome::Fresh);
        }

        let guard = Arc::clone(&self.inner.build_lock).lock_owned().await;
        let current = self.current();
        if !tracker.reload_required(current.built_at()) {
            return Ok(ReloadOutcome::Coalesced {
                generation: current.generation(),
            });
        }

        let snapshot = self.rebuild(guard).await?;
        Ok(ReloadOutcome::Reloaded {
            generation: snapshot.generation(),
        })
    }

    async fn rebuild(&self, guard: OwnedMutexGuard<()>) -> Result<Arc<ConfigSnapshot>, ReloadError> {
        let inner = Arc::clone(&self.inner);
        let started = Instant::now();

        // The guard moves into the worker: a caller that stops waiting (timeout)
        // cannot let a second build start while this one is still running.
        let result = run_blocking(move || {
            let _guard = guard;
            inner.rebuild_locked()
        })
        .await;

        match &result {
            Ok(snapshot) => {
                tracing::info!(
                    generation = snapshot.generation(),
                    sources = snapshot.config().len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Configuration reloaded"
                );
                metrics::record_reload("success", started);
                metrics::record_snapshot_generation(snapshot.generation());
            }
            Err(e) => {
                tracing::error!(error = %e, "Configuration reload failed, keeping previous snapshot");
                metrics::record_reload("failure", started);
            }
        }
        result
    }
}

impl Inner {
    fn rebuild_locked(&self) -> Result<Arc<ConfigSnapshot>, ReloadError> {
        // Taken before reading any input: changes racing the build stay visible.
        let built_at = Stamp::now();
        self.builder.clear_caches();
        let config = self.builder.build_all()?;

        let generation = self.current.load().generation() + 1;
        let snapshot = Arc::new(ConfigSnapshot::new(config, built_at, generation));
        self.current.store(Arc::clone(&snapshot));
        Ok(snapshot)
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T, ReloadError>
where
    F: FnOnce() -> Result<T, ReloadError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result,
        Err(e) => Err(ReloadError::Panicked(e.to_string())),
    }
}
