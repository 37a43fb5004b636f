//! Live staleness cache backed by a `notify` filesystem watcher.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use notify::event::{CreateKind, ModifyKind, RemoveKind};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use thiserror::Error;
use tokio::sync::broadcast;

use crate::clock::Stamp;
use crate::config::{WatchSchedule, WatchScheduleRegistry};
use crate::observability::metrics;
use crate::staleness::freshness::{ChangeEvent, ChangeTracker, FreshnessState};
use crate::staleness::matcher::ScheduleMatcher;

#[derive(Debug, Error)]
pub enum ObserverError {
    #[error("invalid watch pattern: {0}")]
    Pattern(#[from] globset::Error),
    #[error("failed to create filesystem watcher: {0}")]
    Watcher(#[from] notify::Error),
}

/// Observes the watch schedules and answers staleness queries.
///
/// Change notifications are delivered on the watcher's own background
/// thread and only ever touch the atomic [`FreshnessState`]. Dropping the
/// cache stops the observation.
pub struct StalenessCache {
    freshness: Arc<FreshnessState>,
    watcher: Arc<Mutex<RecommendedWatcher>>,
    pending: Arc<Mutex<Vec<WatchSchedule>>>,
}

impl StalenessCache {
    /// Start observing every schedule in `registry`.
    ///
    /// Schedules whose directory cannot be watched yet, or whose directory
    /// disappears later, are retried every `retry_interval` until `shutdown`
    /// fires. Must be called from within a Tokio runtime.
    pub fn start(
        registry: &WatchScheduleRegistry,
        retry_interval: Duration,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<Self, ObserverError> {
        let matchers = registry
            .iter()
            .map(ScheduleMatcher::compile)
            .collect::<Result<Vec<_>, _>>()?;
        let freshness = Arc::new(FreshnessState::new());
        let pending = Arc::new(Mutex::new(Vec::new()));

        let sink = EventSink {
            matchers,
            freshness: Arc::clone(&freshness),
            pending: Arc::clone(&pending),
        };
        let watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => sink.handle_event(event),
                Err(e) => sink.handle_error(e),
            },
            Config::default(),
        )?;

        let cache = Self {
            freshness,
            watcher: Arc::new(Mutex::new(watcher)),
            pending,
        };

        for schedule in registry {
            if let Err(e) = watch_schedule(&cache.watcher, schedule) {
                tracing::warn!(
                    path = %schedule.path.display(),
                    error = %e,
                    "Cannot watch schedule yet, will retry"
                );
                lock(&cache.pending).push(schedule.clone());
            }
        }

        cache.spawn_retry(retry_interval, shutdown);

        tracing::info!(
            schedules = registry.len(),
            pending = lock(&cache.pending).len(),
            "Staleness cache started"
        );
        Ok(cache)
    }

    /// Directories currently waiting to be (re)watched.
    pub fn pending_paths(&self) -> Vec<PathBuf> {
        lock(&self.pending).iter().map(|s| s.path.clone()).collect()
    }

    fn spawn_retry(&self, interval: Duration, mut shutdown: broadcast::Receiver<()>) {
        let watcher = Arc::clone(&self.watcher);
        let pending = Arc::clone(&self.pending);
        let freshness = Arc::clone(&self.freshness);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if !lock(&pending).is_empty()
                            && retry_pending(&watcher, &pending, &freshness)
                        {
                            tracing::info!("All watch schedules attached");
                        }
                    }
                    _ = shutdown.recv() => {
                        tracing::debug!("Watch retry task received shutdown signal");
                        break;
                    }
                }
            }
        });
    }
}

impl ChangeTracker for StalenessCache {
    fn reload_required(&self, since: Stamp) -> bool {
        self.freshness.reload_required(since)
    }
}

/// State the watcher callback needs. Lives on notify's event thread, which
/// must never call back into the watcher itself.
struct EventSink {
    matchers: Vec<ScheduleMatcher>,
    freshness: Arc<FreshnessState>,
    pending: Arc<Mutex<Vec<WatchSchedule>>>,
}

impl EventSink {
    fn handle_event(&self, event: Event) {
        // The kernel watch dies with the directory it was placed on.
        if matches!(
            event.kind,
            EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(_))
        ) {
            for path in &event.paths {
                self.detach_root(path);
            }
        }

        let folder = match event.kind {
            EventKind::Create(CreateKind::Folder) | EventKind::Remove(RemoveKind::Folder) => true,
            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => false,
            _ => return,
        };

        for path in &event.paths {
            let is_dir = folder || path.is_dir();
            if self.matchers.iter().any(|m| m.matches(path, is_dir)) {
                let change = ChangeEvent::now(path.as_path());
                tracing::debug!(path = %change.path.display(), kind = ?event.kind, "Relevant change observed");
                self.freshness.record(&change);
                metrics::record_change_event();
            }
        }
    }

    fn handle_error(&self, error: notify::Error) {
        tracing::warn!(error = %error, "Watch error");
        for path in &error.paths {
            self.detach_root(path);
        }
    }

    /// Queue the schedule rooted at `path` for re-watching.
    fn detach_root(&self, path: &Path) {
        for matcher in self.matchers.iter().filter(|m| m.is_root(path)) {
            let schedule = matcher.schedule();
            let mut pending = lock(&self.pending);
            if pending.iter().any(|s| s.path == schedule.path) {
                continue;
            }
            tracing::warn!(path = %schedule.path.display(), "Watched directory went away, will re-attach");
            pending.push(schedule.clone());
            self.freshness.record(&ChangeEvent::now(path));
            metrics::record_change_event();
        }
    }
}

/// Try to attach every pending schedule. Returns true once none are left.
///
/// The pending lock is never held across watcher calls: those wait on
/// notify's event thread, which may itself be queueing a schedule.
fn retry_pending(
    watcher: &Mutex<RecommendedWatcher>,
    pending: &Mutex<Vec<WatchSchedule>>,
    freshness: &FreshnessState,
) -> bool {
    let candidates = lock(pending).clone();
    let mut attached = Vec::new();

    for schedule in &candidates {
        // A renamed directory keeps its old watch; drop it before re-watching the path.
        let _ = lock(watcher).unwatch(&schedule.path);
        match watch_schedule(watcher, schedule) {
            Ok(()) => {
                // Whatever appeared there was never part of a build.
                freshness.record(&ChangeEvent::now(&schedule.path));
                tracing::info!(path = %schedule.path.display(), "Watch schedule attached");
                attached.push(schedule.path.clone());
            }
            Err(e) => {
                tracing::debug!(path = %schedule.path.display(), error = %e, "Schedule still unavailable");
            }
        }
    }

    let mut pending = lock(pending);
    pending.retain(|s| !attached.contains(&s.path));
    pending.is_empty()
}

fn watch_schedule(watcher: &Mutex<RecommendedWatcher>, schedule: &WatchSchedule) -> notify::Result<()> {
    let mode = if schedule.recursive {
        RecursiveMode::Recursive
    } else {
        RecursiveMode::NonRecursive
    };
    lock(watcher).watch(&schedule.path, mode)
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
