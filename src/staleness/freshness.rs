//! Freshness state: the timestamp of the last relevant change.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::clock::Stamp;

/// A relevant change observed on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub path: PathBuf,
    pub observed_at: Stamp,
}

impl ChangeEvent {
    pub fn now(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            observed_at: Stamp::now(),
        }
    }
}

/// Answers "has anything relevant changed since `since`?".
///
/// Implemented by the live [`StalenessCache`](super::StalenessCache) and by
/// [`FreshnessState`] itself, which tests drive by hand.
pub trait ChangeTracker: Send + Sync {
    fn reload_required(&self, since: Stamp) -> bool;
}

/// `last_change_at`, advanced monotonically.
///
/// Any number of changes between two reads collapse into one value.
#[derive(Debug, Default)]
pub struct FreshnessState {
    last_change_at: AtomicU64,
}

impl FreshnessState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_change_at(&self) -> Stamp {
        Stamp::from_nanos(self.last_change_at.load(Ordering::Acquire))
    }

    /// Advance to `at` unless a later change is already recorded.
    pub fn mark_changed(&self, at: Stamp) {
        self.last_change_at.fetch_max(at.as_nanos(), Ordering::AcqRel);
    }

    pub fn record(&self, event: &ChangeEvent) {
        self.mark_changed(event.observed_at);
    }
}

impl ChangeTracker for FreshnessState {
    fn reload_required(&self, since: Stamp) -> bool {
        self.last_change_at() > since
    }
}
