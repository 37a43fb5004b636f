//! Staleness detection subsystem.
//!
//! # Data Flow
//! ```text
//! WatchScheduleRegistry
//!     → matcher.rs (compile patterns per schedule)
//!     → cache.rs (notify watcher, background thread)
//!     → freshness.rs (atomic last_change_at, monotonic max)
//!     ← dispatcher asks reload_required(snapshot.built_at)
//! ```
//!
//! # Design Decisions
//! - O(1) state: bursts of changes collapse into one timestamp
//! - Readers never lock; the watcher thread only does an atomic max
//! - Missing directories are retried in the background, never fatal
//! - `ChangeTracker` lets tests substitute a hand-driven `FreshnessState`

pub mod cache;
pub mod freshness;
pub mod matcher;

pub use cache::{ObserverError, StalenessCache};
pub use freshness::{ChangeEvent, ChangeTracker, FreshnessState};
pub use matcher::ScheduleMatcher;
