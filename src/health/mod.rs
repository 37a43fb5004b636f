//! Health reporting subsystem.
//!
//! # Data Flow
//! ```text
//! GET /health
//!     → reporter.rs (read current snapshot, lock-free)
//!     → { last_reload_at }
//! ```
//!
//! # Design Decisions
//! - Reports the build time of the snapshot requests are served from
//! - Health checks never trigger or wait for a reload

pub mod reporter;

pub use reporter::{HealthReport, HealthReporter};
