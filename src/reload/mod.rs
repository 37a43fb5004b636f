//! Configuration reload subsystem.
//!
//! # Data Flow
//! ```text
//! startup / stale request / SIGHUP
//!     → coordinator.rs (build lock, double-checked staleness)
//!     → builder.rs (ConfigBuilder::build_all on a blocking worker)
//!     → snapshot.rs (ConfigSnapshot, built_at stamped before the build)
//!     → atomic swap of Arc<ConfigSnapshot>
//!     → readers see old or new snapshot, never a mix
//! ```
//!
//! # Design Decisions
//! - At most one build in flight; waiters re-check instead of rebuilding
//! - A failed build publishes nothing and leaves staleness set
//! - Snapshots are replaced wholesale, never mutated

pub mod builder;
pub mod coordinator;
pub mod snapshot;

pub use builder::{BuildError, ConfigBuilder, FileConfigBuilder};
pub use coordinator::{ReloadCoordinator, ReloadError, ReloadOutcome};
pub use snapshot::{ConfigSnapshot, ConfigSource, MonitoringConfig};
