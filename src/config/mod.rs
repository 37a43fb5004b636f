//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! helper config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → HelperConfig (validated, immutable)
//!
//! site root
//!     → schedules.rs (WatchScheduleRegistry)
//!     → staleness cache (what to observe)
//!     → config builder (what to load)
//! ```
//!
//! # Design Decisions
//! - The helper's own config is read once at startup; only the monitoring
//!   configuration it serves is reloaded at runtime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schedules;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schedules::{WatchSchedule, WatchScheduleRegistry};
pub use schema::{
    HelperConfig, ListenerConfig, ObservabilityConfig, SiteConfig, TimeoutConfig, WatchConfig,
};
