//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → Watch schedules → Staleness cache → Initial build
//!         → Engine → Dispatcher → Health reporter
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain requests → Stop retry task → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//!     SIGHUP → Unconditional config reload
//! ```
//!
//! # Design Decisions
//! - Ordered startup: nothing serves requests before the first snapshot exists
//! - A failed initial build is fatal; later failures are not

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{start, Service, StartupError};
