//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, scoped verbosity)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stderr (journal / site log)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every HTTP span
//! - Metrics are cheap (atomic increments) and off unless configured
//! - The global level is reloadable so a request can raise its verbosity

pub mod logging;
pub mod metrics;
