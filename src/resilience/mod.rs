//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming automation request:
//!     → timeouts.rs (negotiate deadline from Keep-Alive hint, cap at ceiling)
//!     → dispatcher enforces the deadline
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every automation has a deadline
//! - A timed-out request still gets a well-formed answer

pub mod timeouts;

pub use timeouts::{effective_timeout, MAX_REQUEST_TIMEOUT};
