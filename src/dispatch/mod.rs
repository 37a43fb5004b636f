//! Request dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! AutomationRequest + effective timeout
//!     → dispatcher.rs (staleness check, conditional reload)
//!     → capture.rs (exclusive console scope: capture, stdin, log level)
//!     → engine (blocking worker, cancellable)
//!     → AutomationResult | timeout result
//! ```
//!
//! # Design Decisions
//! - Nothing in here may crash the process; every path yields a result
//! - The deadline covers the reload wait as well as the automation
//! - Console scopes are serialized; output never mixes across requests

pub mod capture;
pub mod dispatcher;
pub mod request;

pub use capture::{CaptureBuffer, Console, OperationIo, StdioScope};
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use request::{AutomationExitCode, AutomationRequest, AutomationResult};
