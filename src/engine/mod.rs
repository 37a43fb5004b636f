//! Automation engine interface.
//!
//! # Data Flow
//! ```text
//! dispatcher
//!     → OperationContext (snapshot, redirected stdio, cancellation flag)
//!     → AutomationEngine::execute(name, args) on a blocking worker
//!     → exit code | EngineError
//! ```
//!
//! # Design Decisions
//! - Engines are synchronous; the dispatcher owns timeouts
//! - The snapshot is handed over explicitly, never read from a global
//! - Cancellation is cooperative: long operations poll `is_cancelled`

pub mod commands;
pub mod registry;

use std::io::{self, Cursor};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

use crate::dispatch::capture::{CaptureBuffer, OperationIo};
use crate::reload::ConfigSnapshot;

pub use registry::{AutomationCommand, AutomationRegistry};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Unknown automation: {0}")]
    UnknownAutomation(String),
    #[error("{0}")]
    Failed(String),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// The operation asked for the whole process to stop.
    #[error("automation requested process exit: {0}")]
    SystemExit(String),
}

/// Everything an operation may touch while it runs.
pub struct OperationContext {
    pub snapshot: Arc<ConfigSnapshot>,
    pub stdin: Cursor<Vec<u8>>,
    pub stdout: CaptureBuffer,
    pub stderr: CaptureBuffer,
    cancelled: Arc<AtomicBool>,
}

impl OperationContext {
    pub fn new(snapshot: Arc<ConfigSnapshot>, io: OperationIo) -> Self {
        Self {
            snapshot,
            stdin: io.stdin,
            stdout: io.stdout,
            stderr: io.stderr,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The dispatcher stopped waiting for this operation.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub fn cancellation(&self) -> CancelOnDrop {
        CancelOnDrop(Arc::clone(&self.cancelled))
    }
}

/// Raises the cancellation flag of an [`OperationContext`] when dropped.
pub struct CancelOnDrop(Arc<AtomicBool>);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Release);
    }
}

/// Runs named automations.
pub trait AutomationEngine: Send + Sync + 'static {
    fn execute(
        &self,
        ctx: &mut OperationContext,
        name: &str,
        args: &[String],
    ) -> Result<i32, EngineError>;
}
