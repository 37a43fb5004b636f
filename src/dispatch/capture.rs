//! Scoped console acquisition: output capture, stdin substitution and log
//! verbosity override for one automation at a time.
//!
//! The console is process-global, so acquisitions are serialized by an async
//! mutex held from redirection to restoration. Everything a [`StdioScope`]
//! changes is undone when it drops, including when the owning request is
//! cancelled by its timeout.

use std::io::{self, Cursor, Write};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::observability::logging::{level_from_verbosity, LogLevelGuard, LogLevelHandle};

/// In-memory sink standing in for stdout and stderr.
///
/// Clones write to the same buffer. Once sealed, writes are accepted and
/// discarded, so an abandoned operation cannot leak into a later request.
#[derive(Clone, Default)]
pub struct CaptureBuffer {
    state: Arc<Mutex<CaptureState>>,
}

#[derive(Default)]
struct CaptureState {
    bytes: Vec<u8>,
    sealed: bool,
}

impl CaptureBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop accepting output and return what was captured so far.
    pub fn seal(&self) -> String {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.sealed = true;
        String::from_utf8_lossy(&std::mem::take(&mut state.bytes)).into_owned()
    }

    pub fn is_sealed(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .sealed
    }
}

impl Write for CaptureBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if !state.sealed {
            state.bytes.extend_from_slice(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// The streams an operation sees while its scope is held.
pub struct OperationIo {
    pub stdin: Cursor<Vec<u8>>,
    pub stdout: CaptureBuffer,
    pub stderr: CaptureBuffer,
}

/// Gatekeeper for the process console.
#[derive(Clone, Default)]
pub struct Console {
    lock: Arc<AsyncMutex<()>>,
    log_level: Option<LogLevelHandle>,
}

impl Console {
    /// A console that also overrides the global log level per scope.
    pub fn new(log_level: Option<LogLevelHandle>) -> Self {
        Self {
            lock: Arc::new(AsyncMutex::new(())),
            log_level,
        }
    }

    /// Wait for exclusive use of the console, then redirect it.
    pub async fn acquire(&self, stdin: String, verbosity: i32) -> StdioScope {
        let guard = Arc::clone(&self.lock).lock_owned().await;
        let log_guard = self
            .log_level
            .as_ref()
            .map(|handle| handle.scoped(level_from_verbosity(verbosity)));

        StdioScope {
            output: CaptureBuffer::new(),
            stdin: Some(stdin.into_bytes()),
            _log_guard: log_guard,
            _guard: guard,
        }
    }
}

/// Exclusive, redirected console for one request.
pub struct StdioScope {
    output: CaptureBuffer,
    stdin: Option<Vec<u8>>,
    // Field order: the log level is restored before the console is released.
    _log_guard: Option<LogLevelGuard>,
    _guard: OwnedMutexGuard<()>,
}

impl StdioScope {
    /// Streams for the operation. Stdout and stderr share one buffer;
    /// stdin can only be handed out once.
    pub fn io(&mut self) -> OperationIo {
        OperationIo {
            stdin: Cursor::new(self.stdin.take().unwrap_or_default()),
            stdout: self.output.clone(),
            stderr: self.output.clone(),
        }
    }

    /// Release the console and return the captured output.
    pub fn finish(self) -> String {
        self.output.seal()
    }
}

impl Drop for StdioScope {
    fn drop(&mut self) {
        self.output.seal();
    }
}
