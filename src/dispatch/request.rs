//! Automation request and result types.
//!
//! These are also the JSON bodies of `POST /automation`.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Exit codes with a fixed meaning. Operations may return any other value,
/// which is passed through untouched.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AutomationExitCode {
    Success = 0,
    /// Expected failure reported by the automation (bad arguments, unknown name).
    KnownError = 1,
    /// The automation failed with an error message.
    GeneralException = 2,
    /// The helper could not run the automation at all (e.g. reload failed).
    UnknownError = 3,
    /// The automation terminated abruptly.
    SystemExit = 4,
    /// The automation did not finish within its deadline.
    Timeout = 5,
}

impl AutomationExitCode {
    pub const fn code(self) -> i32 {
        self as i32
    }
}

impl From<AutomationExitCode> for i32 {
    fn from(code: AutomationExitCode) -> Self {
        code.code()
    }
}

/// One automation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomationRequest {
    pub name: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub stdin: String,
    #[serde(default = "default_log_level")]
    pub log_level: i32,
}

fn default_log_level() -> i32 {
    30
}

impl AutomationRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            stdin: String::new(),
            log_level: default_log_level(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_stdin(mut self, stdin: impl Into<String>) -> Self {
        self.stdin = stdin.into();
        self
    }

    pub fn with_log_level(mut self, log_level: i32) -> Self {
        self.log_level = log_level;
        self
    }
}

/// Exit status and captured stdout/stderr of one automation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomationResult {
    pub exit_code: i32,
    pub output: String,
}

impl AutomationResult {
    pub fn new(exit_code: impl Into<i32>, output: impl Into<String>) -> Self {
        Self {
            exit_code: exit_code.into(),
            output: output.into(),
        }
    }

    pub fn timed_out(timeout: Duration) -> Self {
        Self::new(
            AutomationExitCode::Timeout,
            format!("Timed out after {} seconds", timeout.as_secs_f64()),
        )
    }
}
