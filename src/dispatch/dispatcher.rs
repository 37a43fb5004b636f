//! End-to-end handling of one automation request.

use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::Instrument;

use crate::dispatch::capture::Console;
use crate::dispatch::request::{AutomationExitCode, AutomationRequest, AutomationResult};
use crate::engine::{AutomationEngine, EngineError, OperationContext};
use crate::observability::metrics;
use crate::reload::{ReloadCoordinator, ReloadOutcome};
use crate::staleness::ChangeTracker;

/// How a dispatch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The automation ran to completion (successfully or not).
    Completed(AutomationResult),
    /// The deadline expired first.
    TimedOut(AutomationResult),
}

impl DispatchOutcome {
    pub fn result(&self) -> &AutomationResult {
        match self {
            DispatchOutcome::Completed(result) | DispatchOutcome::TimedOut(result) => result,
        }
    }

    pub fn into_result(self) -> AutomationResult {
        match self {
            DispatchOutcome::Completed(result) | DispatchOutcome::TimedOut(result) => result,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, DispatchOutcome::TimedOut(_))
    }
}

/// Runs automations against a fresh configuration snapshot.
pub struct Dispatcher {
    engine: Arc<dyn AutomationEngine>,
    coordinator: ReloadCoordinator,
    tracker: Arc<dyn ChangeTracker>,
    console: Console,
}

impl Dispatcher {
    pub fn new(
        engine: Arc<dyn AutomationEngine>,
        coordinator: ReloadCoordinator,
        tracker: Arc<dyn ChangeTracker>,
        console: Console,
    ) -> Self {
        Self {
            engine,
            coordinator,
            tracker,
            console,
        }
    }

    /// Handle `request`, giving up after `timeout`.
    ///
    /// On timeout the request's console scope is released before returning.
    /// The operation itself is only asked to stop: an engine that never
    /// checks for cancellation keeps running on its worker, writing into a
    /// sealed buffer nobody reads.
    pub async fn dispatch(&self, request: AutomationRequest, timeout: Duration) -> DispatchOutcome {
        let name = request.name.clone();
        let start = Instant::now();
        let span = tracing::info_span!("automation", name = %request.name, args = ?request.args);

        let outcome = match tokio::time::timeout(timeout, self.run(request).instrument(span)).await {
            Ok(result) => DispatchOutcome::Completed(result),
            Err(_) => {
                tracing::warn!(
                    automation = %name,
                    timeout_secs = timeout.as_secs_f64(),
                    "[automation] timed out"
                );
                metrics::record_timeout();
                DispatchOutcome::TimedOut(AutomationResult::timed_out(timeout))
            }
        };

        metrics::record_automation(&name, outcome.result().exit_code, start);
        outcome
    }

    async fn run(&self, request: AutomationRequest) -> AutomationResult {
        tracing::info!(
            automation = %request.name,
            args = ?request.args,
            "[automation] received"
        );

        match self.coordinator.ensure_fresh(self.tracker.as_ref()).await {
            Ok(ReloadOutcome::Reloaded { generation }) => {
                tracing::warn!(generation, "[automation] configurations were reloaded due to a stale state");
                metrics::record_forced_reload();
            }
            Ok(ReloadOutcome::Coalesced { generation }) => {
                tracing::debug!(generation, "[automation] stale state resolved by concurrent reload");
            }
            Ok(ReloadOutcome::Fresh) => {}
            Err(e) => {
                tracing::error!(error = %e, "[automation] configuration reload failed");
                return AutomationResult::new(
                    AutomationExitCode::UnknownError,
                    format!("Failed to reload configuration: {e}"),
                );
            }
        }

        let snapshot = self.coordinator.current();
        let AutomationRequest {
            name,
            args,
            stdin,
            log_level,
        } = request;

        let mut scope = self.console.acquire(stdin, log_level).await;
        let mut ctx = OperationContext::new(snapshot, scope.io());
        let mut stderr = ctx.stderr.clone();
        let _cancel = ctx.cancellation();

        let engine = Arc::clone(&self.engine);
        let worker_name = name.clone();
        let span = tracing::Span::current();
        let joined = tokio::task::spawn_blocking(move || {
            let _entered = span.enter();
            engine.execute(&mut ctx, &worker_name, &args)
        })
        .await;

        let exit_code = match joined {
            Ok(Ok(code)) => {
                tracing::info!(automation = %name, exit_code = code, "[automation] processed");
                code
            }
            Ok(Err(EngineError::SystemExit(reason))) => {
                tracing::error!(automation = %name, %reason, "[automation] command raised a system exit");
                AutomationExitCode::SystemExit.code()
            }
            Ok(Err(e @ EngineError::UnknownAutomation(_))) => {
                let _ = writeln!(stderr, "{e}");
                AutomationExitCode::KnownError.code()
            }
            Ok(Err(e)) => {
                tracing::warn!(automation = %name, error = %e, "[automation] failed");
                let _ = writeln!(stderr, "{e}");
                AutomationExitCode::GeneralException.code()
            }
            Err(e) => {
                tracing::error!(automation = %name, error = %e, "[automation] command terminated abruptly");
                AutomationExitCode::SystemExit.code()
            }
        };

        AutomationResult::new(exit_code, scope.finish())
    }
}
