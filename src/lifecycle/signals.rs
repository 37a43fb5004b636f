//! OS signal handling.
//!
//! # Responsibilities
//! - Translate SIGTERM/SIGINT into a graceful shutdown
//! - Translate SIGHUP into an unconditional configuration reload
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - A failed SIGHUP reload is logged; the old snapshot keeps serving

use tokio::sync::broadcast;

use crate::lifecycle::Shutdown;
use crate::reload::ReloadCoordinator;

/// Listen for signals until shutdown. Spawn this as a task.
pub async fn handle_signals(shutdown: Shutdown, coordinator: ReloadCoordinator) {
    let mut stop = shutdown.subscribe();

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let (mut term, mut hup) = match (
            signal(SignalKind::terminate()),
            signal(SignalKind::hangup()),
        ) {
            (Ok(term), Ok(hup)) => (term, hup),
            (Err(e), _) | (_, Err(e)) => {
                tracing::error!(error = %e, "Failed to install signal handlers");
                wait_for_ctrl_c(&shutdown, &mut stop).await;
                return;
            }
        };

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("SIGINT received, shutting down");
                    shutdown.trigger();
                    return;
                }
                _ = term.recv() => {
                    tracing::info!("SIGTERM received, shutting down");
                    shutdown.trigger();
                    return;
                }
                _ = hup.recv() => {
                    tracing::info!("SIGHUP received, reloading configuration");
                    if let Err(e) = coordinator.reload().await {
                        tracing::error!(error = %e, "Configuration reload on SIGHUP failed");
                    }
                }
                _ = stop.recv() => return,
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = coordinator;
        wait_for_ctrl_c(&shutdown, &mut stop).await;
    }
}

async fn wait_for_ctrl_c(shutdown: &Shutdown, stop: &mut broadcast::Receiver<()>) {
    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                return;
            }
            tracing::info!("Ctrl+C received, shutting down");
            shutdown.trigger();
        }
        _ = stop.recv() => {}
    }
}
