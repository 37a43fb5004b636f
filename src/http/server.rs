//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, body limit, request ID)
//! - Negotiate per-request timeouts and hand requests to the dispatcher
//! - Serve health checks
//! - Bind server to listener and drain on shutdown

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, State},
    http::{HeaderMap, HeaderName, Request},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::ListenerConfig;
use crate::dispatch::{AutomationRequest, DispatchOutcome, Dispatcher};
use crate::health::{HealthReport, HealthReporter};
use crate::http::request::{keep_alive_hint, MakeRequestUuid, X_REQUEST_ID};
use crate::resilience::effective_timeout;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub health: HealthReporter,
    /// Ceiling for negotiated request timeouts.
    pub max_timeout: Duration,
}

/// HTTP server for the automation helper.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(state: AppState, config: &ListenerConfig) -> Self {
        let router = Self::build_router(state, config.max_body_size);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState, max_body_size: usize) -> Router {
        let request_id = HeaderName::from_static(X_REQUEST_ID);

        Router::new()
            .route("/automation", post(run_automation))
            .route("/health", get(health))
            .with_state(state)
            .layer(DefaultBodyLimit::disable())
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                    .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                        let request_id = req
                            .headers()
                            .get(X_REQUEST_ID)
                            .and_then(|v| v.to_str().ok())
                            .unwrap_or("unknown");
                        tracing::info_span!(
                            "http",
                            method = %req.method(),
                            path = %req.uri().path(),
                            request_id = %request_id,
                        )
                    }))
                    .layer(PropagateRequestIdLayer::new(request_id))
                    .layer(RequestBodyLimitLayer::new(max_body_size)),
            )
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// `POST /automation`
async fn run_automation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<AutomationRequest>,
) -> DispatchOutcome {
    let timeout = effective_timeout(keep_alive_hint(&headers), state.max_timeout);
    tracing::debug!(
        automation = %request.name,
        timeout_secs = timeout.as_secs_f64(),
        "Dispatching request"
    );
    state.dispatcher.dispatch(request, timeout).await
}

/// `GET /health`
async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    Json(state.health.report())
}
