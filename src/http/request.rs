//! Request metadata.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) for every call
//! - Extract the client's timeout hint from `Keep-Alive`
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - A client-supplied `x-request-id` is kept, not replaced

use axum::http::{HeaderMap, HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates `x-request-id` values for requests that arrive without one.
#[derive(Clone, Copy, Debug, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Raw `Keep-Alive` header value, if present and valid ASCII.
pub fn keep_alive_hint(headers: &HeaderMap) -> Option<&str> {
    headers.get("keep-alive").and_then(|v| v.to_str().ok())
}
