//! Response mapping.
//!
//! # Responsibilities
//! - Serialize automation results as JSON
//! - Map a timed-out dispatch to 408 Request Timeout
//!
//! # Design Decisions
//! - Every dispatch outcome has a JSON body, including timeouts
//! - Non-zero exit codes are not HTTP errors; callers read `exit_code`

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::dispatch::DispatchOutcome;

impl IntoResponse for DispatchOutcome {
    fn into_response(self) -> Response {
        let status = if self.is_timeout() {
            StatusCode::REQUEST_TIMEOUT
        } else {
            StatusCode::OK
        };
        (status, Json(self.into_result())).into_response()
    }
}
