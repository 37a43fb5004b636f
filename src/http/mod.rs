//! HTTP API subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (loopback)
//!     → server.rs (Axum router, tracing, body limit)
//!     → request.rs (request ID, Keep-Alive timeout hint)
//!     → dispatcher / health reporter
//!     → response.rs (exit code + output as JSON, 408 on timeout)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{keep_alive_hint, MakeRequestUuid, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
