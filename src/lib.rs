//! Automation helper library.

pub mod clock;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod reload;
pub mod resilience;
pub mod staleness;

pub use config::schema::HelperConfig;
pub use dispatch::{AutomationExitCode, AutomationRequest, AutomationResult, Dispatcher};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
