//! Configuration validation.
//!
//! Serde handles the syntactic side; this module checks value ranges and
//! addresses. All problems are reported at once, not just the first.

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::HelperConfig;
use crate::observability::logging::parse_level_str;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address {0:?} is not a socket address")]
    InvalidBindAddress(String),
    #[error("listener.max_body_size must be greater than zero")]
    ZeroBodyLimit,
    #[error("site.root must not be empty")]
    EmptySiteRoot,
    #[error("timeouts.max_request_secs must be greater than zero")]
    ZeroRequestTimeout,
    #[error("watch.retry_interval_secs must be greater than zero")]
    ZeroRetryInterval,
    #[error("observability.log_level {0:?} is not a known level")]
    UnknownLogLevel(String),
    #[error("observability.metrics_address {0:?} is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &HelperConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }
    if config.listener.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }
    if config.site.root.as_os_str().is_empty() {
        errors.push(ValidationError::EmptySiteRoot);
    }
    if config.timeouts.max_request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }
    if config.watch.retry_interval_secs == 0 {
        errors.push(ValidationError::ZeroRetryInterval);
    }
    if parse_level_str(&config.observability.log_level).is_none() {
        errors.push(ValidationError::UnknownLogLevel(
            config.observability.log_level.clone(),
        ));
    }
    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
