//! Configuration schema definitions.
//!
//! This module defines the service configuration of the automation helper.
//! All types derive Serde traits for deserialization from config files.
//! This is the helper's own configuration, not the monitoring configuration
//! the automations operate on (see `crate::reload::snapshot`).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration for the automation helper.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct HelperConfig {
    /// Listener configuration (bind address, body limit).
    pub listener: ListenerConfig,

    /// Site whose configuration files are watched and loaded.
    pub site: SiteConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Filesystem watch settings.
    pub watch: WatchConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:8765").
    pub bind_address: String,

    /// Maximum accepted request body in bytes (automation stdin can be large).
    pub max_body_size: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8765".to_string(),
            max_body_size: 64 * 1024 * 1024,
        }
    }
}

/// Site layout.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Site root directory; every watch schedule is derived from it.
    pub root: PathBuf,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Hard ceiling for a single automation request in seconds.
    /// Client hints are honoured only up to this value.
    pub max_request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            max_request_secs: 60,
        }
    }
}

/// Filesystem watch configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WatchConfig {
    /// How often schedules whose directory is missing are retried, in seconds.
    pub retry_interval_secs: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            retry_interval_secs: 5,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Baseline log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9464".to_string(),
        }
    }
}
