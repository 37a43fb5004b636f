//! Timeout negotiation.
//!
//! # Responsibilities
//! - Derive each request's deadline from the client's `Keep-Alive` hint
//! - Cap every deadline at the configured ceiling
//!
//! # Design Decisions
//! - Malformed or absent hints fall back to the ceiling, never to "no timeout"
//! - The hint is a `timeout=<seconds>` parameter anywhere in the header value

use std::time::Duration;

/// Ceiling used when the configuration does not set one.
pub const MAX_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Effective timeout for a request carrying `hint` (a `Keep-Alive` value).
pub fn effective_timeout(hint: Option<&str>, ceiling: Duration) -> Duration {
    match hint.and_then(parse_timeout_hint) {
        Some(secs) => Duration::from_secs(secs).min(ceiling),
        None => ceiling,
    }
}

/// Extract `<seconds>` from `timeout=<seconds>[, other=params]`.
pub fn parse_timeout_hint(value: &str) -> Option<u64> {
    value.split(',').find_map(|param| {
        let (key, secs) = param.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("timeout") {
            return None;
        }
        let secs = secs.trim();
        if secs.is_empty() || !secs.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        // Anything too long for u64 is far above any ceiling.
        Some(secs.parse().unwrap_or(u64::MAX))
    })
}
