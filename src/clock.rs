//! Process-wide monotonic timestamps.
//!
//! Every timestamp the service compares (change events, snapshot build times)
//! is a [`Stamp`]: nanoseconds elapsed since a process-wide anchor taken the
//! first time the clock is read. Stamps are immune to wall-clock jumps; the
//! anchor's wall-clock reading is only used when a stamp has to leave the
//! process (health check).

use std::sync::OnceLock;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

static ANCHOR: OnceLock<(Instant, SystemTime)> = OnceLock::new();

fn anchor() -> &'static (Instant, SystemTime) {
    ANCHOR.get_or_init(|| (Instant::now(), SystemTime::now()))
}

/// A monotonic point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Stamp(u64);

impl Stamp {
    /// The clock anchor itself. Nothing observed by the process is older.
    pub const ZERO: Stamp = Stamp(0);

    /// Read the clock.
    pub fn now() -> Self {
        let elapsed = anchor().0.elapsed();
        Stamp(u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX))
    }

    pub const fn from_nanos(nanos: u64) -> Self {
        Stamp(nanos)
    }

    pub const fn as_nanos(self) -> u64 {
        self.0
    }

    /// Stamp shifted forward by `delta`, saturating at the end of time.
    pub fn saturating_add(self, delta: Duration) -> Self {
        let delta = u64::try_from(delta.as_nanos()).unwrap_or(u64::MAX);
        Stamp(self.0.saturating_add(delta))
    }

    /// Wall-clock seconds since the Unix epoch corresponding to this stamp.
    pub fn unix_seconds(self) -> f64 {
        let wall = anchor().1 + Duration::from_nanos(self.0);
        wall.duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0)
    }
}
