//! Time sources for the engine.
//!
//! The engine reads two clocks, like the platforms it serves: wall-clock
//! milliseconds since the Unix epoch and a monotonic "elapsed realtime" in
//! nanoseconds. [`ManualClock`] lets tests and replays drive both.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::Instant;

/// A pair of wall-clock and monotonic time readings.
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;

    /// Monotonic nanoseconds since an arbitrary, fixed origin.
    fn elapsed_realtime_ns(&self) -> u64;
}

/// The real clocks of the running process.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

fn process_start() -> &'static Instant {
    static START: OnceLock<Instant> = OnceLock::new();
    START.get_or_init(Instant::now)
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
    }

    fn elapsed_realtime_ns(&self) -> u64 {
        u64::try_from(process_start().elapsed().as_nanos()).unwrap_or(u64::MAX)
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicU64,
    elapsed_ns: AtomicU64,
}

impl ManualClock {
    pub fn new(now_ms: u64, elapsed_realtime_ns: u64) -> Self {
        Self {
            now_ms: AtomicU64::new(now_ms),
            elapsed_ns: AtomicU64::new(elapsed_realtime_ns),
        }
    }

    pub fn set(&self, now_ms: u64, elapsed_realtime_ns: u64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
        self.elapsed_ns.store(elapsed_realtime_ns, Ordering::SeqCst);
    }

    /// Moves both clocks forward by `ms`.
    pub fn advance_ms(&self, ms: u64) {
        self.now_ms.fetch_add(ms, Ordering::SeqCst);
        self.elapsed_ns.fetch_add(ms * 1_000_000, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }

    fn elapsed_realtime_ns(&self) -> u64 {
        self.elapsed_ns.load(Ordering::SeqCst)
    }
}
