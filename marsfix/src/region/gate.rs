//! Cached region membership with periodic background refresh.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Default interval between region re-checks (10 minutes).
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 10 * 60 * 1000;

/// How a stale region result is recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionRefresh {
    /// Recompute off the fix path; the current fix uses the cached result.
    #[default]
    Background,
    /// Recompute on the fix path. Deterministic, used for replays.
    Inline,
}

impl RegionRefresh {
    pub fn name(&self) -> &'static str {
        match self {
            RegionRefresh::Background => "background",
            RegionRefresh::Inline => "inline",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "background" => Some(RegionRefresh::Background),
            "inline" => Some(RegionRefresh::Inline),
            _ => None,
        }
    }
}

/// Last computed region membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegionStatus {
    /// Whether the last checked position was inside the region.
    pub bounded: bool,
    /// Wall-clock time of the last completed check, if any.
    pub checked_at_ms: Option<u64>,
}

impl RegionStatus {
    /// True before the first check has completed.
    pub fn is_unknown(&self) -> bool {
        self.checked_at_ms.is_none()
    }

    /// True when the cached result is older than `interval_ms`.
    pub fn needs_refresh(&self, now_ms: u64, interval_ms: u64) -> bool {
        match self.checked_at_ms {
            None => true,
            Some(at) => now_ms.saturating_sub(at) >= interval_ms,
        }
    }

    pub fn record(&mut self, bounded: bool, now_ms: u64) {
        self.bounded = bounded;
        self.checked_at_ms = Some(now_ms);
    }
}

/// Runs `job` off the calling thread.
///
/// Inside a tokio runtime the job goes to the blocking pool; otherwise a
/// short-lived named thread is started. Returns false when nothing could be
/// spawned, in which case the job has been dropped.
pub fn spawn_refresh<F>(job: F) -> bool
where
    F: FnOnce() + Send + 'static,
{
    if let Ok(handle) = tokio::runtime::Handle::try_current() {
        debug!("Region refresh scheduled on tokio blocking pool");
        handle.spawn_blocking(job);
        return true;
    }

    match std::thread::Builder::new()
        .name("marsfix-region".to_string())
        .spawn(job)
    {
        Ok(_) => {
            debug!("Region refresh scheduled on dedicated thread");
            true
        }
        Err(e) => {
            warn!(error = %e, "Failed to spawn region refresh thread");
            false
        }
    }
}
