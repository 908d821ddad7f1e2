//! Reconciler tuning.

use serde::{Deserialize, Serialize};

use crate::region::{RegionRefresh, DEFAULT_REFRESH_INTERVAL_MS};

/// What to do with a fix no rule could classify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownPolicy {
    /// Assume WGS-84 and shift it, unless the host already offset it.
    #[default]
    ForwardTransform,
    /// Leave the fix alone.
    PassThrough,
}

impl UnknownPolicy {
    pub fn name(&self) -> &'static str {
        match self {
            UnknownPolicy::ForwardTransform => "forward_transform",
            UnknownPolicy::PassThrough => "pass_through",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "forward_transform" | "forward" | "transform" => Some(UnknownPolicy::ForwardTransform),
            "pass_through" | "passthrough" => Some(UnknownPolicy::PassThrough),
            _ => None,
        }
    }
}

/// Tolerances, lifetimes and policies of a [`Reconciler`](super::Reconciler).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcilerConfig {
    /// Two fixes closer than this are the same place (meters).
    pub distance_tolerance_m: f32,
    /// Allowed gap between implied and reported speed (m/s).
    pub speed_tolerance_mps: f32,
    /// Allowed gap between implied and reported bearing (degrees).
    pub bearing_tolerance_deg: f32,
    /// A fix this much older than the last GCJ-02 record is stale.
    pub stale_fix_ms: u64,
    /// Without a last record, a fix this much older than now is stale.
    pub fix_expiry_ms: u64,
    /// Lifetime of the last GCJ-02 record.
    pub last_gcj02_expiry_ms: u64,
    /// Lifetime of the latest WGS-84/GCJ-02 calibration pair.
    pub pure_expiry_ms: u64,
    /// How close in time the last record must be to stand in for a fix.
    pub cache_fallback_ms: u64,
    pub unknown_policy: UnknownPolicy,
    /// Capacity of the set of coordinates known to be GCJ-02.
    pub fingerprint_capacity: u64,
    pub region_refresh_interval_ms: u64,
    pub region_refresh: RegionRefresh,
    /// Movement above this without matching speed is logged as drift.
    pub drift_warn_m: f32,
    /// Movement above this is logged at error level.
    pub drift_alert_m: f32,
    /// Jumps above this from the last record are checked for double shifts.
    pub jump_tolerance_m: f32,
    /// Screen ambiguous fixes for host offsets and unreliable fused sources.
    pub check_ambiguous_reliability: bool,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            distance_tolerance_m: 20.0,
            speed_tolerance_mps: 10.0,
            bearing_tolerance_deg: 5.0,
            stale_fix_ms: 60_000,
            fix_expiry_ms: 5 * 60_000,
            last_gcj02_expiry_ms: 2 * 60_000,
            pure_expiry_ms: 2 * 60_000,
            cache_fallback_ms: 60_000,
            unknown_policy: UnknownPolicy::ForwardTransform,
            fingerprint_capacity: 200,
            region_refresh_interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
            region_refresh: RegionRefresh::Background,
            drift_warn_m: 100.0,
            drift_alert_m: 200.0,
            jump_tolerance_m: 200.0,
            check_ambiguous_reliability: true,
        }
    }
}

impl ReconcilerConfig {
    /// Settings for deterministic replays: every region check runs inline.
    pub fn deterministic() -> Self {
        Self {
            region_refresh: RegionRefresh::Inline,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = ReconcilerConfig::default();
        assert_eq!(c.distance_tolerance_m, 20.0);
        assert_eq!(c.speed_tolerance_mps, 10.0);
        assert_eq!(c.bearing_tolerance_deg, 5.0);
        assert_eq!(c.fix_expiry_ms, 300_000);
        assert_eq!(c.fingerprint_capacity, 200);
        assert_eq!(c.region_refresh_interval_ms, 600_000);
        assert_eq!(c.unknown_policy, UnknownPolicy::ForwardTransform);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let c: ReconcilerConfig =
            serde_json::from_str(r#"{"unknown_policy":"pass_through","stale_fix_ms":1000}"#)
                .unwrap();
        assert_eq!(c.unknown_policy, UnknownPolicy::PassThrough);
        assert_eq!(c.stale_fix_ms, 1000);
        assert_eq!(c.drift_alert_m, 200.0);
    }

    #[test]
    fn test_policy_names() {
        assert_eq!(UnknownPolicy::from_name("pass-through"), Some(UnknownPolicy::PassThrough));
        assert_eq!(
            UnknownPolicy::from_name(UnknownPolicy::ForwardTransform.name()),
            Some(UnknownPolicy::ForwardTransform)
        );
        assert_eq!(UnknownPolicy::from_name("drop"), None);
    }
}
