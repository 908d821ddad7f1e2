//! Movement notes written whenever the last GCJ-02 record changes.

use tracing::{debug, error, warn};

use crate::location::LatLngRecord;

use super::ReconcilerConfig;

/// How the position moved between two consecutive GCJ-02 records.
#[derive(Debug, Clone, PartialEq)]
pub struct MovementNote {
    pub distance_m: f32,
    /// Speed implied by the move, when both records carry times.
    pub implied_speed_mps: Option<f32>,
    /// Compass direction of the move, e.g. "NE".
    pub heading: String,
    /// The jump is too large for the speed the fix reported.
    pub drifting: bool,
    /// A drifting jump beyond the alert distance.
    pub alert: bool,
}

fn heading(prev: &LatLngRecord, curr: &LatLngRecord) -> String {
    let mut h = String::with_capacity(2);
    if curr.coordinate.latitude > prev.coordinate.latitude {
        h.push('N');
    } else if curr.coordinate.latitude < prev.coordinate.latitude {
        h.push('S');
    }
    if curr.coordinate.longitude > prev.coordinate.longitude {
        h.push('E');
    } else if curr.coordinate.longitude < prev.coordinate.longitude {
        h.push('W');
    }
    h
}

/// Farthest the reported speed could have carried the fix since `prev`.
fn reachable_m(prev: &LatLngRecord, curr: &LatLngRecord, tolerance_m: f32) -> Option<f32> {
    let speed = curr.motion?.speed_mps;
    let (t0, t1) = (prev.times?, curr.times?);
    let secs = t1.elapsed_realtime_ns.abs_diff(t0.elapsed_realtime_ns) as f32 / 1e9;
    Some(speed * secs + tolerance_m)
}

impl MovementNote {
    pub fn between(prev: &LatLngRecord, curr: &LatLngRecord, config: &ReconcilerConfig) -> Self {
        let distance_m = prev.distance_to(&curr.coordinate);
        let explained = reachable_m(prev, curr, config.distance_tolerance_m)
            .is_some_and(|reach| distance_m <= reach);
        let drifting = distance_m > config.drift_warn_m && !explained;
        Self {
            distance_m,
            implied_speed_mps: curr.speed_mps_from(prev),
            heading: heading(prev, curr),
            drifting,
            alert: drifting && distance_m > config.drift_alert_m,
        }
    }

    /// Logs the note at a level matching its severity.
    pub fn log(&self, prev: &LatLngRecord, curr: &LatLngRecord, source: &str) {
        if self.alert {
            error!(
                from = %prev.coordinate,
                to = %curr.coordinate,
                distance_m = self.distance_m,
                implied_speed_mps = ?self.implied_speed_mps,
                heading = %self.heading,
                source,
                "Position drifting"
            );
        } else if self.drifting {
            warn!(
                from = %prev.coordinate,
                to = %curr.coordinate,
                distance_m = self.distance_m,
                implied_speed_mps = ?self.implied_speed_mps,
                heading = %self.heading,
                source,
                "Position drifting"
            );
        } else {
            debug!(
                from = %prev.coordinate,
                to = %curr.coordinate,
                distance_m = self.distance_m,
                implied_speed_mps = ?self.implied_speed_mps,
                source,
                "Position moved"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::Coordinate;

    const SEC_NS: u64 = 1_000_000_000;

    fn rec(lat: f64, lon: f64, secs: u64) -> LatLngRecord {
        LatLngRecord::new(Coordinate::new(lat, lon)).with_times(secs * 1000, secs * SEC_NS)
    }

    #[test]
    fn test_small_move_is_not_drift() {
        let config = ReconcilerConfig::default();
        let note = MovementNote::between(&rec(30.0, 120.0, 0), &rec(30.0005, 120.0, 10), &config);
        assert!(note.distance_m < 100.0);
        assert!(!note.drifting);
        assert_eq!(note.heading, "N");
        assert!(note.implied_speed_mps.is_some());
    }

    #[test]
    fn test_large_unexplained_jump_alerts() {
        let config = ReconcilerConfig::default();
        // ~550 m south-west in 10 s with no reported speed.
        let note = MovementNote::between(&rec(30.0, 120.0, 0), &rec(29.996, 119.996, 10), &config);
        assert!(note.drifting);
        assert!(note.alert);
        assert_eq!(note.heading, "SW");
    }

    #[test]
    fn test_reported_speed_explains_jump() {
        let config = ReconcilerConfig::default();
        // ~333 m in 10 s at a reported 40 m/s.
        let curr = rec(30.003, 120.0, 10).with_motion(40.0, 0.0);
        let note = MovementNote::between(&rec(30.0, 120.0, 0), &curr, &config);
        assert!(note.distance_m > 300.0);
        assert!(!note.drifting);
        assert!(!note.alert);
    }

    #[test]
    fn test_medium_jump_warns_without_alert() {
        let config = ReconcilerConfig::default();
        // ~150 m with no times on the previous record.
        let prev = LatLngRecord::new(Coordinate::new(30.0, 120.0));
        let note = MovementNote::between(&prev, &rec(30.00135, 120.0, 10), &config);
        assert!(note.drifting);
        assert!(!note.alert);
        assert_eq!(note.implied_speed_mps, None);
    }
}
