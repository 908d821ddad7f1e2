//! Rounded coordinate records with optional timing and motion.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::coord::{bearing, haversine_distance, Coordinate};

use super::LocationFix;

const NANOS_PER_MILLI: u64 = 1_000_000;
const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Wall-clock and monotonic timestamps of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordTimes {
    pub time_ms: u64,
    pub elapsed_realtime_ns: u64,
}

/// Reported speed and bearing, present only as a pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    pub speed_mps: f32,
    pub bearing_deg: f32,
}

/// A coordinate remembered by the engine.
///
/// Equality and hashing consider only the rounded coordinate.
#[derive(Debug, Clone, Copy)]
pub struct LatLngRecord {
    pub coordinate: Coordinate,
    pub times: Option<RecordTimes>,
    pub motion: Option<Motion>,
}

impl LatLngRecord {
    pub fn new(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            times: None,
            motion: None,
        }
    }

    /// Builds a record at `coordinate` carrying the fix's times and motion.
    /// An untimed fix yields a record without times.
    pub fn from_fix(fix: &LocationFix, coordinate: Coordinate) -> Self {
        let mut record = Self::new(coordinate);
        if fix.has_times() {
            record = record.with_times(fix.time_ms, fix.elapsed_realtime_ns);
        }
        if let (Some(speed), Some(bearing)) = (fix.speed_mps, fix.bearing_deg) {
            record = record.with_motion(speed, bearing);
        }
        record
    }

    pub fn with_times(mut self, time_ms: u64, elapsed_realtime_ns: u64) -> Self {
        self.times = Some(RecordTimes {
            time_ms,
            elapsed_realtime_ns,
        });
        self
    }

    pub fn with_motion(mut self, speed_mps: f32, bearing_deg: f32) -> Self {
        self.motion = Some(Motion {
            speed_mps,
            bearing_deg,
        });
        self
    }

    /// Same timing and motion, different coordinate.
    pub fn moved_to(&self, coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            ..*self
        }
    }

    pub fn has_times(&self) -> bool {
        self.times.is_some()
    }

    pub fn has_motion(&self) -> bool {
        self.motion.is_some()
    }

    /// True when the record has no times, or either clock says it is older
    /// than `threshold_ms`. Timestamps in the future never expire a record.
    pub fn is_expired(&self, threshold_ms: u64, now_ms: u64, now_elapsed_ns: u64) -> bool {
        let Some(times) = self.times else {
            return true;
        };
        let wall_expired = times.time_ms < now_ms && now_ms - times.time_ms > threshold_ms;
        let mono_expired = times.elapsed_realtime_ns < now_elapsed_ns
            && (now_elapsed_ns - times.elapsed_realtime_ns) / NANOS_PER_MILLI > threshold_ms;
        wall_expired || mono_expired
    }

    pub fn distance_to(&self, other: &Coordinate) -> f32 {
        haversine_distance(&self.coordinate, other)
    }

    pub fn is_near(&self, other: &Coordinate, tolerance_m: f32) -> bool {
        self.distance_to(other) <= tolerance_m
    }

    /// Average speed needed to move from `start` to this record.
    ///
    /// `None` unless both records carry times at least one whole second
    /// apart on the monotonic clock.
    pub fn speed_mps_from(&self, start: &LatLngRecord) -> Option<f32> {
        let (end_t, start_t) = (self.times?, start.times?);
        let secs = end_t.elapsed_realtime_ns.abs_diff(start_t.elapsed_realtime_ns) / NANOS_PER_SEC;
        if secs == 0 {
            return None;
        }
        Some(self.distance_to(&start.coordinate) / secs as f32)
    }

    /// Bearing from this record to `coord`, in [0, 360).
    pub fn bearing_to(&self, coord: &Coordinate) -> f32 {
        bearing(&self.coordinate, coord)
    }
}

impl PartialEq for LatLngRecord {
    fn eq(&self, other: &Self) -> bool {
        self.coordinate == other.coordinate
    }
}

impl Eq for LatLngRecord {}

impl Hash for LatLngRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.coordinate.fingerprint().hash(state);
    }
}

impl fmt::Display for LatLngRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.coordinate)?;
        if let Some(m) = self.motion {
            write!(f, " speed={}m/s bearing={}deg", m.speed_mps, m.bearing_deg)?;
        }
        Ok(())
    }
}
