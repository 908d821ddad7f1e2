//! Fixed-position spoofing.
//!
//! Replaces every fix with one configured point. When a random offset is
//! requested it is drawn once, so repeated fixes stay put instead of
//! jittering.

use std::fmt;
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::clock::{Clock, SystemClock};
use crate::coord::Coordinate;
use crate::location::{keys, LocationFix, ProviderKind};

/// Half-width of the random offset in degrees.
pub const RANDOM_OFFSET_DEG: f64 = 0.000_05;

/// Accuracy reported on spoofed fixes, in meters.
pub const SPOOFED_ACCURACY_M: f32 = 10.0;

/// Where to pin fixes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpoofConfig {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub random_offset: bool,
}

/// Rewrites fixes to a fixed point.
pub struct FixedPosition {
    position: Coordinate,
    clock: Arc<dyn Clock>,
}

impl FixedPosition {
    /// Pins fixes to `target`, shifted once by a random offset if asked.
    pub fn new(target: Coordinate, random_offset: bool) -> Self {
        let offset = if random_offset {
            let mut rng = rand::rng();
            (
                rng.random_range(-RANDOM_OFFSET_DEG..RANDOM_OFFSET_DEG),
                rng.random_range(-RANDOM_OFFSET_DEG..RANDOM_OFFSET_DEG),
            )
        } else {
            (0.0, 0.0)
        };
        Self::with_offset(target, offset)
    }

    pub fn from_config(config: &SpoofConfig) -> Self {
        Self::new(
            Coordinate::new(config.latitude, config.longitude),
            config.random_offset,
        )
    }

    /// Pins fixes to `target` shifted by `(dlat, dlon)` degrees.
    pub fn with_offset(target: Coordinate, (dlat, dlon): (f64, f64)) -> Self {
        let position = Coordinate::new(target.latitude + dlat, target.longitude + dlon);
        info!(%position, "Fixed position spoofing enabled");
        Self {
            position,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn position(&self) -> Coordinate {
        self.position
    }

    /// Replaces the coordinate, provider, accuracy and times of `fix`.
    pub fn apply(&self, mut fix: LocationFix) -> LocationFix {
        fix.coordinate = self.position;
        fix.provider = ProviderKind::Gps;
        fix.accuracy_m = Some(SPOOFED_ACCURACY_M);
        fix.time_ms = self.clock.now_ms();
        fix.elapsed_realtime_ns = self.clock.elapsed_realtime_ns();
        fix.metadata.set_flag(keys::IS_FAKE, true);
        fix
    }

    /// A fresh spoofed fix.
    pub fn fix(&self) -> LocationFix {
        self.apply(LocationFix::new(self.position, ProviderKind::Gps))
    }
}

impl fmt::Debug for FixedPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedPosition")
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}
