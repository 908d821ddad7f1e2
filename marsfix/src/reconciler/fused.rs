//! Disambiguation of fixes whose datum cannot be read off the provider.
//!
//! A fused or passive fix may be raw WGS-84, already GCJ-02, or shifted
//! twice. It is compared against a calibration pair: a WGS-84 position and
//! the GCJ-02 position it maps to, both observed shortly before. Whichever
//! member the fix continues more plausibly decides its datum.

use tracing::debug;

use crate::coord::{bearing_delta, gcj02_to_wgs84, haversine_distance, wgs84_to_gcj02, Datum};
use crate::location::keys::LOCATION_TYPE_RELIABLE;
use crate::location::{LatLngRecord, LocationFix};

use super::{FusedCriterion, PurePair, ReconcilerConfig};

/// Result of the reliability screen applied before disambiguation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Reliability {
    Reliable,
    /// The host map app already offset the fix.
    FixedUp,
    /// The platform reported a fused source type other than the reliable one.
    UnreliableSource,
    /// A large jump that lands where a second shift of the last record would.
    DoubleShiftJump,
}

/// Screens an ambiguous fix before it is compared to the calibration pair.
pub(crate) fn screen(
    fix: &LocationFix,
    last: Option<&LatLngRecord>,
    config: &ReconcilerConfig,
) -> Reliability {
    if !config.check_ambiguous_reliability {
        return Reliability::Reliable;
    }
    if fix.is_fix_ups() {
        return Reliability::FixedUp;
    }
    if let Some(kind) = fix.location_type() {
        if kind != LOCATION_TYPE_RELIABLE {
            return Reliability::UnreliableSource;
        }
    }
    if let Some(last) = last {
        let jump = last.distance_to(&fix.coordinate);
        if jump > config.jump_tolerance_m {
            let twice = wgs84_to_gcj02(&last.coordinate);
            let to_twice = haversine_distance(&twice, &fix.coordinate);
            if to_twice <= config.distance_tolerance_m {
                return Reliability::DoubleShiftJump;
            }
        }
    }
    Reliability::Reliable
}

/// How well the fix continues one member of the calibration pair.
#[derive(Debug, Clone, Copy)]
struct Fit {
    distance_m: f32,
    /// |implied speed - recorded speed|, when computable.
    speed_delta: Option<f32>,
    /// Deviation of the implied from the recorded bearing, when both
    /// members carry motion.
    bearing_delta: Option<f32>,
}

fn fit(candidate: &LatLngRecord, current: &LatLngRecord) -> Fit {
    let recorded_speed = candidate.motion.map(|m| m.speed_mps).unwrap_or(0.0);
    Fit {
        distance_m: candidate.distance_to(&current.coordinate),
        speed_delta: current
            .speed_mps_from(candidate)
            .map(|implied| (implied - recorded_speed).abs()),
        bearing_delta: candidate
            .motion
            .map(|m| bearing_delta(candidate.bearing_to(&current.coordinate), m.bearing_deg)),
    }
}

/// Picks the single winner of a yes/no test, if there is exactly one.
fn exactly_one(wgs: bool, gcj: bool) -> Option<Datum> {
    match (wgs, gcj) {
        (true, false) => Some(Datum::Wgs84),
        (false, true) => Some(Datum::Gcj02),
        _ => None,
    }
}

/// Decides which member of `pair` the fix continues.
///
/// Criteria run in order (distance, speed, bearing) and the first one that
/// singles out a member wins. `None` means the fix fits neither or both.
pub(crate) fn disambiguate(
    fix: &LocationFix,
    pair: &PurePair,
    config: &ReconcilerConfig,
) -> Option<(Datum, FusedCriterion)> {
    let current = LatLngRecord::from_fix(fix, fix.coordinate);
    let wgs = fit(&pair.wgs84, &current);
    let gcj = fit(&pair.gcj02, &current);
    debug!(
        wgs_distance_m = wgs.distance_m,
        gcj_distance_m = gcj.distance_m,
        wgs_speed_delta = ?wgs.speed_delta,
        gcj_speed_delta = ?gcj.speed_delta,
        wgs_bearing_delta = ?wgs.bearing_delta,
        gcj_bearing_delta = ?gcj.bearing_delta,
        "Comparing ambiguous fix to calibration pair"
    );

    let near = |f: &Fit| f.distance_m <= config.distance_tolerance_m;
    if let Some(datum) = exactly_one(near(&wgs), near(&gcj)) {
        return Some((datum, FusedCriterion::Distance));
    }

    if let (Some(ws), Some(gs)) = (wgs.speed_delta, gcj.speed_delta) {
        let tol = config.speed_tolerance_mps;
        if let Some(datum) = exactly_one(ws <= tol, gs <= tol) {
            return Some((datum, FusedCriterion::Speed));
        }
    }

    let (Some(wb), Some(gb)) = (wgs.bearing_delta, gcj.bearing_delta) else {
        return None;
    };
    let score = |bearing: f32, speed: Option<f32>| {
        bearing / config.bearing_tolerance_deg + speed.unwrap_or(0.0) / config.speed_tolerance_mps
    };
    let within = |bearing: f32, speed: Option<f32>| {
        bearing <= config.bearing_tolerance_deg
            && speed.map_or(true, |s| s <= config.speed_tolerance_mps)
    };
    let (ws, gs) = (score(wb, wgs.speed_delta), score(gb, gcj.speed_delta));
    if ws < gs && within(wb, wgs.speed_delta) {
        Some((Datum::Wgs84, FusedCriterion::Bearing))
    } else if gs < ws && within(gb, gcj.speed_delta) {
        Some((Datum::Gcj02, FusedCriterion::Bearing))
    } else {
        None
    }
}

/// A calibration pair built from a trusted GCJ-02 record alone.
pub(crate) fn synthesize_pair(gcj02: &LatLngRecord) -> PurePair {
    let wgs = gcj02.moved_to(gcj02_to_wgs84(&gcj02.coordinate));
    PurePair::new(wgs, *gcj02)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::Coordinate;
    use crate::location::{keys, ProviderKind};

    const SEC_NS: u64 = 1_000_000_000;
    // ~10 m of latitude.
    const TEN_M: f64 = 0.0000899;

    fn rec(lat: f64, lon: f64, secs: u64) -> LatLngRecord {
        LatLngRecord::new(Coordinate::new(lat, lon)).with_times(secs * 1000, secs * SEC_NS)
    }

    fn fused(lat: f64, lon: f64, secs: u64) -> LocationFix {
        LocationFix::new(Coordinate::new(lat, lon), ProviderKind::Fused)
            .with_times(secs * 1000, secs * SEC_NS)
    }

    fn shanghai_pair(secs: u64) -> PurePair {
        let wgs = rec(31.2304, 121.4737, secs);
        let gcj = wgs.moved_to(wgs84_to_gcj02(&wgs.coordinate));
        PurePair::new(wgs, gcj)
    }

    #[test]
    fn test_distance_decides_when_only_one_is_near() {
        let config = ReconcilerConfig::default();
        let pair = shanghai_pair(100);
        let fix = fused(31.2304 + TEN_M / 2.0, 121.4737, 101);
        assert_eq!(
            disambiguate(&fix, &pair, &config),
            Some((Datum::Wgs84, FusedCriterion::Distance))
        );

        let g = pair.gcj02.coordinate;
        let fix = fused(g.latitude, g.longitude, 101);
        assert_eq!(
            disambiguate(&fix, &pair, &config),
            Some((Datum::Gcj02, FusedCriterion::Distance))
        );
    }

    #[test]
    fn test_speed_decides_when_neither_is_near() {
        let config = ReconcilerConfig::default();
        // Moving north at 5 m/s, observed 20 s later (~100 m on).
        let wgs = rec(31.2304, 121.4737, 100).with_motion(5.0, 0.0);
        let gcj = wgs.moved_to(wgs84_to_gcj02(&wgs.coordinate));
        let pair = PurePair::new(wgs, gcj);
        let fix = fused(31.2304 + TEN_M * 10.0, 121.4737, 120);
        assert_eq!(
            disambiguate(&fix, &pair, &config),
            Some((Datum::Wgs84, FusedCriterion::Speed))
        );
    }

    #[test]
    fn test_bearing_breaks_distance_and_speed_tie() {
        let config = ReconcilerConfig::default();
        let f = Coordinate::new(31.2304, 121.4737);
        let wgs = rec(f.latitude + TEN_M, f.longitude, 100).with_motion(1.0, 180.0);
        let gcj = rec(f.latitude - TEN_M, f.longitude, 100).with_motion(1.0, 180.0);
        let pair = PurePair::new(wgs, gcj);
        let fix = fused(f.latitude, f.longitude, 110);
        assert_eq!(
            disambiguate(&fix, &pair, &config),
            Some((Datum::Wgs84, FusedCriterion::Bearing))
        );
    }

    #[test]
    fn test_no_verdict_without_motion_on_tie() {
        let config = ReconcilerConfig::default();
        let f = Coordinate::new(31.2304, 121.4737);
        let pair = PurePair::new(
            rec(f.latitude + TEN_M, f.longitude, 100),
            rec(f.latitude - TEN_M, f.longitude, 100),
        );
        let fix = fused(f.latitude, f.longitude, 110);
        assert_eq!(disambiguate(&fix, &pair, &config), None);
    }

    #[test]
    fn test_screen_flags() {
        let config = ReconcilerConfig::default();
        let fix = fused(31.0, 121.0, 1);
        assert_eq!(screen(&fix, None, &config), Reliability::Reliable);

        let fixed_up = fix.clone().with_flag(keys::IS_FIX_UPS, true);
        assert_eq!(screen(&fixed_up, None, &config), Reliability::FixedUp);

        let typed = fix.clone().with_number(keys::LOCATION_TYPE, 1.0);
        assert_eq!(screen(&typed, None, &config), Reliability::UnreliableSource);
        let typed = fix.clone().with_number(keys::LOCATION_TYPE, 3.0);
        assert_eq!(screen(&typed, None, &config), Reliability::Reliable);

        let lenient = ReconcilerConfig {
            check_ambiguous_reliability: false,
            ..ReconcilerConfig::default()
        };
        assert_eq!(screen(&fixed_up, None, &lenient), Reliability::Reliable);
    }

    #[test]
    fn test_screen_rejects_double_shift_jump() {
        let config = ReconcilerConfig::default();
        let last = shanghai_pair(100).gcj02;
        let twice = wgs84_to_gcj02(&last.coordinate);
        let fix = fused(twice.latitude, twice.longitude, 101);
        assert_eq!(screen(&fix, Some(&last), &config), Reliability::DoubleShiftJump);

        // A large jump elsewhere is just fast movement.
        let far = fused(31.25, 121.50, 101);
        assert_eq!(screen(&far, Some(&last), &config), Reliability::Reliable);
    }

    #[test]
    fn test_synthesized_pair_keeps_times() {
        let gcj = shanghai_pair(100).gcj02.with_motion(3.0, 90.0);
        let pair = synthesize_pair(&gcj);
        assert_eq!(pair.gcj02, gcj);
        assert_eq!(pair.wgs84.times, gcj.times);
        assert_eq!(pair.wgs84.motion, gcj.motion);
        assert!(pair.wgs84.distance_to(&gcj.coordinate) > 400.0);
    }
}
