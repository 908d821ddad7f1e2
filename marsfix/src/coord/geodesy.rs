//! Great-circle distance and bearing helpers.

use super::Coordinate;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine distance between two coordinates, in meters.
pub fn haversine_distance(a: &Coordinate, b: &Coordinate) -> f32 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    (EARTH_RADIUS_M * c) as f32
}

/// Initial bearing from `a` to `b`, in degrees within [0, 360).
pub fn bearing(a: &Coordinate, b: &Coordinate) -> f32 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    normalize_bearing(y.atan2(x).to_degrees() as f32)
}

/// Maps any bearing in (-360, 720) onto [0, 360).
#[inline]
pub fn normalize_bearing(bearing: f32) -> f32 {
    let b = (bearing + 360.0) % 360.0;
    // f32 rounding can land exactly on 360.
    if b >= 360.0 {
        0.0
    } else {
        b
    }
}

/// Smallest angle between two bearings, in degrees within [0, 180].
pub fn bearing_delta(b1: f32, b2: f32) -> f32 {
    let d = (normalize_bearing(b1) - normalize_bearing(b2)).abs();
    if d > 180.0 {
        360.0 - d
    } else {
        d
    }
}
