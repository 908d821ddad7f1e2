//! Datum transforms between WGS-84, GCJ-02 and BD-09.
//!
//! GCJ-02 is WGS-84 plus a deterministic, position-dependent offset defined
//! on the Krasovsky ellipsoid. The inverse used here is first-order: the
//! forward offset computed at the offset point is subtracted, which leaves a
//! residual error of a few meters inside China.

use std::f64::consts::PI;

use super::Coordinate;

/// Krasovsky 1940 semi-major axis in meters.
const A: f64 = 6_378_245.0;

/// Krasovsky 1940 first eccentricity squared.
const EE: f64 = 0.006_693_421_622_965_943_23;

const CHINA_MIN_LON: f64 = 72.004;
const CHINA_MAX_LON: f64 = 137.8347;
const CHINA_MIN_LAT: f64 = 0.8293;
const CHINA_MAX_LAT: f64 = 55.8271;

/// Returns true when the point lies outside the rectangle in which the
/// GCJ-02 offset is applied.
#[inline]
pub fn out_of_china(lat: f64, lon: f64) -> bool {
    !(CHINA_MIN_LON..=CHINA_MAX_LON).contains(&lon)
        || !(CHINA_MIN_LAT..=CHINA_MAX_LAT).contains(&lat)
}

fn transform_lat(x: f64, y: f64) -> f64 {
    let mut ret = -100.0 + 2.0 * x + 3.0 * y + 0.2 * y * y + 0.1 * x * y + 0.2 * x.abs().sqrt();
    ret += (20.0 * (6.0 * x * PI).sin() + 20.0 * (2.0 * x * PI).sin()) * 2.0 / 3.0;
    ret += (20.0 * (y * PI).sin() + 40.0 * (y / 3.0 * PI).sin()) * 2.0 / 3.0;
    ret += (160.0 * (y / 12.0 * PI).sin() + 320.0 * (y * PI / 30.0).sin()) * 2.0 / 3.0;
    ret
}

fn transform_lon(x: f64, y: f64) -> f64 {
    let mut ret = 300.0 + x + 2.0 * y + 0.1 * x * x + 0.1 * x * y + 0.1 * x.abs().sqrt();
    ret += (20.0 * (6.0 * x * PI).sin() + 20.0 * (2.0 * x * PI).sin()) * 2.0 / 3.0;
    ret += (20.0 * (x * PI).sin() + 40.0 * (x / 3.0 * PI).sin()) * 2.0 / 3.0;
    ret += (150.0 * (x / 12.0 * PI).sin() + 300.0 * (x / 30.0 * PI).sin()) * 2.0 / 3.0;
    ret
}

/// Computes the GCJ-02 offset (dlat, dlon) in degrees at a WGS-84 point.
fn offset(lat: f64, lon: f64) -> (f64, f64) {
    let mut dlat = transform_lat(lon - 105.0, lat - 35.0);
    let mut dlon = transform_lon(lon - 105.0, lat - 35.0);
    let rad_lat = lat / 180.0 * PI;
    let magic = 1.0 - EE * rad_lat.sin() * rad_lat.sin();
    let sqrt_magic = magic.sqrt();
    dlat = (dlat * 180.0) / ((A * (1.0 - EE)) / (magic * sqrt_magic) * PI);
    dlon = (dlon * 180.0) / (A / sqrt_magic * rad_lat.cos() * PI);
    (dlat, dlon)
}

/// WGS-84 to GCJ-02. Identity outside China.
pub fn gcj02_encrypt(lat: f64, lon: f64) -> (f64, f64) {
    if out_of_china(lat, lon) {
        return (lat, lon);
    }
    let (dlat, dlon) = offset(lat, lon);
    (lat + dlat, lon + dlon)
}

/// GCJ-02 to WGS-84, first-order. Identity outside China.
pub fn gcj02_decrypt(lat: f64, lon: f64) -> (f64, f64) {
    if out_of_china(lat, lon) {
        return (lat, lon);
    }
    let (enc_lat, enc_lon) = gcj02_encrypt(lat, lon);
    (lat * 2.0 - enc_lat, lon * 2.0 - enc_lon)
}

/// GCJ-02 to BD-09.
pub fn bd09_encrypt(lat: f64, lon: f64) -> (f64, f64) {
    let z = (lon * lon + lat * lat).sqrt() + 0.000_02 * (lat * PI).sin();
    let theta = lat.atan2(lon) + 0.000_003 * (lon * PI).cos();
    (z * theta.sin() + 0.006, z * theta.cos() + 0.0065)
}

/// BD-09 to GCJ-02.
pub fn bd09_decrypt(lat: f64, lon: f64) -> (f64, f64) {
    let x = lon - 0.0065;
    let y = lat - 0.006;
    let z = (x * x + y * y).sqrt() - 0.000_02 * (y * PI).sin();
    let theta = y.atan2(x) - 0.000_003 * (x * PI).cos();
    (z * theta.sin(), z * theta.cos())
}

fn apply(coord: &Coordinate, f: fn(f64, f64) -> (f64, f64)) -> Coordinate {
    let (lat, lon) = f(coord.latitude, coord.longitude);
    Coordinate::new(lat, lon)
}

pub fn wgs84_to_gcj02(coord: &Coordinate) -> Coordinate {
    apply(coord, gcj02_encrypt)
}

pub fn gcj02_to_wgs84(coord: &Coordinate) -> Coordinate {
    apply(coord, gcj02_decrypt)
}

pub fn gcj02_to_bd09(coord: &Coordinate) -> Coordinate {
    apply(coord, bd09_encrypt)
}

pub fn bd09_to_gcj02(coord: &Coordinate) -> Coordinate {
    apply(coord, bd09_decrypt)
}

pub fn wgs84_to_bd09(coord: &Coordinate) -> Coordinate {
    let (lat, lon) = gcj02_encrypt(coord.latitude, coord.longitude);
    let (lat, lon) = bd09_encrypt(lat, lon);
    Coordinate::new(lat, lon)
}

pub fn bd09_to_wgs84(coord: &Coordinate) -> Coordinate {
    let (lat, lon) = bd09_decrypt(coord.latitude, coord.longitude);
    let (lat, lon) = gcj02_decrypt(lat, lon);
    Coordinate::new(lat, lon)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::haversine_distance;

    #[test]
    fn test_out_of_china_box() {
        assert!(!out_of_china(31.2304, 121.4737));
        assert!(out_of_china(40.7128, -74.0060));
        assert!(out_of_china(0.5, 100.0));
        assert!(out_of_china(30.0, 140.0));
        // Box edges are inclusive.
        assert!(!out_of_china(0.8293, 72.004));
        assert!(!out_of_china(55.8271, 137.8347));
    }

    #[test]
    fn test_encrypt_shanghai() {
        let (lat, lon) = gcj02_encrypt(31.2304, 121.4737);
        assert!((lat - 31.228_457_7).abs() < 1e-6, "lat {lat}");
        assert!((lon - 121.478_223_1).abs() < 1e-6, "lon {lon}");
    }

    #[test]
    fn test_identity_outside_china() {
        assert_eq!(gcj02_encrypt(40.7128, -74.0060), (40.7128, -74.0060));
        assert_eq!(gcj02_decrypt(51.5074, -0.1278), (51.5074, -0.1278));
    }

    #[test]
    fn test_decrypt_roundtrip_error_is_small() {
        for (lat, lon) in [(31.2304, 121.4737), (39.9042, 116.4074), (22.5431, 114.0579)] {
            let wgs = Coordinate::new(lat, lon);
            let back = gcj02_to_wgs84(&wgs84_to_gcj02(&wgs));
            let err = haversine_distance(&wgs, &back);
            assert!(err < 5.0, "round trip error {err} m at {wgs}");
        }
    }

    #[test]
    fn test_bd09_roundtrip() {
        let gcj = Coordinate::new(31.2284577, 121.4782231);
        let bd = gcj02_to_bd09(&gcj);
        let offset = haversine_distance(&gcj, &bd);
        assert!(offset > 500.0 && offset < 1500.0, "bd offset {offset}");
        let back = bd09_to_gcj02(&bd);
        assert!(haversine_distance(&gcj, &back) < 0.5);
    }

    #[test]
    fn test_wgs84_bd09_composition() {
        let wgs = Coordinate::new(39.9042, 116.4074);
        let bd = wgs84_to_bd09(&wgs);
        assert_eq!(bd, gcj02_to_bd09(&wgs84_to_gcj02(&wgs)));
        let back = bd09_to_wgs84(&bd);
        assert!(haversine_distance(&wgs, &back) < 5.0);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_roundtrip_within_five_meters(
                lat in 18.0..50.0_f64,
                lon in 75.0..130.0_f64
            ) {
                let wgs = Coordinate::new(lat, lon);
                let back = gcj02_to_wgs84(&wgs84_to_gcj02(&wgs));
                let err = haversine_distance(&wgs, &back);
                prop_assert!(err <= 5.0, "round trip error {} m at {}", err, wgs);
            }

            #[test]
            fn test_identity_outside_box(
                lat in -80.0..80.0_f64,
                lon in -180.0..70.0_f64
            ) {
                prop_assert_eq!(gcj02_encrypt(lat, lon), (lat, lon));
                prop_assert_eq!(gcj02_decrypt(lat, lon), (lat, lon));
            }
        }
    }
}
