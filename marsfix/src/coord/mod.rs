//! Coordinate module
//!
//! Provides the rounded [`Coordinate`] value type, datum transforms between
//! WGS-84, GCJ-02 and BD-09, and the great-circle helpers used to compare
//! fixes.

mod geodesy;
mod transform;
mod types;

pub use geodesy::{bearing, bearing_delta, haversine_distance, normalize_bearing, EARTH_RADIUS_M};
pub use transform::{
    bd09_decrypt, bd09_encrypt, bd09_to_gcj02, bd09_to_wgs84, gcj02_decrypt, gcj02_encrypt,
    gcj02_to_bd09, gcj02_to_wgs84, out_of_china, wgs84_to_bd09, wgs84_to_gcj02,
};
pub use types::{
    round_degrees, CoordError, Coordinate, COORD_DECIMALS, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON,
};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A geodetic datum understood by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Datum {
    /// GPS native datum.
    Wgs84,
    /// Chinese obfuscated datum ("Mars coordinates").
    Gcj02,
    /// Baidu's datum, layered on GCJ-02.
    Bd09,
}

impl Datum {
    /// Converts `coord` from `from` to `to`.
    ///
    /// Conversions out of GCJ-02 or BD-09 towards WGS-84 use the first-order
    /// inverse and carry its few-meter error.
    pub fn convert(coord: &Coordinate, from: Datum, to: Datum) -> Coordinate {
        match (from, to) {
            (a, b) if a == b => *coord,
            (Datum::Wgs84, Datum::Gcj02) => wgs84_to_gcj02(coord),
            (Datum::Wgs84, Datum::Bd09) => wgs84_to_bd09(coord),
            (Datum::Gcj02, Datum::Wgs84) => gcj02_to_wgs84(coord),
            (Datum::Gcj02, Datum::Bd09) => gcj02_to_bd09(coord),
            (Datum::Bd09, Datum::Gcj02) => bd09_to_gcj02(coord),
            (Datum::Bd09, Datum::Wgs84) => bd09_to_wgs84(coord),
            _ => *coord,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Datum::Wgs84 => "wgs84",
            Datum::Gcj02 => "gcj02",
            Datum::Bd09 => "bd09",
        }
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Datum {
    type Err = CoordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "wgs84" => Ok(Datum::Wgs84),
            "gcj02" => Ok(Datum::Gcj02),
            "bd09" => Ok(Datum::Bd09),
            _ => Err(CoordError::Parse(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_same_datum_is_identity() {
        let c = Coordinate::new(31.2304, 121.4737);
        for d in [Datum::Wgs84, Datum::Gcj02, Datum::Bd09] {
            assert_eq!(Datum::convert(&c, d, d), c);
        }
    }

    #[test]
    fn test_convert_matches_named_functions() {
        let c = Coordinate::new(31.2304, 121.4737);
        assert_eq!(Datum::convert(&c, Datum::Wgs84, Datum::Gcj02), wgs84_to_gcj02(&c));
        assert_eq!(Datum::convert(&c, Datum::Bd09, Datum::Wgs84), bd09_to_wgs84(&c));
    }

    #[test]
    fn test_datum_parse() {
        assert_eq!("WGS-84".parse::<Datum>().unwrap(), Datum::Wgs84);
        assert_eq!("gcj02".parse::<Datum>().unwrap(), Datum::Gcj02);
        assert_eq!("bd_09".parse::<Datum>().unwrap(), Datum::Bd09);
        assert!("utm".parse::<Datum>().is_err());
    }
}
