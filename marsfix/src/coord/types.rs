//! Core coordinate types and constants.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum valid latitude in degrees.
pub const MIN_LAT: f64 = -90.0;

/// Maximum valid latitude in degrees.
pub const MAX_LAT: f64 = 90.0;

/// Minimum valid longitude in degrees.
pub const MIN_LON: f64 = -180.0;

/// Maximum valid longitude in degrees.
pub const MAX_LON: f64 = 180.0;

/// Number of decimal places kept on every coordinate.
pub const COORD_DECIMALS: i32 = 7;

const COORD_SCALE: f64 = 10_000_000.0;

/// Errors that can occur while building coordinates from raw input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    #[error("Invalid latitude: {0} (must be between {MIN_LAT} and {MAX_LAT})")]
    InvalidLatitude(f64),

    #[error("Invalid longitude: {0} (must be between {MIN_LON} and {MAX_LON})")]
    InvalidLongitude(f64),

    #[error("Cannot parse coordinate from '{0}'")]
    Parse(String),
}

/// Rounds a degree value to [`COORD_DECIMALS`] places, ties to even.
#[inline]
pub fn round_degrees(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    (value * COORD_SCALE).round_ties_even() / COORD_SCALE
}

/// A geographic position in decimal degrees.
///
/// Both components are rounded to seven decimal places when the value is
/// built, including when it is deserialized. Out-of-range values are kept
/// as-is so that callers can still observe them; see [`Coordinate::is_valid`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawCoordinate")]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Deserialize)]
struct RawCoordinate {
    latitude: f64,
    longitude: f64,
}

impl From<RawCoordinate> for Coordinate {
    fn from(raw: RawCoordinate) -> Self {
        Coordinate::new(raw.latitude, raw.longitude)
    }
}

impl Coordinate {
    /// Creates a coordinate, rounding both components.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude: round_degrees(latitude),
            longitude: round_degrees(longitude),
        }
    }

    /// Creates a coordinate, rejecting out-of-range components.
    pub fn checked(latitude: f64, longitude: f64) -> Result<Self, CoordError> {
        if !latitude.is_finite() || !(MIN_LAT..=MAX_LAT).contains(&latitude) {
            return Err(CoordError::InvalidLatitude(latitude));
        }
        if !longitude.is_finite() || !(MIN_LON..=MAX_LON).contains(&longitude) {
            return Err(CoordError::InvalidLongitude(longitude));
        }
        Ok(Self::new(latitude, longitude))
    }

    /// Returns true when both components are finite and in range.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (MIN_LAT..=MAX_LAT).contains(&self.latitude)
            && (MIN_LON..=MAX_LON).contains(&self.longitude)
    }

    /// Packs the rounded coordinate into a single integer key.
    ///
    /// Latitude occupies the high 32 bits and longitude the low 32 bits, each
    /// as a seven-decimal fixed-point integer. Valid coordinates fit in an
    /// `i32` (180 * 1e7 < 2^31), so the key is collision-free for them.
    pub fn fingerprint(&self) -> u64 {
        let lat = (self.latitude * COORD_SCALE).round() as i32 as u32;
        let lon = (self.longitude * COORD_SCALE).round() as i32 as u32;
        ((lat as u64) << 32) | lon as u64
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.7},{:.7}", self.latitude, self.longitude)
    }
}

impl FromStr for Coordinate {
    type Err = CoordError;

    /// Parses `"lat,lon"` (whitespace around either part is ignored).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lon) = s
            .split_once(',')
            .ok_or_else(|| CoordError::Parse(s.to_string()))?;
        let lat: f64 = lat
            .trim()
            .parse()
            .map_err(|_| CoordError::Parse(s.to_string()))?;
        let lon: f64 = lon
            .trim()
            .parse()
            .map_err(|_| CoordError::Parse(s.to_string()))?;
        Coordinate::checked(lat, lon)
    }
}
