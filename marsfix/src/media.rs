//! Geotags embedded in photos and videos.
//!
//! Video containers carry their location as an ISO-6709 string such as
//! `+23.1584+113.3839/`, optionally with an altitude component. Image EXIF
//! data exposes a `[latitude, longitude]` pair. Both are recorded in WGS-84
//! and are shifted to GCJ-02 here so they line up with reconciled fixes.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::coord::{wgs84_to_gcj02, CoordError, Coordinate};

/// A parsed ISO-6709 location string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Iso6709 {
    pub coordinate: Coordinate,
    /// Altitude in meters, when present.
    pub altitude: Option<f64>,
}

/// `<±lat><±lon>[<±alt>]/`
fn iso6709_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([+-]\d+(?:\.\d+)?)([+-]\d+(?:\.\d+)?)([+-]\d+(?:\.\d+)?)?/$").unwrap()
    })
}

fn component(text: &str, source: &str) -> Result<f64, CoordError> {
    text.parse()
        .map_err(|_| CoordError::Parse(source.to_string()))
}

impl Iso6709 {
    pub fn new(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            altitude: None,
        }
    }

    /// Parses an ISO-6709 string. Out-of-range components are rejected.
    pub fn parse(text: &str) -> Result<Self, CoordError> {
        let trimmed = text.trim();
        let caps = iso6709_pattern()
            .captures(trimmed)
            .ok_or_else(|| CoordError::Parse(text.to_string()))?;

        let lat = component(&caps[1], text)?;
        let lon = component(&caps[2], text)?;
        let altitude = caps
            .get(3)
            .map(|m| component(m.as_str(), text))
            .transpose()?;

        Ok(Self {
            coordinate: Coordinate::checked(lat, lon)?,
            altitude,
        })
    }

    /// Same geotag with the coordinate shifted to GCJ-02.
    pub fn to_gcj02(&self) -> Self {
        Self {
            coordinate: wgs84_to_gcj02(&self.coordinate),
            altitude: self.altitude,
        }
    }
}

impl fmt::Display for Iso6709 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+}{:+}", self.coordinate.latitude, self.coordinate.longitude)?;
        if let Some(alt) = self.altitude {
            write!(f, "{alt:+}")?;
        }
        f.write_str("/")
    }
}

impl FromStr for Iso6709 {
    type Err = CoordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Iso6709::parse(s)
    }
}

/// Rewrites a WGS-84 ISO-6709 location string as GCJ-02.
pub fn transform_iso6709(text: &str) -> Result<String, CoordError> {
    let shifted = Iso6709::parse(text)?.to_gcj02();
    let out = shifted.to_string();
    debug!(from = text, to = %out, "Shifted media location");
    Ok(out)
}

/// Shifts an EXIF `[latitude, longitude]` pair from WGS-84 to GCJ-02.
///
/// Pairs that are not valid coordinates are returned unchanged.
pub fn transform_exif_lat_long(lat_long: [f64; 2]) -> [f64; 2] {
    let Ok(wgs) = Coordinate::checked(lat_long[0], lat_long[1]) else {
        return lat_long;
    };
    let gcj = wgs84_to_gcj02(&wgs);
    [gcj.latitude, gcj.longitude]
}
