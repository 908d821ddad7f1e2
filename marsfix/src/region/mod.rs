//! Territory bounding for the GCJ-02 reconciliation region.
//!
//! A fix is only ever offset when it lies inside mainland China and outside
//! Hong Kong, Macao and Taiwan (including Kinmen, Matsu and Wuqiu). The
//! outlines are coarse hand-drawn polygons; the test is a plain ray cast.

mod gate;
mod polygons;

pub use gate::{spawn_refresh, RegionRefresh, RegionStatus, DEFAULT_REFRESH_INTERVAL_MS};

use std::fmt;

use serde::Serialize;

use crate::coord::Coordinate;

/// A polygon vertex as (latitude, longitude).
pub(crate) type Vertex = (f64, f64);

/// Points closer than this (in degrees of longitude) to an edge crossing
/// count as on the edge.
const EDGE_PRECISION: f64 = 2e-10;

/// Coarse territory classification used by diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Territory {
    Mainland,
    HongKong,
    Macao,
    Taiwan,
    Outside,
}

impl Territory {
    /// True for the only territory in which fixes are reconciled.
    pub fn is_reconciled(&self) -> bool {
        matches!(self, Territory::Mainland)
    }
}

impl fmt::Display for Territory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Territory::Mainland => "mainland",
            Territory::HongKong => "hong_kong",
            Territory::Macao => "macao",
            Territory::Taiwan => "taiwan",
            Territory::Outside => "outside",
        };
        f.write_str(name)
    }
}

/// Ray-casting point-in-polygon test.
///
/// The ray runs east from the point. A point equal to a vertex, or within
/// [`EDGE_PRECISION`] of an edge crossing, is inside. A point on a
/// horizontal edge is inside only within that edge's longitude span. Latitude
/// bounds are inclusive, so a ray through a vertex may count both adjacent
/// edges.
pub(crate) fn point_in_polygon(point: Vertex, polygon: &[Vertex]) -> bool {
    let (lat, lon) = point;
    let mut crossings = 0usize;

    for (i, &p1) in polygon.iter().enumerate() {
        let p2 = polygon[(i + 1) % polygon.len()];

        if point == p1 || point == p2 {
            return true;
        }

        let (lo, hi) = if p1.0 <= p2.0 { (p1.0, p2.0) } else { (p2.0, p1.0) };
        if !(lo..=hi).contains(&lat) {
            continue;
        }

        if p1.0 == p2.0 {
            // Horizontal edge: only its own span counts, and it never crosses the ray.
            let (west, east) = if p1.1 <= p2.1 { (p1.1, p2.1) } else { (p2.1, p1.1) };
            if lon >= west - EDGE_PRECISION && lon <= east + EDGE_PRECISION {
                return true;
            }
            continue;
        }

        let crossing_lon = p1.1 + (lat - p1.0) * (p2.1 - p1.1) / (p2.0 - p1.0);

        if (lon - crossing_lon).abs() < EDGE_PRECISION {
            return true;
        }
        if lon < crossing_lon {
            crossings += 1;
        }
    }

    crossings % 2 == 1
}

pub fn is_in_mainland(coord: &Coordinate) -> bool {
    point_in_polygon((coord.latitude, coord.longitude), polygons::MAINLAND)
}

pub fn is_in_hong_kong(coord: &Coordinate) -> bool {
    point_in_polygon((coord.latitude, coord.longitude), polygons::HONG_KONG)
}

pub fn is_in_macao(coord: &Coordinate) -> bool {
    point_in_polygon((coord.latitude, coord.longitude), polygons::MACAO)
}

/// Taiwan's main island or any of the Kinmen, Matsu and Wuqiu outlines.
pub fn is_in_taiwan(coord: &Coordinate) -> bool {
    let p = (coord.latitude, coord.longitude);
    [
        polygons::TAIWAN,
        polygons::KINMEN,
        polygons::MATSU,
        polygons::WUQIU,
    ]
    .iter()
    .any(|poly| point_in_polygon(p, poly))
}

/// Classifies a coordinate by territory.
///
/// The special regions are tested first because the mainland outline
/// overlaps several of them.
pub fn territory_of(coord: &Coordinate) -> Territory {
    if !coord.is_valid() {
        Territory::Outside
    } else if is_in_hong_kong(coord) {
        Territory::HongKong
    } else if is_in_macao(coord) {
        Territory::Macao
    } else if is_in_taiwan(coord) {
        Territory::Taiwan
    } else if is_in_mainland(coord) {
        Territory::Mainland
    } else {
        Territory::Outside
    }
}

/// Returns true when fixes at `coord` are subject to reconciliation.
pub fn is_in_reconciliation_region(coord: &Coordinate) -> bool {
    territory_of(coord).is_reconciled()
}
