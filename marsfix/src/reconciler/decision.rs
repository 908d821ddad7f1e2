//! What the engine decided about a fix, and why.

use std::fmt;

use serde::Serialize;

use crate::coord::Datum;
use crate::location::LocationFix;

/// Where a fix came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FixOrigin {
    /// Delivered to a subscriber as it happened.
    Live,
    /// Returned by a last-known-location query.
    LastKnown,
}

/// Which criterion settled an ambiguous fused fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FusedCriterion {
    Distance,
    Speed,
    Bearing,
}

/// The branch of the decision tree that classified a fix.
///
/// Branches are tried in declaration order; the first match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "branch")]
pub enum Branch {
    OutOfRegion,
    Expired,
    AlreadyGcj02,
    DirectlyTransformable,
    FusedAmbiguous {
        criterion: FusedCriterion,
        resolved: Datum,
    },
    ReverseTransformable,
    CacheFallback,
    Unknown,
}

impl Branch {
    pub const COUNT: usize = 8;

    /// Stable position of the branch in the decision order.
    pub fn index(&self) -> usize {
        match self {
            Branch::OutOfRegion => 0,
            Branch::Expired => 1,
            Branch::AlreadyGcj02 => 2,
            Branch::DirectlyTransformable => 3,
            Branch::FusedAmbiguous { .. } => 4,
            Branch::ReverseTransformable => 5,
            Branch::CacheFallback => 6,
            Branch::Unknown => 7,
        }
    }

    pub fn name(&self) -> &'static str {
        Self::name_at(self.index())
    }

    pub(crate) fn name_at(index: usize) -> &'static str {
        match index {
            0 => "out_of_region",
            1 => "expired",
            2 => "already_gcj02",
            3 => "directly_transformable",
            4 => "fused_ambiguous",
            5 => "reverse_transformable",
            6 => "cache_fallback",
            _ => "unknown",
        }
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Branch::FusedAmbiguous {
                criterion,
                resolved,
            } => write!(f, "fused_ambiguous({resolved} by {criterion:?})"),
            other => f.write_str(other.name()),
        }
    }
}

/// What happened to the coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Returned as received.
    Unchanged,
    /// Shifted from WGS-84 to GCJ-02.
    Transformed,
    /// A doubly shifted fix was shifted back once.
    Reversed,
    /// Replaced by the last known GCJ-02 coordinate.
    Substituted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Decision {
    #[serde(flatten)]
    pub branch: Branch,
    pub action: Action,
}

impl Decision {
    pub fn new(branch: Branch, action: Action) -> Self {
        Self { branch, action }
    }
}

/// The fix handed back to the caller plus the decision behind it.
///
/// `decision` is `None` only when the call was reentrant and bypassed the
/// engine entirely.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub fix: LocationFix,
    pub decision: Option<Decision>,
}
