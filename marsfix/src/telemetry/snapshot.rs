//! Point-in-time copy of the engine counters.

use std::fmt;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::reconciler::Branch;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TelemetrySnapshot {
    pub fixes_total: u64,
    /// Decisions per branch, indexed by [`Branch::index`].
    #[serde(serialize_with = "serialize_branches")]
    pub branches: [u64; Branch::COUNT],
    pub transformed: u64,
    pub reversed: u64,
    pub substituted: u64,
    pub unchanged: u64,
    pub reentrant_bypasses: u64,
    pub drift_warnings: u64,
    pub drift_alerts: u64,
    pub region_refreshes: u64,
    pub last_known_queries: u64,
    pub precondition_violations: u64,
}

impl TelemetrySnapshot {
    /// Count for a branch by its snake_case name.
    pub fn branch(&self, name: &str) -> Option<u64> {
        (0..Branch::COUNT)
            .find(|&i| Branch::name_at(i) == name)
            .map(|i| self.branches[i])
    }

    /// Fixes that reached a decision (excludes reentrant bypasses).
    pub fn decided(&self) -> u64 {
        self.branches.iter().sum()
    }
}

fn serialize_branches<S: Serializer>(
    branches: &[u64; Branch::COUNT],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(Branch::COUNT))?;
    for (i, count) in branches.iter().enumerate() {
        map.serialize_entry(Branch::name_at(i), count)?;
    }
    map.end()
}

impl fmt::Display for TelemetrySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Fixes:        {}", self.fixes_total)?;
        writeln!(
            f,
            "Actions:      transformed={} reversed={} substituted={} unchanged={}",
            self.transformed, self.reversed, self.substituted, self.unchanged
        )?;
        writeln!(f, "Branches:")?;
        for (i, count) in self.branches.iter().enumerate() {
            writeln!(f, "  {:<24} {}", Branch::name_at(i), count)?;
        }
        writeln!(
            f,
            "Drift:        warnings={} alerts={}",
            self.drift_warnings, self.drift_alerts
        )?;
        write!(
            f,
            "Other:        reentrant={} region_refreshes={} last_known_queries={} precondition_violations={}",
            self.reentrant_bypasses,
            self.region_refreshes,
            self.last_known_queries,
            self.precondition_violations
        )
    }
}
