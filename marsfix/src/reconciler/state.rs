//! Mutable state shared by every fix an engine sees.

use moka::policy::EvictionPolicy;
use moka::sync::Cache;

use crate::coord::Coordinate;
use crate::location::LatLngRecord;
use crate::region::RegionStatus;

/// A raw WGS-84 fix and the GCJ-02 coordinate it was shifted to.
///
/// Both members carry the raw fix's times and motion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PurePair {
    pub wgs84: LatLngRecord,
    pub gcj02: LatLngRecord,
}

impl PurePair {
    pub fn new(wgs84: LatLngRecord, gcj02: LatLngRecord) -> Self {
        Self { wgs84, gcj02 }
    }
}

/// Everything the engine remembers between fixes.
pub(crate) struct ReconcilerState {
    /// Most recent coordinate the engine trusts as GCJ-02.
    pub last_gcj02: Option<LatLngRecord>,
    /// Most recent live raw fix and its shifted counterpart.
    pub latest_pure: Option<PurePair>,
    /// Coordinates known to be GCJ-02, keyed by fingerprint. LRU so a new
    /// entry is always admitted.
    fingerprints: Cache<u64, ()>,
    pub region: RegionStatus,
}

impl ReconcilerState {
    pub fn new(fingerprint_capacity: u64) -> Self {
        Self {
            last_gcj02: None,
            latest_pure: None,
            fingerprints: Cache::builder()
                .max_capacity(fingerprint_capacity)
                .eviction_policy(EvictionPolicy::lru())
                .build(),
            region: RegionStatus::default(),
        }
    }

    pub fn remember_gcj02(&self, coord: &Coordinate) {
        self.fingerprints.insert(coord.fingerprint(), ());
    }

    pub fn is_known_gcj02(&self, coord: &Coordinate) -> bool {
        self.fingerprints.contains_key(&coord.fingerprint())
    }

    /// Pending evictions are applied first so the count is exact.
    pub fn fingerprint_count(&self) -> u64 {
        self.fingerprints.run_pending_tasks();
        self.fingerprints.entry_count()
    }
}
