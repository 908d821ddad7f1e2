//! Atomic counters updated on the fix path.

use std::sync::atomic::{AtomicU64, Ordering};

use super::TelemetrySnapshot;
use crate::reconciler::{Action, Branch};

/// Counters for everything the reconciler does.
#[derive(Debug, Default)]
pub struct ReconcilerMetrics {
    fixes_total: AtomicU64,
    branches: [AtomicU64; Branch::COUNT],
    transformed: AtomicU64,
    reversed: AtomicU64,
    substituted: AtomicU64,
    unchanged: AtomicU64,
    reentrant_bypasses: AtomicU64,
    drift_warnings: AtomicU64,
    drift_alerts: AtomicU64,
    region_refreshes: AtomicU64,
    last_known_queries: AtomicU64,
    precondition_violations: AtomicU64,
}

impl ReconcilerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fix_received(&self) {
        self.fixes_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a completed decision.
    pub fn decided(&self, branch: &Branch, action: Action) {
        self.branches[branch.index()].fetch_add(1, Ordering::Relaxed);
        let counter = match action {
            Action::Transformed => &self.transformed,
            Action::Reversed => &self.reversed,
            Action::Substituted => &self.substituted,
            Action::Unchanged => &self.unchanged,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn reentrant_bypass(&self) {
        self.reentrant_bypasses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn drift_warning(&self) {
        self.drift_warnings.fetch_add(1, Ordering::Relaxed);
    }

    pub fn drift_alert(&self) {
        self.drift_alerts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn region_refreshed(&self) {
        self.region_refreshes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn last_known_queried(&self) {
        self.last_known_queries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn precondition_violated(&self) {
        self.precondition_violations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn branch_count(&self, branch: &Branch) -> u64 {
        self.branches[branch.index()].load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        let mut branches = [0u64; Branch::COUNT];
        for (slot, counter) in branches.iter_mut().zip(&self.branches) {
            *slot = counter.load(Ordering::Relaxed);
        }
        TelemetrySnapshot {
            fixes_total: self.fixes_total.load(Ordering::Relaxed),
            branches,
            transformed: self.transformed.load(Ordering::Relaxed),
            reversed: self.reversed.load(Ordering::Relaxed),
            substituted: self.substituted.load(Ordering::Relaxed),
            unchanged: self.unchanged.load(Ordering::Relaxed),
            reentrant_bypasses: self.reentrant_bypasses.load(Ordering::Relaxed),
            drift_warnings: self.drift_warnings.load(Ordering::Relaxed),
            drift_alerts: self.drift_alerts.load(Ordering::Relaxed),
            region_refreshes: self.region_refreshes.load(Ordering::Relaxed),
            last_known_queries: self.last_known_queries.load(Ordering::Relaxed),
            precondition_violations: self.precondition_violations.load(Ordering::Relaxed),
        }
    }
}
