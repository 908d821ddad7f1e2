//! The location reconciliation engine.
//!
//! Every fix passes through a fixed decision tree. The first matching branch
//! decides whether the fix is returned as-is, shifted from WGS-84 to
//! GCJ-02, shifted back once (it had been shifted twice), or replaced by the
//! last trusted GCJ-02 position.
//!
//! ```text
//! fix ─► region gate ─► expiry ─► known GCJ-02 ─► raw provider ─► ambiguous
//!                                                                  │
//!              unknown ◄─ cache fallback ◄─ double shift ◄─────────┘
//! ```
//!
//! # Thread Safety
//!
//! A [`Reconciler`] is `Send + Sync`. All engine memory sits behind one
//! `parking_lot::Mutex`; a fix holds it for the duration of its decision, so
//! concurrent fixes are serialized. Region refreshes run off the fix path and
//! write their result back under the same lock.
//!
//! # Example
//!
//! ```ignore
//! use marsfix::reconciler::{Reconciler, ReconcilerConfig};
//!
//! let engine = Reconciler::new(ReconcilerConfig::default());
//! let shifted = engine.reconcile(fix);
//! ```

mod config;
mod decision;
mod drift;
mod fused;
mod guard;
mod last_known;
mod state;

pub use config::{ReconcilerConfig, UnknownPolicy};
pub use decision::{Action, Branch, Decision, FixOrigin, FusedCriterion, Outcome};
pub use drift::MovementNote;
pub use last_known::{InMemoryLastKnown, LastKnownSource};
pub use state::PurePair;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::clock::{Clock, SystemClock};
use crate::coord::{gcj02_to_wgs84, haversine_distance, wgs84_to_gcj02, Coordinate, Datum};
use crate::location::{LatLngRecord, LocationFix, ProviderKind};
use crate::region::{self, RegionRefresh, RegionStatus};
use crate::telemetry::{ReconcilerMetrics, TelemetrySnapshot};

use fused::Reliability;
use guard::ReentrancyGuard;
use state::ReconcilerState;

/// Internal consistency failures. Never surfaced to callers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReconcileError {
    #[error("Refusing to shift fix at {0}: already marked as GCJ-02")]
    TransformPrecondition(Coordinate),
}

/// Shifts a raw fix to GCJ-02 in place and returns the new coordinate.
fn shift_fix(fix: &mut LocationFix) -> Result<Coordinate, ReconcileError> {
    if fix.is_wgs2gcj() {
        return Err(ReconcileError::TransformPrecondition(fix.coordinate));
    }
    let raw = fix.coordinate;
    let gcj = wgs84_to_gcj02(&raw);
    fix.stamp_gcj02(raw, gcj);
    Ok(gcj)
}

/// Stateful WGS-84 / GCJ-02 reconciler.
pub struct Reconciler {
    config: ReconcilerConfig,
    state: Arc<Mutex<ReconcilerState>>,
    clock: Arc<dyn Clock>,
    last_known: Option<Arc<dyn LastKnownSource>>,
    metrics: Arc<ReconcilerMetrics>,
    region_refresh_in_flight: Arc<AtomicBool>,
}

impl Reconciler {
    /// Creates an engine on the system clock with no last-known source.
    pub fn new(config: ReconcilerConfig) -> Self {
        let state = ReconcilerState::new(config.fingerprint_capacity);
        Self {
            config,
            state: Arc::new(Mutex::new(state)),
            clock: Arc::new(SystemClock),
            last_known: None,
            metrics: Arc::new(ReconcilerMetrics::new()),
            region_refresh_in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_last_known(mut self, source: Arc<dyn LastKnownSource>) -> Self {
        self.last_known = Some(source);
        self
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    pub fn metrics(&self) -> &ReconcilerMetrics {
        &self.metrics
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        self.metrics.snapshot()
    }

    /// Reconciles a fix delivered to a subscriber.
    pub fn reconcile(&self, fix: LocationFix) -> LocationFix {
        self.reconcile_detailed(fix, FixOrigin::Live).fix
    }

    /// Reconciles the answer to a last-known-location query. Identical to
    /// [`reconcile`](Self::reconcile) except that it never replaces the
    /// calibration pair.
    pub fn reconcile_last_known(&self, fix: LocationFix) -> LocationFix {
        self.reconcile_detailed(fix, FixOrigin::LastKnown).fix
    }

    /// Reconciles a fix and reports the decision behind the result.
    pub fn reconcile_detailed(&self, fix: LocationFix, origin: FixOrigin) -> Outcome {
        let Some(_guard) = ReentrancyGuard::enter() else {
            self.metrics.reentrant_bypass();
            debug!(provider = %fix.provider, "Reentrant call bypassed");
            return Outcome {
                fix,
                decision: None,
            };
        };

        self.metrics.fix_received();
        let provider = fix.provider.clone();
        let input = fix.coordinate;
        let (fix, decision) = self.decide(fix, origin);
        self.metrics.decided(&decision.branch, decision.action);
        debug!(
            provider = %provider,
            input = %input,
            output = %fix.coordinate,
            branch = %decision.branch,
            action = ?decision.action,
            "Fix reconciled"
        );

        Outcome {
            fix,
            decision: Some(decision),
        }
    }

    /// Records a raw fix and the GCJ-02 coordinate it maps to, as if the
    /// engine had just shifted it.
    pub fn record_pure_pair(&self, wgs84: LatLngRecord, gcj02: LatLngRecord) {
        let mut state = self.state.lock();
        state.remember_gcj02(&gcj02.coordinate);
        state.latest_pure = Some(PurePair::new(wgs84, gcj02));
    }

    /// Replaces the last trusted GCJ-02 record.
    pub fn record_last_gcj02(&self, record: LatLngRecord) {
        let mut state = self.state.lock();
        state.remember_gcj02(&record.coordinate);
        self.update_last(&mut state, record, "host");
    }

    pub fn last_gcj02(&self) -> Option<LatLngRecord> {
        self.state.lock().last_gcj02
    }

    pub fn latest_pure(&self) -> Option<PurePair> {
        self.state.lock().latest_pure
    }

    pub fn region_status(&self) -> RegionStatus {
        self.state.lock().region
    }

    /// Whether `coord` is currently remembered as GCJ-02.
    pub fn is_known_gcj02(&self, coord: &Coordinate) -> bool {
        self.state.lock().is_known_gcj02(coord)
    }

    pub fn fingerprint_count(&self) -> u64 {
        self.state.lock().fingerprint_count()
    }

    fn decide(&self, mut fix: LocationFix, origin: FixOrigin) -> (LocationFix, Decision) {
        if !self.in_region(&fix.coordinate) {
            return (fix, Decision::new(Branch::OutOfRegion, Action::Unchanged));
        }

        let mut state = self.state.lock();
        let last = self.acquire_last(&mut state);

        if self.is_stale(&fix, last.as_ref()) {
            return (fix, Decision::new(Branch::Expired, Action::Unchanged));
        }

        if state.is_known_gcj02(&fix.coordinate)
            || fix.provider.is_gcj02_marked()
            || fix.is_wgs2gcj()
        {
            let record = LatLngRecord::from_fix(&fix, fix.coordinate);
            self.update_last(&mut state, record, "already_gcj02");
            return (fix, Decision::new(Branch::AlreadyGcj02, Action::Unchanged));
        }

        let tolerance = self.config.distance_tolerance_m;
        let raw_provider = match fix.provider {
            ProviderKind::Gps => true,
            ProviderKind::Network => !last
                .as_ref()
                .is_some_and(|l| l.is_near(&fix.coordinate, tolerance)),
            _ => false,
        };
        if raw_provider {
            let action = self.forward(&mut state, &mut fix, origin, true, "direct");
            return (fix, Decision::new(Branch::DirectlyTransformable, action));
        }

        let pair = self.calibration_pair(&mut state, &fix, origin, last.as_ref());
        match fused::screen(&fix, last.as_ref(), &self.config) {
            Reliability::Reliable => {
                let verdict = pair
                    .as_ref()
                    .and_then(|p| fused::disambiguate(&fix, p, &self.config));
                if let Some((resolved, criterion)) = verdict {
                    let branch = Branch::FusedAmbiguous {
                        criterion,
                        resolved,
                    };
                    let action = if resolved == Datum::Wgs84 {
                        self.forward(&mut state, &mut fix, origin, true, "fused")
                    } else {
                        state.remember_gcj02(&fix.coordinate);
                        let record = LatLngRecord::from_fix(&fix, fix.coordinate);
                        self.update_last(&mut state, record, "fused");
                        Action::Unchanged
                    };
                    return (fix, Decision::new(branch, action));
                }
            }
            screened => {
                debug!(reliability = ?screened, provider = %fix.provider, "Ambiguous fix screened out");
            }
        }

        let anchors = [
            last.map(|l| l.coordinate),
            pair.map(|p| p.gcj02.coordinate),
        ];
        let doubly_shifted = anchors.iter().flatten().any(|anchor| {
            haversine_distance(&wgs84_to_gcj02(anchor), &fix.coordinate) <= tolerance
        });
        if doubly_shifted {
            let restored = gcj02_to_wgs84(&fix.coordinate);
            fix.mark_gcj02(restored);
            state.remember_gcj02(&restored);
            let record = LatLngRecord::from_fix(&fix, restored);
            self.update_last(&mut state, record, "reverse");
            return (
                fix,
                Decision::new(Branch::ReverseTransformable, Action::Reversed),
            );
        }

        if let Some(last) = last {
            let window = self.config.cache_fallback_ms;
            if !last.is_expired(window, fix.time_ms, fix.elapsed_realtime_ns) {
                let observed = LatLngRecord::from_fix(&fix, fix.coordinate);
                self.note_movement(&last, &observed, "cache_fallback");
                fix.mark_gcj02(last.coordinate);
                state.remember_gcj02(&last.coordinate);
                return (
                    fix,
                    Decision::new(Branch::CacheFallback, Action::Substituted),
                );
            }
        }

        warn!(
            provider = %fix.provider,
            coordinate = %fix.coordinate,
            time_ms = fix.time_ms,
            last_time_ms = ?last.and_then(|l| l.times).map(|t| t.time_ms),
            policy = self.config.unknown_policy.name(),
            "Could not classify fix"
        );
        let action = match self.config.unknown_policy {
            UnknownPolicy::ForwardTransform if !fix.is_fix_ups() => {
                self.forward(&mut state, &mut fix, origin, false, "unknown")
            }
            _ => Action::Unchanged,
        };
        (fix, Decision::new(Branch::Unknown, action))
    }

    /// Region gate. The first check runs inline; later refreshes follow
    /// the configured [`RegionRefresh`] mode.
    fn in_region(&self, coord: &Coordinate) -> bool {
        if !coord.is_valid() {
            return false;
        }

        let now_ms = self.clock.now_ms();
        let status = self.state.lock().region;
        let stale = status.needs_refresh(now_ms, self.config.region_refresh_interval_ms);

        if status.is_unknown() || (stale && self.config.region_refresh == RegionRefresh::Inline) {
            let bounded = region::is_in_reconciliation_region(coord);
            self.state.lock().region.record(bounded, now_ms);
            self.metrics.region_refreshed();
            debug!(coordinate = %coord, bounded, "Region checked inline");
            return bounded;
        }

        if stale {
            self.schedule_region_refresh(*coord);
        }
        status.bounded
    }

    fn schedule_region_refresh(&self, coord: Coordinate) {
        if self.region_refresh_in_flight.swap(true, Ordering::AcqRel) {
            return;
        }

        let state = Arc::clone(&self.state);
        let clock = Arc::clone(&self.clock);
        let metrics = Arc::clone(&self.metrics);
        let in_flight = Arc::clone(&self.region_refresh_in_flight);
        let spawned = region::spawn_refresh(move || {
            let bounded = region::is_in_reconciliation_region(&coord);
            state.lock().region.record(bounded, clock.now_ms());
            metrics.region_refreshed();
            in_flight.store(false, Ordering::Release);
            debug!(coordinate = %coord, bounded, "Region refreshed");
        });
        if !spawned {
            self.region_refresh_in_flight.store(false, Ordering::Release);
        }
    }

    /// Last trusted GCJ-02 record, refilled from the last-known source once
    /// the stored one has aged out.
    fn acquire_last(&self, state: &mut ReconcilerState) -> Option<LatLngRecord> {
        let now_ms = self.clock.now_ms();
        let now_ns = self.clock.elapsed_realtime_ns();
        let expiry = self.config.last_gcj02_expiry_ms;

        if let Some(last) = state.last_gcj02 {
            if !last.is_expired(expiry, now_ms, now_ns) {
                return Some(last);
            }
        }

        let source = self.last_known.as_deref()?;
        self.metrics.last_known_queried();

        let found = last_known::find_raw(source, now_ms, expiry)
            .filter(|raw| raw.coordinate.is_valid())
            .map(|raw| {
                let gcj = if raw.is_wgs2gcj() {
                    raw.coordinate
                } else {
                    wgs84_to_gcj02(&raw.coordinate)
                };
                (LatLngRecord::from_fix(&raw, gcj), "last_known_raw")
            })
            .or_else(|| {
                last_known::find_gcj02(source, now_ms, expiry).map(|marked| {
                    let record = LatLngRecord::from_fix(&marked, marked.coordinate);
                    (record, "last_known_gcj02")
                })
            });

        let (record, via) = found?;
        state.remember_gcj02(&record.coordinate);
        self.update_last(state, record, via);
        Some(record)
    }

    /// A fix is stale when it predates the last trusted record by more than
    /// the stale window, or, with no such record, the wall clock by more
    /// than the expiry window. Untimed fixes are never stale.
    fn is_stale(&self, fix: &LocationFix, last: Option<&LatLngRecord>) -> bool {
        if !fix.has_times() {
            return false;
        }
        if let Some(times) = last.and_then(|l| l.times) {
            return fix.time_ms.saturating_add(self.config.stale_fix_ms) < times.time_ms;
        }
        let now_ms = self.clock.now_ms();
        fix.time_ms < now_ms && now_ms - fix.time_ms > self.config.fix_expiry_ms
    }

    /// WGS-84 / GCJ-02 pair to compare an ambiguous fix against.
    fn calibration_pair(
        &self,
        state: &mut ReconcilerState,
        fix: &LocationFix,
        origin: FixOrigin,
        last: Option<&LatLngRecord>,
    ) -> Option<PurePair> {
        let expiry = self.config.pure_expiry_ms;
        let fresh =
            |p: &PurePair| !p.wgs84.is_expired(expiry, fix.time_ms, fix.elapsed_realtime_ns);

        if let Some(pair) = state.latest_pure.filter(|p| fresh(p)) {
            return Some(pair);
        }

        if let Some(source) = self.last_known.as_deref() {
            self.metrics.last_known_queried();
            let raw = last_known::find_raw(source, self.clock.now_ms(), expiry)
                .filter(|raw| raw.coordinate.is_valid() && !raw.is_wgs2gcj());
            if let Some(raw) = raw {
                let wgs = LatLngRecord::from_fix(&raw, raw.coordinate);
                let pair = PurePair::new(wgs, wgs.moved_to(wgs84_to_gcj02(&wgs.coordinate)));
                if origin == FixOrigin::Live {
                    state.latest_pure = Some(pair);
                }
                if fresh(&pair) {
                    return Some(pair);
                }
            }
        }

        last.map(fused::synthesize_pair).filter(|p| fresh(p))
    }

    /// Shifts `fix` to GCJ-02 and records the result.
    fn forward(
        &self,
        state: &mut ReconcilerState,
        fix: &mut LocationFix,
        origin: FixOrigin,
        keep_pure: bool,
        source: &str,
    ) -> Action {
        debug_assert!(
            !fix.is_wgs2gcj(),
            "forward shift requested for a fix already in GCJ-02"
        );
        let raw = LatLngRecord::from_fix(fix, fix.coordinate);
        let gcj = match shift_fix(fix) {
            Ok(gcj) => gcj,
            Err(e) => {
                self.metrics.precondition_violated();
                error!(error = %e, provider = %fix.provider, "Shift skipped");
                return Action::Unchanged;
            }
        };

        state.remember_gcj02(&gcj);
        let shifted = raw.moved_to(gcj);
        self.update_last(state, shifted, source);
        if keep_pure && origin == FixOrigin::Live {
            state.latest_pure = Some(PurePair::new(raw, shifted));
        }
        Action::Transformed
    }

    fn update_last(&self, state: &mut ReconcilerState, record: LatLngRecord, source: &str) {
        if let Some(prev) = state.last_gcj02 {
            self.note_movement(&prev, &record, source);
        }
        state.last_gcj02 = Some(record);
    }

    fn note_movement(&self, prev: &LatLngRecord, curr: &LatLngRecord, source: &str) {
        let note = MovementNote::between(prev, curr, &self.config);
        note.log(prev, curr, source);
        if note.alert {
            self.metrics.drift_alert();
        } else if note.drifting {
            self.metrics.drift_warning();
        }
    }
}

impl fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconciler")
            .field("config", &self.config)
            .field("has_last_known", &self.last_known.is_some())
            .finish_non_exhaustive()
    }
}
