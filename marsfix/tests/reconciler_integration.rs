//! Integration tests for the Reconciler.
//!
//! These tests drive the engine through its public API only:
//! - Datum transforms and their round-trip bound
//! - Decision tree outcomes for realistic fix sequences
//! - Behavior under concurrent callers
//!
//! Run with: `cargo test --test reconciler_integration`

use std::sync::Arc;
use std::thread;

use proptest::prelude::*;

use marsfix::coord::{gcj02_to_wgs84, haversine_distance, wgs84_to_gcj02};
use marsfix::location::keys;
use marsfix::reconciler::FusedCriterion;
use marsfix::{
    Action, Branch, Clock, Coordinate, Datum, FixOrigin, LatLngRecord, LocationFix, ManualClock,
    ProviderKind, Reconciler, ReconcilerConfig,
};

// ============================================================================
// Helper Functions
// ============================================================================

const T0_MS: u64 = 1_700_000_000_000;
const T0_NS: u64 = 50_000_000_000;

/// ~10 m of latitude.
const TEN_M: f64 = 0.0000899;

const SHANGHAI: (f64, f64) = (31.2304, 121.4737);
const NEW_YORK: (f64, f64) = (40.7128, -74.0060);

fn deterministic_engine() -> (Reconciler, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(T0_MS, T0_NS));
    let engine = Reconciler::new(ReconcilerConfig::deterministic()).with_clock(clock.clone());
    (engine, clock)
}

fn fix_now(lat: f64, lon: f64, provider: ProviderKind, clock: &ManualClock) -> LocationFix {
    LocationFix::new(Coordinate::new(lat, lon), provider)
        .with_times(clock.now_ms(), clock.elapsed_realtime_ns())
}

fn provider_from_index(i: u8) -> ProviderKind {
    match i % 6 {
        0 => ProviderKind::Gps,
        1 => ProviderKind::Network,
        2 => ProviderKind::Passive,
        3 => ProviderKind::Fused,
        4 => ProviderKind::from_name("gps@gcj02"),
        _ => ProviderKind::from_name("custom"),
    }
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_shanghai_gps_fix_is_shifted_once() {
    let (engine, clock) = deterministic_engine();
    let fix = fix_now(SHANGHAI.0, SHANGHAI.1, ProviderKind::Gps, &clock);

    let out = engine.reconcile_detailed(fix.clone(), FixOrigin::Live);
    let decision = out.decision.unwrap();
    assert_eq!(decision.branch, Branch::DirectlyTransformable);
    assert_eq!(decision.action, Action::Transformed);

    let shifted = out.fix.coordinate;
    assert!((shifted.latitude - 31.2284577).abs() < 1e-6);
    assert!((shifted.longitude - 121.4782231).abs() < 1e-6);
    let offset = haversine_distance(&fix.coordinate, &shifted);
    assert!((400.0..600.0).contains(&offset), "offset {offset} m");

    assert!(out.fix.is_wgs2gcj());
    assert_eq!(out.fix.stamped_wgs84(), Some(fix.coordinate));
    assert_eq!(out.fix.stamped_gcj02(), Some(shifted));
    assert_eq!(out.fix.provider, ProviderKind::Gps);
}

#[test]
fn test_new_york_fix_is_untouched() {
    let (engine, clock) = deterministic_engine();
    let fix = fix_now(NEW_YORK.0, NEW_YORK.1, ProviderKind::Gps, &clock);

    let out = engine.reconcile_detailed(fix.clone(), FixOrigin::Live);
    assert_eq!(out.decision.unwrap().branch, Branch::OutOfRegion);
    assert_eq!(out.fix, fix);
    assert!(out.fix.metadata.is_empty());
    assert!(engine.last_gcj02().is_none());
}

#[test]
fn test_hong_kong_fix_is_untouched() {
    let (engine, clock) = deterministic_engine();
    let fix = fix_now(22.3193, 114.1694, ProviderKind::Gps, &clock);
    let out = engine.reconcile(fix.clone());
    assert_eq!(out, fix);
}

#[test]
fn test_idempotence_across_passes() {
    let (engine, clock) = deterministic_engine();
    let fix = fix_now(SHANGHAI.0, SHANGHAI.1, ProviderKind::Gps, &clock);

    let first = engine.reconcile_detailed(fix, FixOrigin::Live);
    assert_eq!(first.decision.unwrap().branch, Branch::DirectlyTransformable);

    let second = engine.reconcile_detailed(first.fix.clone(), FixOrigin::Live);
    assert_eq!(second.decision.unwrap().branch, Branch::AlreadyGcj02);
    assert_eq!(second.fix.coordinate, first.fix.coordinate);

    let third = engine.reconcile(second.fix.clone());
    assert_eq!(third.coordinate, first.fix.coordinate);
}

#[test]
fn test_fused_tie_broken_by_bearing() {
    let (engine, clock) = deterministic_engine();
    let f = Coordinate::new(SHANGHAI.0, SHANGHAI.1);

    // Both members 10 m from the fix, both implying 1 m/s over 10 s.
    // Only the WGS-84 member was heading toward it.
    let wgs = LatLngRecord::new(Coordinate::new(f.latitude + TEN_M, f.longitude))
        .with_times(T0_MS, T0_NS)
        .with_motion(1.0, 180.0);
    let gcj = LatLngRecord::new(Coordinate::new(f.latitude - TEN_M, f.longitude))
        .with_times(T0_MS, T0_NS)
        .with_motion(1.0, 180.0);
    engine.record_pure_pair(wgs, gcj);

    clock.advance_ms(10_000);
    let fix = fix_now(f.latitude, f.longitude, ProviderKind::Fused, &clock);
    let out = engine.reconcile_detailed(fix, FixOrigin::Live);

    let decision = out.decision.unwrap();
    assert_eq!(
        decision.branch,
        Branch::FusedAmbiguous {
            criterion: FusedCriterion::Bearing,
            resolved: Datum::Wgs84,
        }
    );
    assert_eq!(decision.action, Action::Transformed);
    assert_eq!(out.fix.coordinate, wgs84_to_gcj02(&f));
}

#[test]
fn test_drive_through_shanghai() {
    let (engine, clock) = deterministic_engine();
    let mut lat = SHANGHAI.0;

    for _ in 0..20 {
        let gps = fix_now(lat, SHANGHAI.1, ProviderKind::Gps, &clock).with_motion(10.0, 0.0);
        let out = engine.reconcile(gps.clone());
        assert_eq!(out.coordinate, wgs84_to_gcj02(&gps.coordinate));

        // A fused fix echoing the shifted GPS position is left alone.
        let echo = fix_now(
            out.coordinate.latitude,
            out.coordinate.longitude,
            ProviderKind::Fused,
            &clock,
        );
        assert_eq!(engine.reconcile(echo.clone()).coordinate, echo.coordinate);

        clock.advance_ms(1_000);
        lat += TEN_M;
    }

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.fixes_total, 40);
    assert_eq!(snapshot.branch("directly_transformable"), Some(20));
    assert_eq!(snapshot.branch("already_gcj02"), Some(20));
    assert_eq!(snapshot.drift_alerts, 0);
}

#[test]
fn test_host_offset_fused_fix_falls_back_to_cache() {
    let (engine, clock) = deterministic_engine();
    let shifted = engine.reconcile(fix_now(SHANGHAI.0, SHANGHAI.1, ProviderKind::Gps, &clock));
    clock.advance_ms(3_000);

    let odd = fix_now(31.24, 121.48, ProviderKind::Fused, &clock).with_flag(keys::IS_FIX_UPS, true);
    let out = engine.reconcile_detailed(odd, FixOrigin::Live);
    assert_eq!(out.decision.unwrap().branch, Branch::CacheFallback);
    assert_eq!(out.fix.coordinate, shifted.coordinate);
}

#[test]
fn test_concurrent_callers() {
    let (engine, _clock) = deterministic_engine();
    let engine = Arc::new(engine);

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for i in 0..50 {
                    let lat = 30.0 + f64::from(t) * 0.1 + f64::from(i) * 0.001;
                    let fix = LocationFix::new(Coordinate::new(lat, 120.0), ProviderKind::Gps)
                        .with_times(T0_MS, T0_NS);
                    let out = engine.reconcile(fix);
                    assert!(out.is_wgs2gcj() || out.coordinate == Coordinate::new(lat, 120.0));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.fixes_total, 400);
    assert_eq!(snapshot.decided(), 400);
    assert_eq!(snapshot.reentrant_bypasses, 0);
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn test_round_trip_within_five_meters(lat in 18.0..50.0_f64, lon in 75.0..130.0_f64) {
        let wgs = Coordinate::new(lat, lon);
        let back = gcj02_to_wgs84(&wgs84_to_gcj02(&wgs));
        prop_assert!(haversine_distance(&wgs, &back) <= 5.0);
    }

    #[test]
    fn test_outside_china_identity(lat in -60.0..60.0_f64, lon in -170.0..-30.0_f64) {
        let c = Coordinate::new(lat, lon);
        prop_assert_eq!(wgs84_to_gcj02(&c), c);
        prop_assert_eq!(gcj02_to_wgs84(&c), c);
    }

    #[test]
    fn test_every_fix_is_classified(
        lat in -90.0..90.0_f64,
        lon in -180.0..180.0_f64,
        provider in 0u8..6,
        age_ms in 0u64..900_000,
        fixed_up in any::<bool>(),
    ) {
        let (engine, clock) = deterministic_engine();
        engine.reconcile(fix_now(SHANGHAI.0, SHANGHAI.1, ProviderKind::Gps, &clock));
        clock.advance_ms(1_000);

        let fix = LocationFix::new(Coordinate::new(lat, lon), provider_from_index(provider))
            .with_times(clock.now_ms() - age_ms, clock.elapsed_realtime_ns())
            .with_flag(keys::IS_FIX_UPS, fixed_up);
        let out = engine.reconcile_detailed(fix.clone(), FixOrigin::Live);

        let decision = out.decision.expect("every fix gets a decision");
        if decision.action == Action::Unchanged {
            prop_assert_eq!(out.fix.coordinate, fix.coordinate);
        }
        if decision.branch == Branch::OutOfRegion {
            prop_assert_eq!(out.fix, fix);
        }
        prop_assert_eq!(engine.snapshot().decided(), 2);
    }
}
