//! Engine telemetry for observability.
//!
//! Lock-free atomic counters record every decision the reconciler makes. A
//! [`TelemetrySnapshot`] is a point-in-time copy for display.
//!
//! ```text
//! Reconciler ─────► ReconcilerMetrics ─────► TelemetrySnapshot ─────► CLI
//!                   (atomic counters)        (point-in-time copy)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use marsfix::telemetry::ReconcilerMetrics;
//!
//! let metrics = ReconcilerMetrics::new();
//! metrics.fix_received();
//! let snapshot = metrics.snapshot();
//! println!("Fixes: {}", snapshot.fixes_total);
//! ```

mod metrics;
mod snapshot;

pub use metrics::ReconcilerMetrics;
pub use snapshot::TelemetrySnapshot;
