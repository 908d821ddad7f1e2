//! marsfix - location reconciliation for mainland China
//!
//! Positions inside mainland China are expected by local maps in GCJ-02, a
//! deliberately offset datum, while satellite receivers report WGS-84. Some
//! sources (network and fused providers, host apps that already apply the
//! offset) hand out GCJ-02 directly. Mixing the two produces the familiar
//! "drift" of a few hundred meters.
//!
//! [`Reconciler`] decides, fix by fix, which datum a position is in and
//! shifts it to GCJ-02 exactly once. [`ListenerMultiplexer`] puts the
//! reconciler in front of location listeners.
//!
//! ```
//! use marsfix::{Coordinate, LocationFix, ProviderKind, Reconciler, ReconcilerConfig};
//!
//! let engine = Reconciler::new(ReconcilerConfig::deterministic());
//! let fix = LocationFix::new(Coordinate::new(40.7128, -74.0060), ProviderKind::Gps);
//! let out = engine.reconcile(fix.clone());
//! assert_eq!(out.coordinate, fix.coordinate);
//! ```

pub mod clock;
pub mod config;
pub mod coord;
pub mod listener;
pub mod location;
pub mod logging;
pub mod media;
pub mod providers;
pub mod reconciler;
pub mod region;
pub mod spoof;
pub mod telemetry;

pub use clock::{Clock, ManualClock, SystemClock};
pub use coord::{CoordError, Coordinate, Datum};
pub use listener::{ListenerId, ListenerMultiplexer, LocationListener, UpdateRegistry, WrapperHandle};
pub use location::{LatLngRecord, LocationFix, ProviderKind};
pub use reconciler::{Action, Branch, Decision, FixOrigin, Outcome, Reconciler, ReconcilerConfig};
pub use region::is_in_reconciliation_region;
pub use telemetry::TelemetrySnapshot;
