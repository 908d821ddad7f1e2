//! Listener multiplexing.
//!
//! Subscribers never see raw fixes: each callback handed to
//! [`ListenerMultiplexer::register_listener`] is wrapped in a listener that
//! runs the fix through the [`Reconciler`] first. The wrapper, not the
//! callback, is what gets installed with the platform's [`UpdateRegistry`].
//!
//! ```text
//! registry ──► wrapper(handle) ──► Reconciler::reconcile ──► callback
//! ```
//!
//! Every registration gets its own wrapper, so registering the same id three
//! times installs three wrappers. Unregistering removes the most recent one.
//! Wrappers can themselves be registered; removing a wrapper walks that chain
//! and removes every link hanging off it.

mod handle;
mod wrapper;

pub use handle::{ListenerId, WrapperHandle};

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::location::LocationFix;
use crate::reconciler::Reconciler;
use wrapper::ReconcilingListener;

/// Receiver of location updates.
pub trait LocationListener: Send + Sync {
    fn on_location_changed(&self, fix: LocationFix);

    /// Batched delivery. Defaults to one call per fix, in order.
    fn on_locations_changed(&self, fixes: Vec<LocationFix>) {
        for fix in fixes {
            self.on_location_changed(fix);
        }
    }

    fn on_provider_enabled(&self, _provider: &str) {}

    fn on_provider_disabled(&self, _provider: &str) {}

    fn on_flush_complete(&self, _request_code: i32) {}
}

/// The platform primitive that actually delivers updates.
pub trait UpdateRegistry: Send + Sync {
    fn request_updates(&self, handle: WrapperHandle, listener: Arc<dyn LocationListener>);

    fn remove_updates(&self, handle: WrapperHandle);
}

#[derive(Default)]
struct Registrations {
    /// Live wrapper handles per id, oldest first. Never empty.
    by_id: HashMap<ListenerId, Vec<WrapperHandle>>,
    wrappers: HashMap<WrapperHandle, Arc<ReconcilingListener>>,
}

impl Registrations {
    /// Forgets `handle` and every wrapper registered on top of it. Returns
    /// the removed handles in walk order.
    fn remove_chain(&mut self, handle: WrapperHandle) -> Vec<WrapperHandle> {
        let mut chain = Vec::new();
        let mut pending = vec![handle];
        while let Some(current) = pending.pop() {
            if chain.contains(&current) {
                continue;
            }
            self.wrappers.remove(&current);
            chain.push(current);
            if let Some(stacked) = self.by_id.remove(&ListenerId::Wrapper(current)) {
                pending.extend(stacked.into_iter().rev());
            }
        }
        chain
    }
}

/// Maps caller listeners to reconciling wrappers.
pub struct ListenerMultiplexer {
    engine: Arc<Reconciler>,
    registry: Arc<dyn UpdateRegistry>,
    registrations: Mutex<Registrations>,
    next_handle: AtomicU64,
}

impl ListenerMultiplexer {
    pub fn new(engine: Arc<Reconciler>, registry: Arc<dyn UpdateRegistry>) -> Self {
        Self {
            engine,
            registry,
            registrations: Mutex::new(Registrations::default()),
            next_handle: AtomicU64::new(1),
        }
    }

    fn allocate_handle(&self) -> WrapperHandle {
        WrapperHandle::new(self.next_handle.fetch_add(1, Ordering::Relaxed))
    }

    /// Installs a new reconciling wrapper for `id` and returns its handle.
    pub fn register_listener(
        &self,
        id: ListenerId,
        callback: Arc<dyn LocationListener>,
    ) -> WrapperHandle {
        let handle = self.allocate_handle();
        let wrapper = Arc::new(ReconcilingListener::new(
            handle,
            callback,
            Arc::clone(&self.engine),
        ));
        {
            let mut regs = self.registrations.lock();
            regs.by_id.entry(id).or_default().push(handle);
            regs.wrappers.insert(handle, Arc::clone(&wrapper));
        }

        debug!(%id, %handle, "Requesting updates");
        self.registry.request_updates(handle, wrapper);
        handle
    }

    /// Installs a wrapper that delivers at most once. No mapping is kept.
    pub fn register_single(
        &self,
        id: ListenerId,
        callback: Arc<dyn LocationListener>,
    ) -> WrapperHandle {
        let handle = self.allocate_handle();
        let wrapper = Arc::new(ReconcilingListener::single(
            handle,
            callback,
            Arc::clone(&self.engine),
        ));
        debug!(%id, %handle, "Requesting single update");
        self.registry.request_updates(handle, wrapper);
        handle
    }

    /// Drops the most recent registration of `id`, along with any wrappers
    /// stacked on it. Returns false for unknown ids.
    pub fn unregister_listener(&self, id: ListenerId) -> bool {
        let removed = {
            let mut regs = self.registrations.lock();
            let Some(handles) = regs.by_id.get_mut(&id) else {
                return false;
            };
            let Some(handle) = handles.pop() else {
                regs.by_id.remove(&id);
                return false;
            };
            if handles.is_empty() {
                regs.by_id.remove(&id);
            }
            let chain = regs.remove_chain(handle);
            if chain.len() > 1 {
                info!(%id, links = chain.len(), "Removed wrapper chain");
            }
            chain
        };

        for handle in removed {
            debug!(%id, %handle, "Removing updates");
            self.registry.remove_updates(handle);
        }
        true
    }

    /// Number of live registrations of `id`.
    pub fn registration_count(&self, id: ListenerId) -> Option<u32> {
        self.registrations
            .lock()
            .by_id
            .get(&id)
            .map(|handles| handles.len() as u32)
    }

    /// Handles of the live wrappers for `id`, oldest first.
    pub fn handles_of(&self, id: ListenerId) -> Vec<WrapperHandle> {
        self.registrations
            .lock()
            .by_id
            .get(&id)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of mapped ids.
    pub fn len(&self) -> usize {
        self.registrations.lock().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn engine(&self) -> &Arc<Reconciler> {
        &self.engine
    }
}

impl fmt::Debug for ListenerMultiplexer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerMultiplexer")
            .field("registrations", &self.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::coord::Coordinate;
    use crate::location::ProviderKind;
    use crate::reconciler::ReconcilerConfig;

    #[derive(Default)]
    struct RecordingRegistry {
        requested: Mutex<Vec<WrapperHandle>>,
        removed: Mutex<Vec<WrapperHandle>>,
        installed: Mutex<HashMap<WrapperHandle, Arc<dyn LocationListener>>>,
    }

    impl RecordingRegistry {
        fn deliver(&self, handle: WrapperHandle, fix: LocationFix) {
            let listener = self.installed.lock().get(&handle).cloned();
            if let Some(listener) = listener {
                listener.on_location_changed(fix);
            }
        }
    }

    impl UpdateRegistry for RecordingRegistry {
        fn request_updates(&self, handle: WrapperHandle, listener: Arc<dyn LocationListener>) {
            self.requested.lock().push(handle);
            self.installed.lock().insert(handle, listener);
        }

        fn remove_updates(&self, handle: WrapperHandle) {
            self.removed.lock().push(handle);
            self.installed.lock().remove(&handle);
        }
    }

    #[derive(Default)]
    struct Collector {
        fixes: Mutex<Vec<LocationFix>>,
        enabled: Mutex<Vec<String>>,
    }

    impl LocationListener for Collector {
        fn on_location_changed(&self, fix: LocationFix) {
            self.fixes.lock().push(fix);
        }

        fn on_provider_enabled(&self, provider: &str) {
            self.enabled.lock().push(provider.to_string());
        }
    }

    fn setup() -> (ListenerMultiplexer, Arc<RecordingRegistry>) {
        let clock = Arc::new(ManualClock::new(1_700_000_000_000, 50_000_000_000));
        let engine = Arc::new(
            Reconciler::new(ReconcilerConfig::deterministic()).with_clock(clock),
        );
        let registry = Arc::new(RecordingRegistry::default());
        let mux = ListenerMultiplexer::new(engine, registry.clone());
        (mux, registry)
    }

    fn gps_fix(lat: f64, lon: f64) -> LocationFix {
        LocationFix::new(Coordinate::new(lat, lon), ProviderKind::Gps)
            .with_times(1_700_000_000_000, 50_000_000_000)
    }

    #[test]
    fn test_each_registration_gets_own_wrapper() {
        let (mux, registry) = setup();
        let cb: Arc<dyn LocationListener> = Arc::new(Collector::default());
        let id = ListenerId::Caller(7);

        let h1 = mux.register_listener(id, cb.clone());
        let h2 = mux.register_listener(id, cb.clone());
        assert_ne!(h1, h2);
        assert_eq!(mux.registration_count(id), Some(2));
        assert_eq!(mux.handles_of(id), vec![h1, h2]);
        assert_eq!(registry.requested.lock().as_slice(), &[h1, h2]);
    }

    #[test]
    fn test_distinct_ids_get_distinct_wrappers() {
        let (mux, _) = setup();
        let cb: Arc<dyn LocationListener> = Arc::new(Collector::default());
        let a = mux.register_listener(ListenerId::Caller(1), cb.clone());
        let b = mux.register_listener(ListenerId::Caller(2), cb);
        assert_ne!(a, b);
        assert_eq!(mux.len(), 2);
    }

    #[test]
    fn test_unregister_decrements() {
        let (mux, registry) = setup();
        let cb: Arc<dyn LocationListener> = Arc::new(Collector::default());
        let id = ListenerId::Caller(3);
        let first = mux.register_listener(id, cb.clone());
        let second = mux.register_listener(id, cb.clone());
        let third = mux.register_listener(id, cb);

        assert!(mux.unregister_listener(id));
        assert_eq!(mux.registration_count(id), Some(2));
        assert_eq!(mux.handles_of(id), vec![first, second]);
        assert_eq!(registry.removed.lock().as_slice(), &[third]);
        assert_eq!(registry.installed.lock().len(), 2);

        assert!(mux.unregister_listener(id));
        assert!(mux.unregister_listener(id));
        assert_eq!(registry.removed.lock().as_slice(), &[third, second, first]);
        assert!(!mux.unregister_listener(id));
    }

    #[test]
    fn test_remaining_registrations_keep_delivering() {
        let (mux, registry) = setup();
        let collector = Arc::new(Collector::default());
        let id = ListenerId::Caller(6);
        let first = mux.register_listener(id, collector.clone());
        let second = mux.register_listener(id, collector.clone());
        mux.register_listener(id, collector.clone());

        assert!(mux.unregister_listener(id));
        registry.deliver(first, gps_fix(31.2304, 121.4737));
        registry.deliver(second, gps_fix(31.2304, 121.4737));

        let fixes = collector.fixes.lock();
        assert_eq!(fixes.len(), 2);
        assert!(fixes.iter().all(|f| f.is_wgs2gcj()));
    }

    #[test]
    fn test_removing_one_handle_keeps_sibling_chain() {
        let (mux, registry) = setup();
        let cb: Arc<dyn LocationListener> = Arc::new(Collector::default());
        let id = ListenerId::Caller(8);
        let older = mux.register_listener(id, cb.clone());
        let stacked = mux.register_listener(older.into(), cb.clone());
        let newer = mux.register_listener(id, cb);

        assert!(mux.unregister_listener(id));
        assert_eq!(registry.removed.lock().as_slice(), &[newer]);
        assert_eq!(mux.handles_of(older.into()), vec![stacked]);

        assert!(mux.unregister_listener(id));
        assert_eq!(registry.removed.lock().as_slice(), &[newer, older, stacked]);
        assert!(mux.is_empty());
    }

    #[test]
    fn test_unregister_last_removes_mapping() {
        let (mux, registry) = setup();
        let cb: Arc<dyn LocationListener> = Arc::new(Collector::default());
        let id = ListenerId::Caller(4);
        let handle = mux.register_listener(id, cb);

        assert!(mux.unregister_listener(id));
        assert_eq!(mux.registration_count(id), None);
        assert!(mux.is_empty());
        assert_eq!(registry.removed.lock().as_slice(), &[handle]);
    }

    #[test]
    fn test_unregister_unknown_is_noop() {
        let (mux, registry) = setup();
        assert!(!mux.unregister_listener(ListenerId::Caller(99)));
        assert!(registry.removed.lock().is_empty());
    }

    #[test]
    fn test_unregister_walks_wrapper_chain() {
        let (mux, registry) = setup();
        let cb: Arc<dyn LocationListener> = Arc::new(Collector::default());
        let id = ListenerId::Caller(5);
        let first = mux.register_listener(id, cb.clone());
        let second = mux.register_listener(first.into(), cb.clone());
        let third = mux.register_listener(second.into(), cb);
        assert_eq!(mux.len(), 3);

        assert!(mux.unregister_listener(id));
        assert!(mux.is_empty());
        assert_eq!(registry.removed.lock().as_slice(), &[first, second, third]);
    }

    #[test]
    fn test_wrapper_reconciles_before_forwarding() {
        let (mux, registry) = setup();
        let collector = Arc::new(Collector::default());
        let handle = mux.register_listener(ListenerId::Caller(1), collector.clone());

        registry.deliver(handle, gps_fix(31.2304, 121.4737));

        let fixes = collector.fixes.lock();
        assert_eq!(fixes.len(), 1);
        assert!(fixes[0].is_wgs2gcj());
        assert_ne!(fixes[0].coordinate, Coordinate::new(31.2304, 121.4737));
    }

    #[test]
    fn test_batch_delivery_reconciles_each() {
        let (mux, registry) = setup();
        let collector = Arc::new(Collector::default());
        let handle = mux.register_listener(ListenerId::Caller(1), collector.clone());
        let listener = registry.installed.lock().get(&handle).cloned().unwrap();

        listener.on_locations_changed(vec![
            gps_fix(31.2304, 121.4737),
            gps_fix(40.7128, -74.0060),
        ]);

        let fixes = collector.fixes.lock();
        assert_eq!(fixes.len(), 2);
        assert!(fixes[0].is_wgs2gcj());
        assert_eq!(fixes[1].coordinate, Coordinate::new(40.7128, -74.0060));
    }

    #[test]
    fn test_provider_events_forwarded() {
        let (mux, registry) = setup();
        let collector = Arc::new(Collector::default());
        let handle = mux.register_listener(ListenerId::Caller(1), collector.clone());
        let listener = registry.installed.lock().get(&handle).cloned().unwrap();

        listener.on_provider_enabled("gps");
        assert_eq!(collector.enabled.lock().as_slice(), &["gps".to_string()]);
    }

    #[test]
    fn test_single_delivers_once_without_mapping() {
        let (mux, registry) = setup();
        let collector = Arc::new(Collector::default());
        let handle = mux.register_single(ListenerId::Caller(1), collector.clone());
        assert!(mux.is_empty());

        registry.deliver(handle, gps_fix(31.2304, 121.4737));
        registry.deliver(handle, gps_fix(31.2305, 121.4738));
        assert_eq!(collector.fixes.lock().len(), 1);
    }
}
