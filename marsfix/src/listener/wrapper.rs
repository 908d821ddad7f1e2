//! The listener that sits between the registry and a subscriber.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

use super::{LocationListener, WrapperHandle};
use crate::location::LocationFix;
use crate::reconciler::Reconciler;

/// Reconciles every fix before handing it to the wrapped listener.
pub(crate) struct ReconcilingListener {
    handle: WrapperHandle,
    inner: Arc<dyn LocationListener>,
    engine: Arc<Reconciler>,
    /// Set for single-update registrations; cleared on first delivery.
    pending_single: Option<AtomicBool>,
}

impl ReconcilingListener {
    pub(crate) fn new(
        handle: WrapperHandle,
        inner: Arc<dyn LocationListener>,
        engine: Arc<Reconciler>,
    ) -> Self {
        Self {
            handle,
            inner,
            engine,
            pending_single: None,
        }
    }

    pub(crate) fn single(
        handle: WrapperHandle,
        inner: Arc<dyn LocationListener>,
        engine: Arc<Reconciler>,
    ) -> Self {
        Self {
            pending_single: Some(AtomicBool::new(true)),
            ..Self::new(handle, inner, engine)
        }
    }

    /// False once a single-update wrapper has delivered.
    fn accepts_delivery(&self) -> bool {
        match &self.pending_single {
            None => true,
            Some(pending) => pending.swap(false, Ordering::AcqRel),
        }
    }
}

impl LocationListener for ReconcilingListener {
    fn on_location_changed(&self, fix: LocationFix) {
        if !self.accepts_delivery() {
            debug!(handle = %self.handle, "Dropping delivery after single update");
            return;
        }
        self.inner.on_location_changed(self.engine.reconcile(fix));
    }

    fn on_locations_changed(&self, fixes: Vec<LocationFix>) {
        if !self.accepts_delivery() {
            debug!(handle = %self.handle, "Dropping batch after single update");
            return;
        }
        let fixes = fixes.into_iter().map(|f| self.engine.reconcile(f)).collect();
        self.inner.on_locations_changed(fixes);
    }

    fn on_provider_enabled(&self, provider: &str) {
        self.inner.on_provider_enabled(provider);
    }

    fn on_provider_disabled(&self, provider: &str) {
        self.inner.on_provider_disabled(provider);
    }

    fn on_flush_complete(&self, request_code: i32) {
        self.inner.on_flush_complete(request_code);
    }
}
