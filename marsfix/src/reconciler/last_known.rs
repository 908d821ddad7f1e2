//! Last-known-location lookups used when the engine's own memory is stale.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::location::{LocationFix, ProviderKind};

/// Providers whose last fix is raw WGS-84, in lookup order.
const RAW_PROVIDERS: [ProviderKind; 2] = [ProviderKind::Gps, ProviderKind::Network];

/// Providers whose `@gcj02` mirrors are consulted, in lookup order.
const MIRRORED_PROVIDERS: [ProviderKind; 4] = [
    ProviderKind::Gps,
    ProviderKind::Network,
    ProviderKind::Passive,
    ProviderKind::Fused,
];

/// Answers "what was the last fix of this provider?".
///
/// Implementations must not call back into the engine that owns them.
pub trait LastKnownSource: Send + Sync {
    fn last_known(&self, provider: &ProviderKind) -> Option<LocationFix>;
}

fn within_window(fix: &LocationFix, now_ms: u64, window_ms: u64) -> bool {
    fix.time_ms <= now_ms && now_ms - fix.time_ms <= window_ms
}

/// Most recent raw `gps` or `network` fix younger than `window_ms`.
pub(crate) fn find_raw(
    source: &dyn LastKnownSource,
    now_ms: u64,
    window_ms: u64,
) -> Option<LocationFix> {
    RAW_PROVIDERS
        .iter()
        .filter_map(|p| source.last_known(p))
        .find(|fix| within_window(fix, now_ms, window_ms))
}

/// Most recent `*@gcj02` fix younger than `window_ms`.
pub(crate) fn find_gcj02(
    source: &dyn LastKnownSource,
    now_ms: u64,
    window_ms: u64,
) -> Option<LocationFix> {
    MIRRORED_PROVIDERS
        .iter()
        .filter_map(|p| source.last_known(&p.gcj02_variant()))
        .find(|fix| within_window(fix, now_ms, window_ms))
}

/// A [`LastKnownSource`] backed by a map, fed by the host or a replay.
#[derive(Debug, Default)]
pub struct InMemoryLastKnown {
    fixes: RwLock<HashMap<String, LocationFix>>,
}

impl InMemoryLastKnown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `fix` as the latest of its provider.
    pub fn update(&self, fix: LocationFix) {
        self.fixes.write().insert(fix.provider.name().to_string(), fix);
    }

    pub fn clear(&self) {
        self.fixes.write().clear();
    }
}

impl LastKnownSource for InMemoryLastKnown {
    fn last_known(&self, provider: &ProviderKind) -> Option<LocationFix> {
        self.fixes.read().get(provider.name()).cloned()
    }
}
