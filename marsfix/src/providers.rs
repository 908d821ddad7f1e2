//! Simulated provider failures.
//!
//! Lets a user pretend that Wi-Fi, cell, passive or fused positioning is
//! unavailable. Wi-Fi and cell together back the network provider, so it
//! only reports disabled when both are failed.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::location::{keys, ProviderKind};

/// Which sources are pretended to be down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderFilter {
    pub wifi_fail: bool,
    pub cell_fail: bool,
    pub passive_fail: bool,
    pub fused_fail: bool,
}

impl ProviderFilter {
    /// True when nothing is failed.
    pub fn is_passthrough(&self) -> bool {
        *self == Self::default()
    }

    pub fn is_enabled(&self, provider: &ProviderKind) -> bool {
        match provider {
            ProviderKind::Network => !(self.wifi_fail && self.cell_fail),
            ProviderKind::Passive => !self.passive_fail,
            ProviderKind::Fused => !self.fused_fail,
            ProviderKind::Gps => true,
            ProviderKind::Other(name) => {
                if let Some(base) = name.strip_suffix(keys::GCJ02_PROVIDER_SUFFIX) {
                    self.is_enabled(&ProviderKind::from_name(base))
                } else {
                    true
                }
            }
        }
    }

    /// Drops disabled providers, keeping order.
    pub fn filter<'a, I>(&self, providers: I) -> Vec<ProviderKind>
    where
        I: IntoIterator<Item = &'a ProviderKind>,
    {
        providers
            .into_iter()
            .filter(|p| self.is_enabled(p))
            .cloned()
            .collect()
    }

    /// Vetoes a disabled "best provider" choice.
    pub fn best_provider(&self, chosen: Option<ProviderKind>) -> Option<ProviderKind> {
        match chosen {
            Some(p) if !self.is_enabled(&p) => {
                debug!(provider = %p, "Best provider vetoed");
                None
            }
            other => other,
        }
    }
}
