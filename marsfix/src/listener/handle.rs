//! Identities used by the listener multiplexer.

use std::fmt;

/// Opaque handle of a reconciling wrapper installed with the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WrapperHandle(u64);

impl WrapperHandle {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for WrapperHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wrapper#{}", self.0)
    }
}

/// Who a registration belongs to.
///
/// A wrapper can itself be registered (a host that wraps listeners it is
/// handed), which chains wrappers together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerId {
    /// Identity chosen by the caller, stable across registrations.
    Caller(u64),
    /// A wrapper previously returned by the multiplexer.
    Wrapper(WrapperHandle),
}

impl From<WrapperHandle> for ListenerId {
    fn from(handle: WrapperHandle) -> Self {
        ListenerId::Wrapper(handle)
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenerId::Caller(id) => write!(f, "caller#{id}"),
            ListenerId::Wrapper(handle) => handle.fmt(f),
        }
    }
}
