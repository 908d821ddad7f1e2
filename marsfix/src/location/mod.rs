//! Location fixes, provider kinds and the records the engine keeps.

mod fix;
pub mod keys;
mod record;

pub use fix::{LocationFix, Metadata, MetadataValue, ProviderKind};
pub use record::{LatLngRecord, Motion, RecordTimes};
