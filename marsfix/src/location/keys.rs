//! Well-known metadata keys carried on a [`LocationFix`](super::LocationFix).

/// Set once the engine has shifted the fix from WGS-84 to GCJ-02.
pub const WGS2GCJ: &str = "wgs2gcj";

/// WGS-84 latitude before the shift.
pub const LAT_WGS84: &str = "latWgs84";

/// WGS-84 longitude before the shift.
pub const LNG_WGS84: &str = "lngWgs84";

/// GCJ-02 latitude after the shift.
pub const LAT_GCJ02: &str = "latGcj02";

/// GCJ-02 longitude after the shift.
pub const LNG_GCJ02: &str = "lngGcj02";

/// The host map application already offset this fix.
pub const IS_FIX_UPS: &str = "isFixUps";

/// Platform fused source type. Anything other than [`LOCATION_TYPE_RELIABLE`]
/// marks an unreliable fused fix.
pub const LOCATION_TYPE: &str = "locationType";

pub const LOCATION_TYPE_RELIABLE: f64 = 3.0;

/// The fix was produced by the spoofing mode.
pub const IS_FAKE: &str = "isFake";

/// Provider name suffix of a fix that is already in GCJ-02.
pub const GCJ02_PROVIDER_SUFFIX: &str = "@gcj02";
