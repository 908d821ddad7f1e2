//! Location fixes as delivered by providers.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::keys;
use crate::coord::Coordinate;

/// Source of a location fix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProviderKind {
    Gps,
    Network,
    Passive,
    Fused,
    /// Any other provider name, including `*@gcj02` markers.
    Other(String),
}

impl ProviderKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "gps" => ProviderKind::Gps,
            "network" => ProviderKind::Network,
            "passive" => ProviderKind::Passive,
            "fused" => ProviderKind::Fused,
            other => ProviderKind::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ProviderKind::Gps => "gps",
            ProviderKind::Network => "network",
            ProviderKind::Passive => "passive",
            ProviderKind::Fused => "fused",
            ProviderKind::Other(name) => name,
        }
    }

    /// True when the provider name marks an already-offset fix.
    pub fn is_gcj02_marked(&self) -> bool {
        self.name().ends_with(keys::GCJ02_PROVIDER_SUFFIX)
    }

    /// The `*@gcj02` provider that mirrors this one.
    pub fn gcj02_variant(&self) -> ProviderKind {
        if self.is_gcj02_marked() {
            return self.clone();
        }
        ProviderKind::Other(format!("{}{}", self.name(), keys::GCJ02_PROVIDER_SUFFIX))
    }
}

impl From<String> for ProviderKind {
    fn from(name: String) -> Self {
        ProviderKind::from_name(&name)
    }
}

impl From<ProviderKind> for String {
    fn from(kind: ProviderKind) -> Self {
        kind.name().to_string()
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single metadata value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

/// Free-form key/value bag attached to a fix.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(BTreeMap<String, MetadataValue>);

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: MetadataValue) {
        self.0.insert(key.into(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<MetadataValue> {
        self.0.remove(key)
    }

    /// Reads a boolean flag; absent or non-boolean values read as false.
    pub fn flag(&self, key: &str) -> bool {
        matches!(self.0.get(key), Some(MetadataValue::Bool(true)))
    }

    pub fn set_flag(&mut self, key: &str, value: bool) {
        self.insert(key, MetadataValue::Bool(value));
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        match self.0.get(key) {
            Some(MetadataValue::Number(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn set_number(&mut self, key: &str, value: f64) {
        self.insert(key, MetadataValue::Number(value));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &MetadataValue)> {
        self.0.iter()
    }
}

/// One observed location.
///
/// `time_ms` is wall-clock milliseconds since the Unix epoch and
/// `elapsed_realtime_ns` is the monotonic boot clock, both stamped by the
/// provider that produced the fix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    pub coordinate: Coordinate,
    pub provider: ProviderKind,
    #[serde(default)]
    pub time_ms: u64,
    #[serde(default)]
    pub elapsed_realtime_ns: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed_mps: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearing_deg: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy_m: Option<f32>,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl LocationFix {
    pub fn new(coordinate: Coordinate, provider: ProviderKind) -> Self {
        Self {
            coordinate,
            provider,
            time_ms: 0,
            elapsed_realtime_ns: 0,
            speed_mps: None,
            bearing_deg: None,
            accuracy_m: None,
            metadata: Metadata::new(),
        }
    }

    pub fn with_times(mut self, time_ms: u64, elapsed_realtime_ns: u64) -> Self {
        self.time_ms = time_ms;
        self.elapsed_realtime_ns = elapsed_realtime_ns;
        self
    }

    /// False when the provider left both clocks at zero.
    pub fn has_times(&self) -> bool {
        self.time_ms != 0 || self.elapsed_realtime_ns != 0
    }

    pub fn with_motion(mut self, speed_mps: f32, bearing_deg: f32) -> Self {
        self.speed_mps = Some(speed_mps);
        self.bearing_deg = Some(bearing_deg);
        self
    }

    pub fn with_accuracy(mut self, accuracy_m: f32) -> Self {
        self.accuracy_m = Some(accuracy_m);
        self
    }

    pub fn with_flag(mut self, key: &str, value: bool) -> Self {
        self.metadata.set_flag(key, value);
        self
    }

    pub fn with_number(mut self, key: &str, value: f64) -> Self {
        self.metadata.set_number(key, value);
        self
    }

    /// True once the engine has shifted this fix to GCJ-02.
    pub fn is_wgs2gcj(&self) -> bool {
        self.metadata.flag(keys::WGS2GCJ)
    }

    pub fn is_fix_ups(&self) -> bool {
        self.metadata.flag(keys::IS_FIX_UPS)
    }

    pub fn is_fake(&self) -> bool {
        self.metadata.flag(keys::IS_FAKE)
    }

    /// Platform fused source type, if reported.
    pub fn location_type(&self) -> Option<f64> {
        self.metadata.number(keys::LOCATION_TYPE)
    }

    /// WGS-84 coordinate recorded before a shift, if stamped.
    pub fn stamped_wgs84(&self) -> Option<Coordinate> {
        let lat = self.metadata.number(keys::LAT_WGS84)?;
        let lon = self.metadata.number(keys::LNG_WGS84)?;
        Some(Coordinate::new(lat, lon))
    }

    /// GCJ-02 coordinate recorded after a shift, if stamped.
    pub fn stamped_gcj02(&self) -> Option<Coordinate> {
        let lat = self.metadata.number(keys::LAT_GCJ02)?;
        let lon = self.metadata.number(keys::LNG_GCJ02)?;
        Some(Coordinate::new(lat, lon))
    }

    /// Replaces the coordinate and records the WGS-84/GCJ-02 pair.
    pub(crate) fn stamp_gcj02(&mut self, wgs84: Coordinate, gcj02: Coordinate) {
        self.metadata.set_number(keys::LAT_WGS84, wgs84.latitude);
        self.metadata.set_number(keys::LNG_WGS84, wgs84.longitude);
        self.mark_gcj02(gcj02);
    }

    /// Replaces the coordinate with one known to be GCJ-02 when the raw
    /// WGS-84 position is unknown.
    pub(crate) fn mark_gcj02(&mut self, gcj02: Coordinate) {
        self.coordinate = gcj02;
        self.metadata.set_number(keys::LAT_GCJ02, gcj02.latitude);
        self.metadata.set_number(keys::LNG_GCJ02, gcj02.longitude);
        self.metadata.set_flag(keys::WGS2GCJ, true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_names_roundtrip() {
        for name in ["gps", "network", "passive", "fused", "gps@gcj02", "custom"] {
            assert_eq!(ProviderKind::from_name(name).name(), name);
        }
        assert_eq!(ProviderKind::from_name("gps"), ProviderKind::Gps);
    }

    #[test]
    fn test_gcj02_marker() {
        assert!(ProviderKind::from_name("network@gcj02").is_gcj02_marked());
        assert!(!ProviderKind::Network.is_gcj02_marked());
        assert_eq!(ProviderKind::Fused.gcj02_variant().name(), "fused@gcj02");
        let marked = ProviderKind::from_name("gps@gcj02");
        assert_eq!(marked.gcj02_variant(), marked);
    }

    #[test]
    fn test_metadata_flag_reads() {
        let fix = LocationFix::new(Coordinate::new(1.0, 2.0), ProviderKind::Gps)
            .with_flag(keys::IS_FIX_UPS, true)
            .with_number(keys::LOCATION_TYPE, 1.0);
        assert!(fix.is_fix_ups());
        assert!(!fix.is_wgs2gcj());
        assert_eq!(fix.location_type(), Some(1.0));
    }

    #[test]
    fn test_stamp_records_pair() {
        let wgs = Coordinate::new(31.2304, 121.4737);
        let gcj = Coordinate::new(31.2284577, 121.4782231);
        let mut fix = LocationFix::new(wgs, ProviderKind::Gps);
        fix.stamp_gcj02(wgs, gcj);
        assert_eq!(fix.coordinate, gcj);
        assert!(fix.is_wgs2gcj());
        assert_eq!(fix.stamped_wgs84(), Some(wgs));
        assert_eq!(fix.stamped_gcj02(), Some(gcj));
    }

    #[test]
    fn test_mark_leaves_wgs84_keys_unset() {
        let gcj = Coordinate::new(31.2284577, 121.4782231);
        let mut fix = LocationFix::new(Coordinate::new(31.0, 121.0), ProviderKind::Fused);
        fix.mark_gcj02(gcj);
        assert_eq!(fix.coordinate, gcj);
        assert!(fix.is_wgs2gcj());
        assert_eq!(fix.stamped_wgs84(), None);
    }

    #[test]
    fn test_json_shape() {
        let json = r#"{
            "coordinate": {"latitude": 31.2304, "longitude": 121.4737},
            "provider": "fused",
            "time_ms": 1700000000000,
            "elapsed_realtime_ns": 5000000000,
            "speed_mps": 1.5,
            "metadata": {"locationType": 3, "isFixUps": false, "note": "x"}
        }"#;
        let fix: LocationFix = serde_json::from_str(json).unwrap();
        assert_eq!(fix.provider, ProviderKind::Fused);
        assert_eq!(fix.speed_mps, Some(1.5));
        assert_eq!(fix.bearing_deg, None);
        assert_eq!(fix.location_type(), Some(3.0));
        assert_eq!(
            fix.metadata.get("note"),
            Some(&MetadataValue::Text("x".to_string()))
        );

        let back: LocationFix = serde_json::from_str(&serde_json::to_string(&fix).unwrap()).unwrap();
        assert_eq!(back, fix);
    }
}
