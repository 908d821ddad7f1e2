//! Every setting addressable as `section.key`.

use std::path::PathBuf;
use std::str::FromStr;

use super::{ConfigError, ConfigFile};
use crate::coord::Coordinate;
use crate::reconciler;
use crate::region;

/// A single configuration setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    DistanceToleranceM,
    SpeedToleranceMps,
    BearingToleranceDeg,
    StaleFixMs,
    FixExpiryMs,
    LastGcj02ExpiryMs,
    PureExpiryMs,
    CacheFallbackMs,
    UnknownPolicy,
    FingerprintCapacity,
    DriftWarnM,
    DriftAlertM,
    JumpToleranceM,
    CheckAmbiguousReliability,

    RegionRefreshIntervalMs,
    RegionRefresh,

    LoggingLevel,
    LoggingDirectory,
    LoggingFilePrefix,

    SpoofEnabled,
    SpoofLatitude,
    SpoofLongitude,
    SpoofRandomOffset,

    ProvidersWifiFail,
    ProvidersCellFail,
    ProvidersPassiveFail,
    ProvidersFusedFail,
}

const ALL: &[ConfigKey] = &[
    ConfigKey::DistanceToleranceM,
    ConfigKey::SpeedToleranceMps,
    ConfigKey::BearingToleranceDeg,
    ConfigKey::StaleFixMs,
    ConfigKey::FixExpiryMs,
    ConfigKey::LastGcj02ExpiryMs,
    ConfigKey::PureExpiryMs,
    ConfigKey::CacheFallbackMs,
    ConfigKey::UnknownPolicy,
    ConfigKey::FingerprintCapacity,
    ConfigKey::DriftWarnM,
    ConfigKey::DriftAlertM,
    ConfigKey::JumpToleranceM,
    ConfigKey::CheckAmbiguousReliability,
    ConfigKey::RegionRefreshIntervalMs,
    ConfigKey::RegionRefresh,
    ConfigKey::LoggingLevel,
    ConfigKey::LoggingDirectory,
    ConfigKey::LoggingFilePrefix,
    ConfigKey::SpoofEnabled,
    ConfigKey::SpoofLatitude,
    ConfigKey::SpoofLongitude,
    ConfigKey::SpoofRandomOffset,
    ConfigKey::ProvidersWifiFail,
    ConfigKey::ProvidersCellFail,
    ConfigKey::ProvidersPassiveFail,
    ConfigKey::ProvidersFusedFail,
];

fn invalid(key: ConfigKey, value: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.name(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn parse_num<T: FromStr>(key: ConfigKey, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(key, value, "expected a number"))
}

fn parse_bool(key: ConfigKey, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(invalid(key, value, "expected true or false")),
    }
}

impl ConfigKey {
    pub fn all() -> &'static [ConfigKey] {
        ALL
    }

    pub fn section(&self) -> &'static str {
        use ConfigKey::*;
        match self {
            DistanceToleranceM | SpeedToleranceMps | BearingToleranceDeg | StaleFixMs
            | FixExpiryMs | LastGcj02ExpiryMs | PureExpiryMs | CacheFallbackMs | UnknownPolicy
            | FingerprintCapacity | DriftWarnM | DriftAlertM | JumpToleranceM
            | CheckAmbiguousReliability => "reconciler",
            RegionRefreshIntervalMs | RegionRefresh => "region",
            LoggingLevel | LoggingDirectory | LoggingFilePrefix => "logging",
            SpoofEnabled | SpoofLatitude | SpoofLongitude | SpoofRandomOffset => "spoof",
            ProvidersWifiFail | ProvidersCellFail | ProvidersPassiveFail | ProvidersFusedFail => {
                "providers"
            }
        }
    }

    pub fn key_name(&self) -> &'static str {
        use ConfigKey::*;
        match self {
            DistanceToleranceM => "distance_tolerance_m",
            SpeedToleranceMps => "speed_tolerance_mps",
            BearingToleranceDeg => "bearing_tolerance_deg",
            StaleFixMs => "stale_fix_ms",
            FixExpiryMs => "fix_expiry_ms",
            LastGcj02ExpiryMs => "last_gcj02_expiry_ms",
            PureExpiryMs => "pure_expiry_ms",
            CacheFallbackMs => "cache_fallback_ms",
            UnknownPolicy => "unknown_policy",
            FingerprintCapacity => "fingerprint_capacity",
            DriftWarnM => "drift_warn_m",
            DriftAlertM => "drift_alert_m",
            JumpToleranceM => "jump_tolerance_m",
            CheckAmbiguousReliability => "check_ambiguous_reliability",
            RegionRefreshIntervalMs => "refresh_interval_ms",
            RegionRefresh => "refresh",
            LoggingLevel => "level",
            LoggingDirectory => "directory",
            LoggingFilePrefix => "file_prefix",
            SpoofEnabled => "enabled",
            SpoofLatitude => "latitude",
            SpoofLongitude => "longitude",
            SpoofRandomOffset => "random_offset",
            ProvidersWifiFail => "wifi_fail",
            ProvidersCellFail => "cell_fail",
            ProvidersPassiveFail => "passive_fail",
            ProvidersFusedFail => "fused_fail",
        }
    }

    /// `section.key`
    pub fn name(&self) -> String {
        format!("{}.{}", self.section(), self.key_name())
    }

    /// Current value as text; empty when unset.
    pub fn get(&self, config: &ConfigFile) -> String {
        use ConfigKey::*;
        let r = &config.reconciler;
        match self {
            DistanceToleranceM => r.distance_tolerance_m.to_string(),
            SpeedToleranceMps => r.speed_tolerance_mps.to_string(),
            BearingToleranceDeg => r.bearing_tolerance_deg.to_string(),
            StaleFixMs => r.stale_fix_ms.to_string(),
            FixExpiryMs => r.fix_expiry_ms.to_string(),
            LastGcj02ExpiryMs => r.last_gcj02_expiry_ms.to_string(),
            PureExpiryMs => r.pure_expiry_ms.to_string(),
            CacheFallbackMs => r.cache_fallback_ms.to_string(),
            UnknownPolicy => r.unknown_policy.name().to_string(),
            FingerprintCapacity => r.fingerprint_capacity.to_string(),
            DriftWarnM => r.drift_warn_m.to_string(),
            DriftAlertM => r.drift_alert_m.to_string(),
            JumpToleranceM => r.jump_tolerance_m.to_string(),
            CheckAmbiguousReliability => r.check_ambiguous_reliability.to_string(),
            RegionRefreshIntervalMs => r.region_refresh_interval_ms.to_string(),
            RegionRefresh => r.region_refresh.name().to_string(),
            LoggingLevel => config.logging.level.clone(),
            LoggingDirectory => config
                .logging
                .directory
                .as_ref()
                .map(|d| d.display().to_string())
                .unwrap_or_default(),
            LoggingFilePrefix => config.logging.file_prefix.clone(),
            SpoofEnabled => config.spoof.enabled.to_string(),
            SpoofLatitude => config
                .spoof
                .position
                .map(|p| p.latitude.to_string())
                .unwrap_or_default(),
            SpoofLongitude => config
                .spoof
                .position
                .map(|p| p.longitude.to_string())
                .unwrap_or_default(),
            SpoofRandomOffset => config.spoof.random_offset.to_string(),
            ProvidersWifiFail => config.providers.wifi_fail.to_string(),
            ProvidersCellFail => config.providers.cell_fail.to_string(),
            ProvidersPassiveFail => config.providers.passive_fail.to_string(),
            ProvidersFusedFail => config.providers.fused_fail.to_string(),
        }
    }

    /// Parses `value` into the setting.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        use ConfigKey::*;
        let key = *self;
        let r = &mut config.reconciler;
        match self {
            DistanceToleranceM => r.distance_tolerance_m = parse_num(key, value)?,
            SpeedToleranceMps => r.speed_tolerance_mps = parse_num(key, value)?,
            BearingToleranceDeg => r.bearing_tolerance_deg = parse_num(key, value)?,
            StaleFixMs => r.stale_fix_ms = parse_num(key, value)?,
            FixExpiryMs => r.fix_expiry_ms = parse_num(key, value)?,
            LastGcj02ExpiryMs => r.last_gcj02_expiry_ms = parse_num(key, value)?,
            PureExpiryMs => r.pure_expiry_ms = parse_num(key, value)?,
            CacheFallbackMs => r.cache_fallback_ms = parse_num(key, value)?,
            UnknownPolicy => {
                r.unknown_policy = reconciler::UnknownPolicy::from_name(value)
                    .ok_or_else(|| invalid(key, value, "expected forward_transform or pass_through"))?
            }
            FingerprintCapacity => {
                let capacity: u64 = parse_num(key, value)?;
                if capacity == 0 {
                    return Err(invalid(key, value, "must be at least 1"));
                }
                r.fingerprint_capacity = capacity;
            }
            DriftWarnM => r.drift_warn_m = parse_num(key, value)?,
            DriftAlertM => r.drift_alert_m = parse_num(key, value)?,
            JumpToleranceM => r.jump_tolerance_m = parse_num(key, value)?,
            CheckAmbiguousReliability => r.check_ambiguous_reliability = parse_bool(key, value)?,
            RegionRefreshIntervalMs => r.region_refresh_interval_ms = parse_num(key, value)?,
            RegionRefresh => {
                r.region_refresh = region::RegionRefresh::from_name(value)
                    .ok_or_else(|| invalid(key, value, "expected background or inline"))?
            }
            LoggingLevel => config.logging.level = value.trim().to_string(),
            LoggingDirectory => {
                let value = value.trim();
                config.logging.directory = (!value.is_empty()).then(|| PathBuf::from(value));
            }
            LoggingFilePrefix => config.logging.file_prefix = value.trim().to_string(),
            SpoofEnabled => config.spoof.enabled = parse_bool(key, value)?,
            SpoofLatitude | SpoofLongitude if value.trim().is_empty() => {
                config.spoof.position = None;
            }
            SpoofLatitude => {
                let lat: f64 = parse_num(key, value)?;
                let lon = config.spoof.position.map_or(0.0, |p| p.longitude);
                config.spoof.position = Some(
                    Coordinate::checked(lat, lon).map_err(|e| invalid(key, value, e.to_string()))?,
                );
            }
            SpoofLongitude => {
                let lon: f64 = parse_num(key, value)?;
                let lat = config.spoof.position.map_or(0.0, |p| p.latitude);
                config.spoof.position = Some(
                    Coordinate::checked(lat, lon).map_err(|e| invalid(key, value, e.to_string()))?,
                );
            }
            SpoofRandomOffset => config.spoof.random_offset = parse_bool(key, value)?,
            ProvidersWifiFail => config.providers.wifi_fail = parse_bool(key, value)?,
            ProvidersCellFail => config.providers.cell_fail = parse_bool(key, value)?,
            ProvidersPassiveFail => config.providers.passive_fail = parse_bool(key, value)?,
            ProvidersFusedFail => config.providers.fused_fail = parse_bool(key, value)?,
        }
        Ok(())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ALL.iter()
            .copied()
            .find(|k| k.name() == wanted)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}
