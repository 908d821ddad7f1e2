//! INI configuration file.
//!
//! Settings live in `<config dir>/marsfix/config.ini`:
//!
//! ```ini
//! [reconciler]
//! distance_tolerance_m = 20
//! unknown_policy = forward_transform
//!
//! [region]
//! refresh = background
//!
//! [logging]
//! level = info
//!
//! [spoof]
//! enabled = false
//!
//! [providers]
//! wifi_fail = false
//! ```
//!
//! A missing file means defaults. Unknown sections and keys are ignored
//! on load so older binaries can read newer files.

mod keys;

pub use keys::ConfigKey;

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;
use tracing::{debug, info};

use crate::coord::Coordinate;
use crate::providers::ProviderFilter;
use crate::reconciler::ReconcilerConfig;
use crate::spoof::{FixedPosition, SpoofConfig};

/// Name of the configuration file.
pub const CONFIG_FILE_NAME: &str = "config.ini";

/// Errors reading or writing the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Directory for rolling log files; `None` logs to stderr only.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
            file_prefix: "marsfix.log".to_string(),
        }
    }
}

/// `[spoof]` section.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpoofSettings {
    pub enabled: bool,
    pub position: Option<Coordinate>,
    pub random_offset: bool,
}

impl SpoofSettings {
    /// The spoofing config when enabled with a position.
    pub fn active(&self) -> Option<SpoofConfig> {
        if !self.enabled {
            return None;
        }
        self.position.map(|p| SpoofConfig {
            latitude: p.latitude,
            longitude: p.longitude,
            random_offset: self.random_offset,
        })
    }
}

/// Everything stored in `config.ini`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigFile {
    pub reconciler: ReconcilerConfig,
    pub logging: LoggingConfig,
    pub spoof: SpoofSettings,
    pub providers: ProviderFilter,
}

impl ConfigFile {
    /// Loads from [`config_file_path`]. A missing file yields defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    pub fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        for key in ConfigKey::all() {
            if let Some(value) = ini.get_from(Some(key.section()), key.key_name()) {
                key.set(&mut config, value)?;
            }
        }
        Ok(config)
    }

    pub fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        for key in ConfigKey::all() {
            let value = key.get(self);
            if !value.is_empty() {
                ini.with_section(Some(key.section()))
                    .set(key.key_name(), value);
            }
        }
        ini
    }

    /// Writes to [`config_file_path`], creating the directory if needed.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        self.to_ini().write_to_file(path).map_err(write_err)?;
        info!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// A spoofer for the `[spoof]` section, when enabled.
    pub fn fixed_position(&self) -> Option<FixedPosition> {
        self.spoof.active().map(|c| FixedPosition::from_config(&c))
    }
}

/// `<config dir>/marsfix`, falling back to the working directory.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("marsfix")
}

pub fn config_file_path() -> PathBuf {
    config_dir().join(CONFIG_FILE_NAME)
}

/// Default directory for log files.
pub fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("marsfix")
        .join("logs")
}
