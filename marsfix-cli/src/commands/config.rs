//! Configuration management CLI commands.
//!
//! `config get|set|list|reset|path` for the INI file read by the engine.

use clap::Subcommand;
use marsfix::config::{config_file_path, ConfigFile, ConfigKey};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Get a configuration value
    Get {
        /// Configuration key in format section.key (e.g., reconciler.distance_tolerance_m)
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key in format section.key (e.g., reconciler.distance_tolerance_m)
        key: String,

        /// Value to set
        value: String,
    },

    /// List configuration settings
    List {
        /// Only show one section (e.g., reconciler)
        #[arg(long)]
        section: Option<String>,
    },

    /// Restore defaults for one key, or for every key when none is given
    Reset {
        key: Option<String>,
    },

    /// Show the configuration file path
    Path,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Get { key } => run_get(&key),
        ConfigCommands::Set { key, value } => run_set(&key, &value),
        ConfigCommands::List { section } => run_list(section.as_deref()),
        ConfigCommands::Reset { key } => run_reset(key.as_deref()),
        ConfigCommands::Path => run_path(),
    }
}

fn parse_key(key: &str) -> Result<ConfigKey, CliError> {
    key.parse().map_err(|_| {
        CliError::Config(format!(
            "Unknown configuration key '{}'. Use 'marsfix config list' to see available keys.",
            key
        ))
    })
}

/// Get a configuration value.
fn run_get(key: &str) -> Result<(), CliError> {
    let config_key = parse_key(key)?;

    let config = ConfigFile::load()?;
    let value = config_key.get(&config);

    if value.is_empty() {
        println!("(not set)");
    } else {
        println!("{}", value);
    }

    Ok(())
}

/// Set a configuration value.
fn run_set(key: &str, value: &str) -> Result<(), CliError> {
    let config_key = parse_key(key)?;

    let mut config = ConfigFile::load()?;
    config_key.set(&mut config, value)?;
    config.save()?;

    println!("Set {} = {}", config_key.name(), value);

    Ok(())
}

/// List configuration settings, marking values changed from the default.
fn run_list(section: Option<&str>) -> Result<(), CliError> {
    let config = ConfigFile::load()?;
    let defaults = ConfigFile::default();

    println!("Configuration ({})", config_file_path().display());

    let mut current_section = "";
    for key in ConfigKey::all() {
        if section.is_some_and(|s| s != key.section()) {
            continue;
        }
        if key.section() != current_section {
            current_section = key.section();
            println!();
            println!("[{}]", current_section);
        }

        let value = key.get(&config);
        let marker = if value != key.get(&defaults) { "  *" } else { "" };
        if value.is_empty() {
            println!("  {} = (not set){}", key.key_name(), marker);
        } else {
            println!("  {} = {}{}", key.key_name(), value, marker);
        }
    }

    Ok(())
}

/// Restore one key, or the whole file, to defaults.
fn run_reset(key: Option<&str>) -> Result<(), CliError> {
    let defaults = ConfigFile::default();
    let Some(key) = key else {
        defaults.save()?;
        println!("Reset all settings to defaults");
        return Ok(());
    };

    let config_key = parse_key(key)?;
    let mut config = ConfigFile::load()?;
    let default_value = config_key.get(&defaults);
    config_key.set(&mut config, &default_value)?;
    config.save()?;

    println!("Reset {} = {}", config_key.name(), default_value);
    Ok(())
}

/// Show the configuration file path.
fn run_path() -> Result<(), CliError> {
    println!("{}", config_file_path().display());
    Ok(())
}
