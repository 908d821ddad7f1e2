//! marsfix CLI - diagnostics for the location reconciliation engine
//!
//! Converts coordinates between datums, checks region membership and
//! replays recorded fix streams through the engine.

mod commands;
mod error;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use marsfix::config::ConfigFile;
use marsfix::logging::init_logging;

use commands::config::ConfigCommands;
use commands::convert::ConvertArgs;
use commands::distance::DistanceArgs;
use commands::media::MediaCommands;
use commands::region::RegionArgs;
use commands::replay::ReplayArgs;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "marsfix")]
#[command(version, about = "WGS-84 / GCJ-02 location reconciliation tools", long_about = None)]
struct Cli {
    /// Log level or filter directive (overrides config; RUST_LOG wins over both)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Convert a coordinate between WGS-84, GCJ-02 and BD-09
    Convert(ConvertArgs),

    /// Show which territory coordinates fall in
    Region(RegionArgs),

    /// Distance and bearing between two coordinates
    Distance(DistanceArgs),

    /// Shift media geotags to GCJ-02
    #[command(subcommand)]
    Media(MediaCommands),

    /// Replay a JSON-lines stream of fixes through the engine
    Replay(ReplayArgs),

    /// View or modify configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn run(cli: Cli) -> Result<(), CliError> {
    let mut logging = ConfigFile::load()
        .map(|c| c.logging)
        .unwrap_or_default();
    if let Some(level) = cli.log_level {
        logging.level = level;
    }
    let _guard = init_logging(&logging)?;

    match cli.command {
        Commands::Convert(args) => commands::convert::run(args),
        Commands::Region(args) => commands::region::run(args),
        Commands::Distance(args) => commands::distance::run(args),
        Commands::Media(command) => commands::media::run(command),
        Commands::Replay(args) => commands::replay::run(args),
        Commands::Config(command) => commands::config::run(command),
    }
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
