//! `replay`: run a recorded fix stream through the engine.
//!
//! Input is JSON lines, one [`LocationFix`] per line. The engine clock is
//! moved to each fix's own timestamps before it is reconciled, so a replay
//! gives the same decisions every time.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use marsfix::config::ConfigFile;
use marsfix::region::RegionRefresh;
use marsfix::{FixOrigin, LocationFix, ManualClock, Reconciler};
use serde_json::json;

use crate::error::CliError;

#[derive(Debug, Args)]
pub struct ReplayArgs {
    /// JSON-lines file of fixes; reads stdin when omitted
    pub input: Option<PathBuf>,

    /// Print the telemetry summary as JSON
    #[arg(long)]
    pub json_summary: bool,

    /// Only print the summary
    #[arg(long, short)]
    pub quiet: bool,

    /// Config file to take tolerances from instead of the default one
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Loads the replay config. A malformed file is an error, not a silent
/// fallback to defaults.
fn load_config(path: Option<&Path>) -> Result<ConfigFile, CliError> {
    let config = match path {
        Some(path) => ConfigFile::load_from(path)?,
        None => ConfigFile::load()?,
    };
    Ok(config)
}

pub fn run(args: ReplayArgs) -> Result<(), CliError> {
    let file_config = load_config(args.config.as_deref())?;
    let mut config = file_config.reconciler.clone();
    config.region_refresh = RegionRefresh::Inline;

    let clock = Arc::new(ManualClock::new(0, 0));
    let engine = Reconciler::new(config).with_clock(clock.clone());
    let spoof = file_config
        .fixed_position()
        .map(|spoof| spoof.with_clock(clock.clone()));
    let providers = file_config.providers;

    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut skipped = 0u64;

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }
        let fix: LocationFix = serde_json::from_str(&line).map_err(|e| CliError::Replay {
            line: index + 1,
            reason: e.to_string(),
        })?;

        if !providers.is_enabled(&fix.provider) {
            skipped += 1;
            tracing::debug!(provider = %fix.provider, line = index + 1, "Provider disabled, skipping");
            continue;
        }

        clock.set(fix.time_ms, fix.elapsed_realtime_ns);
        let fix = match &spoof {
            Some(spoof) => spoof.apply(fix),
            None => fix,
        };
        let input = fix.coordinate;
        let outcome = engine.reconcile_detailed(fix, FixOrigin::Live);

        if !args.quiet {
            let record = json!({
                "line": index + 1,
                "input": input,
                "output": outcome.fix.coordinate,
                "provider": outcome.fix.provider,
                "decision": outcome.decision,
            });
            writeln!(out, "{record}")?;
        }
    }

    let snapshot = engine.snapshot();
    if args.json_summary {
        writeln!(out, "{}", serde_json::to_string_pretty(&snapshot)?)?;
    } else {
        writeln!(out)?;
        write!(out, "{snapshot}")?;
        if skipped > 0 {
            writeln!(out, "Skipped:      {skipped} (disabled providers)")?;
        }
    }
    Ok(())
}
