//! `convert`: move a coordinate between datums.

use clap::Args;
use marsfix::{Coordinate, Datum};

use crate::error::CliError;

#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// Coordinate as "lat,lon"
    #[arg(allow_hyphen_values = true)]
    pub coordinate: String,

    /// Datum of the input (wgs84, gcj02, bd09)
    #[arg(long, default_value = "wgs84")]
    pub from: Datum,

    /// Datum of the output (wgs84, gcj02, bd09)
    #[arg(long, default_value = "gcj02")]
    pub to: Datum,
}

pub fn run(args: ConvertArgs) -> Result<(), CliError> {
    let input: Coordinate = args.coordinate.parse()?;
    let output = Datum::convert(&input, args.from, args.to);
    let shift = marsfix::coord::haversine_distance(&input, &output);

    tracing::debug!(%input, %output, from = %args.from, to = %args.to, "Converted");
    println!("{output}");
    println!("  {} -> {}, shifted {:.1} m", args.from, args.to, shift);
    Ok(())
}
