//! `distance`: great-circle distance and bearing between two points.

use clap::Args;
use marsfix::coord::{bearing, haversine_distance};
use marsfix::Coordinate;

use crate::error::CliError;

#[derive(Debug, Args)]
pub struct DistanceArgs {
    /// Start as "lat,lon"
    #[arg(allow_hyphen_values = true)]
    pub from: String,

    /// End as "lat,lon"
    #[arg(allow_hyphen_values = true)]
    pub to: String,
}

pub fn run(args: DistanceArgs) -> Result<(), CliError> {
    let from: Coordinate = args.from.parse()?;
    let to: Coordinate = args.to.parse()?;
    println!(
        "{:.1} m, bearing {:.1}°",
        haversine_distance(&from, &to),
        bearing(&from, &to)
    );
    Ok(())
}
