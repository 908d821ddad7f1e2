//! `region`: report which territory a coordinate falls in.

use clap::Args;
use marsfix::region::territory_of;
use marsfix::Coordinate;

use crate::error::CliError;

#[derive(Debug, Args)]
pub struct RegionArgs {
    /// One or more coordinates as "lat,lon"
    #[arg(required = true, allow_hyphen_values = true)]
    pub coordinates: Vec<String>,
}

pub fn run(args: RegionArgs) -> Result<(), CliError> {
    for text in &args.coordinates {
        let coord: Coordinate = text.parse()?;
        let territory = territory_of(&coord);
        let verdict = if territory.is_reconciled() {
            "reconciled"
        } else {
            "untouched"
        };
        println!("{coord}  {territory}  ({verdict})");
    }
    Ok(())
}
