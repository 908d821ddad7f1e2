//! `media`: shift ISO-6709 geotags or EXIF pairs to GCJ-02.

use clap::Subcommand;
use marsfix::media::{transform_exif_lat_long, transform_iso6709};
use marsfix::Coordinate;

use crate::error::CliError;

#[derive(Debug, Subcommand)]
pub enum MediaCommands {
    /// Shift an ISO-6709 location string (e.g. "+23.1584+113.3839/")
    Iso6709 {
        #[arg(allow_hyphen_values = true)]
        text: String,
    },

    /// Shift an EXIF latitude/longitude pair given as "lat,lon"
    Exif {
        #[arg(allow_hyphen_values = true)]
        coordinate: String,
    },
}

pub fn run(command: MediaCommands) -> Result<(), CliError> {
    match command {
        MediaCommands::Iso6709 { text } => {
            println!("{}", transform_iso6709(&text)?);
        }
        MediaCommands::Exif { coordinate } => {
            let c: Coordinate = coordinate.parse()?;
            let [lat, lon] = transform_exif_lat_long([c.latitude, c.longitude]);
            println!("{}", Coordinate::new(lat, lon));
        }
    }
    Ok(())
}
