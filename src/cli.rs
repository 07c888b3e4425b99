use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "tomorrow", version, about = "Current conditions and a 7-day forecast.")]
pub struct Cli {
    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Weather for a city by name
    Search {
        #[arg(required = true, num_args = 1..)]
        city: Vec<String>,
    },
    /// Weather at a latitude/longitude
    Coords {
        #[arg(allow_negative_numbers = true)]
        latitude: f64,
        #[arg(allow_negative_numbers = true)]
        longitude: f64,
    },
    /// Weather at the current position
    Here,
    /// The featured cities panel
    Featured {
        /// Keep running and reprint whenever the panel refreshes
        #[arg(long)]
        watch: bool,
        /// Look up this featured city after the panel loads (1-based)
        #[arg(long)]
        select: Option<usize>,
    },
}
