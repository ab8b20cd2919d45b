//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Download a file without blocking, with live progress.
///
/// Hauler fetches large remote artifacts (installers, runtime packages)
/// while reporting speed, a stabilized average speed, and time remaining.
#[derive(Parser, Debug)]
#[command(name = "hauler")]
#[command(author, version, about)]
pub struct Args {
    /// URL to download
    pub url: String,

    /// Output file path (defaults to the URL's filename in the current directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Remove an existing destination file before downloading
    #[arg(long)]
    pub overwrite: bool,

    /// Poll interval in milliseconds (50-1000)
    #[arg(long, default_value_t = 150, value_parser = clap::value_parser!(u64).range(50..=1000))]
    pub interval: u64,

    /// Emit one JSON progress snapshot per poll on stdout instead of a progress bar
    #[arg(long)]
    pub json: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}
