//! CLI argument parsing using clap.

use clap::ArgAction;
use clap::Parser;
use clap::Subcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "unspool")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase output and log verbosity (repeatable)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output results in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract archive contents
    Extract(ExtractArgs),
    /// Print the detected archive format
    Detect(DetectArgs),
}

#[derive(clap::Args)]
pub struct ExtractArgs {
    /// Path to the archive file
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,

    /// Output directory (default: current directory)
    #[arg(value_name = "OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Remove this many leading path components from entry names
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub strip_components: usize,

    /// Maximum total bytes written to files (0 disables the limit)
    #[arg(long, value_name = "SIZE", default_value = "8G", value_parser = parse_byte_size)]
    pub max_bytes: u64,

    /// Create the output directory if it does not exist
    #[arg(long)]
    pub create: bool,
}

#[derive(clap::Args)]
pub struct DetectArgs {
    /// Path to the archive file
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,
}

/// Parse byte size with optional suffix (K, M, G, T), optionally followed
/// by `B` or `iB`. Suffixes are binary and case-insensitive.
#[allow(clippy::option_if_let_else)]
fn parse_byte_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty byte size".to_string());
    }

    let upper = s.to_ascii_uppercase();
    let unit = upper
        .strip_suffix("IB")
        .or_else(|| upper.strip_suffix('B'))
        .unwrap_or(upper.as_str());

    let (num_str, multiplier) = if let Some(stripped) = unit.strip_suffix('T') {
        (stripped, 1024_u64.pow(4))
    } else if let Some(stripped) = unit.strip_suffix('G') {
        (stripped, 1024_u64.pow(3))
    } else if let Some(stripped) = unit.strip_suffix('M') {
        (stripped, 1024_u64.pow(2))
    } else if let Some(stripped) = unit.strip_suffix('K') {
        (stripped, 1024)
    } else {
        (unit, 1)
    };

    num_str
        .trim()
        .parse::<u64>()
        .map_err(|_| format!("invalid byte size: {s}"))
        .and_then(|n| {
            n.checked_mul(multiplier)
                .ok_or_else(|| format!("byte size overflow: {s}"))
        })
}
