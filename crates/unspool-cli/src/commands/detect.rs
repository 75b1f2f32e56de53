//! Detect command implementation.

use crate::cli::DetectArgs;
use crate::error::add_archive_context;
use crate::output::OutputFormatter;
use anyhow::Result;
use unspool_core::detect_format;

pub fn execute(args: &DetectArgs, formatter: &dyn OutputFormatter) -> Result<()> {
    let format = add_archive_context(detect_format(&args.archive), &args.archive)?;
    formatter.format_detection(&args.archive, format)
}
