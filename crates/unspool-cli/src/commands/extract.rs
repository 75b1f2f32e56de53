//! Extract command implementation.

use crate::cli::ExtractArgs;
use crate::error::add_archive_context;
use crate::error::convert_dest_error;
use crate::output::OutputFormatter;
use anyhow::Context;
use anyhow::Result;
use std::env;
use unspool_core::CancellationToken;
use unspool_core::CleanupTracker;
use unspool_core::DestDir;
use unspool_core::ExtractOptions;
use unspool_core::detect_format;
use unspool_core::extract;

pub fn execute(
    args: &ExtractArgs,
    formatter: &dyn OutputFormatter,
    cancel: &dyn CancellationToken,
) -> Result<()> {
    let output_dir = match &args.output_dir {
        Some(dir) => dir.clone(),
        None => env::current_dir().context("failed to get current directory")?,
    };

    let dest = if args.create {
        DestDir::create(&output_dir)
    } else {
        DestDir::new(&output_dir)
    }
    .map_err(|e| convert_dest_error(e, &output_dir))?;

    let format = add_archive_context(detect_format(&args.archive), &args.archive)?;
    let options = ExtractOptions::new()
        .with_strip_components(args.strip_components)
        .with_max_bytes(args.max_bytes);

    // Partial files from a failed or interrupted run are removed; complete
    // ones stay.
    let tracker = CleanupTracker::new();
    let result = extract(&args.archive, format, &dest, &options, cancel, &tracker);
    if result.is_err() {
        let removed = tracker.cleanup();
        if removed > 0 {
            tracing::info!(removed, "removed partially written files");
        }
    }
    let report = add_archive_context(result, &args.archive)?;

    formatter.format_extraction_result(&report)?;

    Ok(())
}
