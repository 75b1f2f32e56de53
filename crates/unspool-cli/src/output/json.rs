//! JSON output formatter for machine-readable results.

use super::formatter::JsonOutput;
use super::formatter::OutputFormatter;
use anyhow::Result;
use serde::Serialize;
use std::io::Write;
use std::io::{self};
use std::path::Path;
use unspool_core::ArchiveType;
use unspool_core::ExtractionReport;

pub struct JsonFormatter;

#[derive(Serialize)]
struct ExtractionOutput {
    files_extracted: usize,
    directories_created: usize,
    symlinks_created: usize,
    hardlinks_created: usize,
    bytes_written: u64,
    entries_skipped: usize,
    duration_ms: u128,
}

impl From<&ExtractionReport> for ExtractionOutput {
    fn from(report: &ExtractionReport) -> Self {
        Self {
            files_extracted: report.files_extracted,
            directories_created: report.directories_created,
            symlinks_created: report.symlinks_created,
            hardlinks_created: report.hardlinks_created,
            bytes_written: report.bytes_written,
            entries_skipped: report.entries_skipped,
            duration_ms: report.duration.as_millis(),
        }
    }
}

#[derive(Serialize)]
struct DetectionOutput {
    archive: String,
    format: &'static str,
    supported: bool,
}

impl JsonFormatter {
    fn output<T: Serialize>(value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        writeln!(io::stdout(), "{json}")?;
        Ok(())
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_extraction_result(&self, report: &ExtractionReport) -> Result<()> {
        Self::output(&JsonOutput::success("extract", ExtractionOutput::from(report)))
    }

    fn format_detection(&self, archive: &Path, format: ArchiveType) -> Result<()> {
        let data = DetectionOutput {
            archive: archive.display().to_string(),
            format: format.name(),
            supported: format.is_supported(),
        };
        Self::output(&JsonOutput::success("detect", data))
    }

    fn format_error(&self, operation: &str, error: &anyhow::Error) {
        let output = JsonOutput::error(operation, format!("{error:?}"));
        let _ = Self::output(&output);
    }
}
