//! Archive extraction that never writes outside its destination directory.
//!
//! `unspool-core` extracts tar (plain, gzip, bzip2, xz, zstd) and zip
//! archives. Every entry name, symlink target and hard-link target is
//! resolved against the destination root, following symlinks that already
//! exist on disk, before anything is written. Regular file payloads are
//! copied in bounded chunks under a byte budget counted from the bytes
//! actually written, so archives that understate their sizes cannot
//! exhaust the disk.
//!
//! # Examples
//!
//! ```no_run
//! use unspool_core::ExtractOptions;
//! use unspool_core::extract_archive;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let options = ExtractOptions::new()
//!     .with_strip_components(1)
//!     .with_max_bytes(8 << 30);
//! let report = extract_archive("archive.tar.gz", "/output/dir", &options)?;
//! println!("Extracted {} files", report.files_extracted);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod archive;
pub mod cancel;
pub mod config;
pub mod copy;
pub mod error;
pub mod extraction;
pub mod formats;
pub mod report;
pub mod security;
pub mod tracker;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
#[doc(hidden)]
pub mod test_utils;

// Re-export main API types
pub use api::extract;
pub use api::extract_archive;
pub use archive::Archive;
pub use archive::ArchiveBuilder;
pub use cancel::CancellationToken;
pub use cancel::NeverCancel;
pub use config::ExtractOptions;
pub use error::EscapeReason;
pub use error::ExtractionError;
pub use error::Result;
pub use formats::ArchiveType;
pub use formats::detect_format;
pub use report::ExtractionReport;
pub use tracker::ArtifactTracker;
pub use tracker::CleanupTracker;
pub use tracker::NoopTracker;

// Re-export types module for easier access
pub use types::ArchiveEntry;
pub use types::DestDir;
pub use types::EntryType;
pub use types::ResolvedPath;
