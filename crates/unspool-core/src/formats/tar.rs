//! Tar archive driver.
//!
//! A tar archive is a single forward-only stream, so hard links whose
//! target has not been seen yet are queued and created in a second pass
//! once the stream is exhausted.

use std::io::Read;
use std::path::Path;
use std::path::PathBuf;

use ::tar::EntryType as TarEntryType;

use super::common::PayloadBound;
use super::common::extract_directory;
use super::common::extract_file;
use super::common::extract_hardlink;
use super::common::extract_symlink;
use super::common::finish_hardlink;
use super::traits::ArchiveFormat;
use crate::ExtractionError;
use crate::Result;
use crate::extraction::ExtractionContext;
use crate::extraction::PendingLinks;
use crate::types::ArchiveEntry;
use crate::types::EntryType;

/// Tar archive driver over any byte stream (possibly decompressed).
///
/// # Examples
///
/// ```no_run
/// use std::fs::File;
/// use unspool_core::DestDir;
/// use unspool_core::ExtractOptions;
/// use unspool_core::NeverCancel;
/// use unspool_core::NoopTracker;
/// use unspool_core::extraction::ExtractionContext;
/// use unspool_core::formats::ArchiveFormat;
/// use unspool_core::formats::TarArchive;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dest = DestDir::new("/tmp/out")?;
/// let mut ctx = ExtractionContext::new(&dest, ExtractOptions::new(), &NeverCancel, &NoopTracker);
/// TarArchive::new(File::open("archive.tar")?).extract(&mut ctx)?;
/// let report = ctx.finish();
/// # Ok(())
/// # }
/// ```
pub struct TarArchive<R: Read> {
    inner: ::tar::Archive<R>,
}

impl<R: Read> TarArchive<R> {
    /// Wraps a tar byte stream.
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self {
            inner: ::tar::Archive::new(reader),
        }
    }
}

fn read_error(e: &std::io::Error) -> ExtractionError {
    ExtractionError::InvalidArchive(format!("tar read error: {e}"))
}

fn header_error(name: &Path, what: &str, e: &std::io::Error) -> ExtractionError {
    ExtractionError::InvalidArchive(format!("invalid {what} for {}: {e}", name.display()))
}

impl<R: Read> ArchiveFormat for TarArchive<R> {
    fn extract(&mut self, ctx: &mut ExtractionContext<'_>) -> Result<()> {
        let mut entries = self.inner.entries().map_err(|e| read_error(&e))?;
        let mut pending = PendingLinks::new();

        loop {
            ctx.check_cancelled()?;
            let Some(next) = entries.next() else {
                break;
            };
            let mut entry = next.map_err(|e| read_error(&e))?;

            let name: PathBuf = entry
                .path()
                .map_err(|e| read_error(&e))?
                .into_owned();
            let header = entry.header();
            let mode = header.mode();
            let kind = header.entry_type();

            match kind {
                TarEntryType::Directory => extract_directory(ctx, &name)?,
                // Pre-POSIX archives mark directories with a trailing slash
                TarEntryType::Regular if entry.path_bytes().ends_with(b"/") => {
                    extract_directory(ctx, &name)?;
                }
                TarEntryType::Regular | TarEntryType::Continuous => {
                    // The exec bit decides the final file mode
                    let mode = mode.map_err(|e| header_error(&name, "mode", &e))?;
                    let size = entry.size();
                    let meta = ArchiveEntry::new(name, EntryType::File, size, Some(mode));
                    extract_file(ctx, &meta, &mut entry, PayloadBound::Exact)?;
                }
                TarEntryType::Symlink => {
                    let target = link_target(&entry, &name)?;
                    extract_symlink(ctx, &name, &target)?;
                }
                TarEntryType::Link => {
                    let target = link_target(&entry, &name)?;
                    if target.as_os_str().is_empty() {
                        ctx.skip(&name, "empty hard link target");
                        continue;
                    }
                    if let Some(link) = extract_hardlink(ctx, &name, &target)? {
                        pending.push(link);
                    }
                }
                other => {
                    tracing::warn!(
                        entry = %name.display(),
                        kind = ?other,
                        "skipping unsupported tar entry type"
                    );
                    ctx.skip(&name, "unsupported entry type");
                }
            }
        }

        if !pending.is_empty() {
            tracing::debug!(count = pending.len(), "creating deferred hard links");
        }
        for link in pending.drain() {
            ctx.check_cancelled()?;
            finish_hardlink(ctx, &link)?;
        }

        Ok(())
    }

    fn format_name(&self) -> &str {
        "tar"
    }
}

fn link_target<R: Read>(entry: &::tar::Entry<'_, R>, name: &Path) -> Result<PathBuf> {
    Ok(entry
        .link_name()
        .map_err(|e| header_error(name, "link name", &e))?
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_default())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::CleanupTracker;
    use crate::DestDir;
    use crate::ExtractOptions;
    use crate::ExtractionReport;
    use crate::NeverCancel;
    use crate::NoopTracker;
    use crate::test_utils::TarTestBuilder;
    use std::io::Cursor;
    use std::sync::atomic::AtomicBool;
    use tempfile::TempDir;

    fn create_test_dest() -> (TempDir, DestDir) {
        let temp = TempDir::new().expect("failed to create temp dir");
        let dest = DestDir::new(temp.path().to_path_buf()).expect("failed to create dest");
        (temp, dest)
    }

    fn run(data: Vec<u8>, dest: &DestDir, options: ExtractOptions) -> Result<ExtractionReport> {
        let mut ctx = ExtractionContext::new(dest, options, &NeverCancel, &NoopTracker);
        TarArchive::new(Cursor::new(data)).extract(&mut ctx)?;
        Ok(ctx.finish())
    }

    #[test]
    fn test_tar_format_name() {
        let archive = TarArchive::new(Cursor::new(Vec::new()));
        assert_eq!(archive.format_name(), "tar");
    }

    #[test]
    fn test_extract_files_and_directories() {
        let (_temp, dest) = create_test_dest();
        let data = TarTestBuilder::new()
            .add_directory("dir/")
            .add_file("dir/a.txt", b"alpha")
            .add_file("b.txt", b"beta")
            .build();

        let report = run(data, &dest, ExtractOptions::new()).unwrap();
        assert_eq!(report.files_extracted, 2);
        assert_eq!(report.directories_created, 1);
        assert_eq!(report.bytes_written, 9);
        assert_eq!(std::fs::read(dest.as_path().join("dir/a.txt")).unwrap(), b"alpha");
        assert_eq!(std::fs::read(dest.as_path().join("b.txt")).unwrap(), b"beta");
    }

    #[test]
    fn test_extract_empty_archive() {
        let (_temp, dest) = create_test_dest();
        let report = run(TarTestBuilder::new().build(), &dest, ExtractOptions::new()).unwrap();
        assert_eq!(report.total_items(), 0);
    }

    #[test]
    fn test_traversal_entry_rejected() {
        let (_temp, dest) = create_test_dest();
        let data = TarTestBuilder::new()
            .add_raw_file("../escape.txt", b"evil")
            .build();

        let err = run(data, &dest, ExtractOptions::new()).unwrap_err();
        assert!(matches!(err, ExtractionError::PathEscape { .. }));
        assert!(!dest.as_path().parent().unwrap().join("escape.txt").exists());
    }

    #[test]
    fn test_absolute_entry_anchored_at_root() {
        let (_temp, dest) = create_test_dest();
        let data = TarTestBuilder::new()
            .add_raw_file("/abs/file.txt", b"anchored")
            .build();

        run(data, &dest, ExtractOptions::new()).unwrap();
        assert_eq!(
            std::fs::read(dest.as_path().join("abs/file.txt")).unwrap(),
            b"anchored"
        );
    }

    #[test]
    fn test_strip_skips_emptied_entries() {
        let (_temp, dest) = create_test_dest();
        let data = TarTestBuilder::new()
            .add_directory("pkg/")
            .add_file("top.txt", b"dropped")
            .add_file("pkg/kept.txt", b"kept")
            .build();

        let options = ExtractOptions::new().with_strip_components(1);
        let report = run(data, &dest, options).unwrap();

        assert_eq!(report.entries_skipped, 2);
        assert_eq!(report.files_extracted, 1);
        assert!(dest.as_path().join("kept.txt").exists());
        assert!(!dest.as_path().join("top.txt").exists());
        assert!(!dest.as_path().join("pkg").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_deferred_hardlink_resolves() {
        let (_temp, dest) = create_test_dest();
        let data = TarTestBuilder::new()
            .add_hardlink("link", "later.txt")
            .add_file("later.txt", b"content")
            .build();

        let report = run(data, &dest, ExtractOptions::new()).unwrap();
        assert_eq!(report.hardlinks_created, 1);
        assert_eq!(std::fs::read(dest.as_path().join("link")).unwrap(), b"content");
    }

    #[test]
    fn test_missing_hardlink_target_fails_after_stream() {
        let (_temp, dest) = create_test_dest();
        let data = TarTestBuilder::new()
            .add_hardlink("link", "ghost.txt")
            .add_file("after.txt", b"still extracted")
            .build();

        let err = run(data, &dest, ExtractOptions::new()).unwrap_err();
        assert!(matches!(err, ExtractionError::TargetNotFound { .. }));
        // The rest of the stream was processed before failing
        assert!(dest.as_path().join("after.txt").exists());
    }

    #[test]
    fn test_unsupported_entry_type_skipped() {
        let (_temp, dest) = create_test_dest();
        let data = TarTestBuilder::new()
            .add_fifo("pipe")
            .add_file("file.txt", b"x")
            .build();

        let report = run(data, &dest, ExtractOptions::new()).unwrap();
        assert_eq!(report.entries_skipped, 1);
        assert!(std::fs::symlink_metadata(dest.as_path().join("pipe")).is_err());
    }

    #[test]
    fn test_budget_exceeded_by_declared_size() {
        let (_temp, dest) = create_test_dest();
        let data = TarTestBuilder::new()
            .add_file("a.bin", &[1u8; 600])
            .add_file("b.bin", &[2u8; 600])
            .build();

        let options = ExtractOptions::new().with_max_bytes(1000);
        let err = run(data, &dest, options).unwrap_err();
        assert!(matches!(
            err,
            ExtractionError::SizeLimitExceeded {
                limit: 1000,
                attempted: 1200
            }
        ));
        assert!(dest.as_path().join("a.bin").exists());
        assert!(!dest.as_path().join("b.bin").exists());
    }

    #[test]
    fn test_truncated_stream_is_an_error() {
        let (_temp, dest) = create_test_dest();
        let mut data = TarTestBuilder::new().add_file("big.bin", &[7u8; 4096]).build();
        data.truncate(512 + 1000);

        let tracker = CleanupTracker::new();
        let mut ctx = ExtractionContext::new(&dest, ExtractOptions::new(), &NeverCancel, &tracker);
        let result = TarArchive::new(Cursor::new(data)).extract(&mut ctx);

        assert!(result.is_err());
        assert!(!dest.as_path().join("big.bin").exists() || !tracker.is_empty());
    }

    #[test]
    fn test_unparsable_file_mode_rejected() {
        let (_temp, dest) = create_test_dest();
        let mut header = ::tar::Header::new_gnu();
        header.set_path("bad.bin").unwrap();
        header.set_size(3);
        header.set_entry_type(TarEntryType::Regular);
        header.as_old_mut().mode = *b"zzzzzzz\0";
        header.set_cksum();
        let mut builder = ::tar::Builder::new(Vec::new());
        builder.append(&header, &b"abc"[..]).unwrap();
        let data = builder.into_inner().unwrap();

        let err = run(data, &dest, ExtractOptions::new()).unwrap_err();
        assert!(matches!(&err, ExtractionError::InvalidArchive(msg) if msg.contains("mode")));
        assert!(!dest.as_path().join("bad.bin").exists());
    }

    #[test]
    fn test_cancelled_before_first_entry() {
        let (_temp, dest) = create_test_dest();
        let data = TarTestBuilder::new().add_file("a.txt", b"a").build();
        let cancel = AtomicBool::new(true);

        let mut ctx = ExtractionContext::new(&dest, ExtractOptions::new(), &cancel, &NoopTracker);
        let err = TarArchive::new(Cursor::new(data)).extract(&mut ctx).unwrap_err();
        assert!(err.is_cancelled());
        assert!(!dest.as_path().join("a.txt").exists());
    }
}
