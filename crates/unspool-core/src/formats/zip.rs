//! Zip archive driver.

use std::io::Read;
use std::io::Seek;
use std::path::Path;
use std::path::PathBuf;

use super::common::PayloadBound;
use super::common::extract_directory;
use super::common::extract_file;
use super::common::extract_symlink;
use super::traits::ArchiveFormat;
use crate::ExtractionError;
use crate::Result;
use crate::extraction::ExtractionContext;
use crate::types::ArchiveEntry;
use crate::types::EntryType;

/// Largest symlink target accepted from a zip payload, in bytes.
pub const MAX_SYMLINK_TARGET: usize = 4096;

const S_IFMT: u32 = 0o170_000;
const S_IFDIR: u32 = 0o040_000;
const S_IFLNK: u32 = 0o120_000;

/// Zip archive driver.
///
/// Entries are visited in central-directory order. Declared uncompressed
/// sizes are never trusted for the byte budget; only decoded bytes count.
pub struct ZipArchive<R: Read + Seek> {
    inner: ::zip::ZipArchive<R>,
}

impl<R: Read + Seek> ZipArchive<R> {
    /// Opens a zip archive by reading its central directory.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::InvalidArchive`] if the central directory
    /// cannot be parsed.
    pub fn new(reader: R) -> Result<Self> {
        Ok(Self {
            inner: ::zip::ZipArchive::new(reader)?,
        })
    }

    /// Number of entries in the central directory.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if the archive has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Classification from the entry's directory flag and Unix mode bits.
/// The directory check wins over the symlink check.
fn classify(is_dir: bool, unix_mode: Option<u32>) -> Kind {
    let file_type = unix_mode.map(|mode| mode & S_IFMT);
    if is_dir || file_type == Some(S_IFDIR) {
        Kind::Directory
    } else if file_type == Some(S_IFLNK) {
        Kind::Symlink
    } else {
        Kind::File
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Directory,
    Symlink,
    File,
}

impl<R: Read + Seek> ArchiveFormat for ZipArchive<R> {
    fn extract(&mut self, ctx: &mut ExtractionContext<'_>) -> Result<()> {
        for index in 0..self.inner.len() {
            ctx.check_cancelled()?;

            let mut file = self.inner.by_index(index)?;
            let name = PathBuf::from(file.name());
            let mode = file.unix_mode();

            match classify(file.is_dir(), mode) {
                Kind::Directory => extract_directory(ctx, &name)?,
                Kind::Symlink => {
                    let target = read_symlink_target(&mut file, &name)?;
                    extract_symlink(ctx, &name, &target)?;
                }
                Kind::File => {
                    let entry = ArchiveEntry::new(name, EntryType::File, file.size(), mode);
                    extract_file(ctx, &entry, &mut file, PayloadBound::Untrusted)?;
                }
            }
        }
        Ok(())
    }

    fn format_name(&self) -> &str {
        "zip"
    }
}

/// Reads a symlink payload, refusing anything over [`MAX_SYMLINK_TARGET`].
fn read_symlink_target<R: Read>(reader: &mut R, name: &Path) -> Result<PathBuf> {
    let mut buf = Vec::with_capacity(256);
    reader
        .take(MAX_SYMLINK_TARGET as u64 + 1)
        .read_to_end(&mut buf)
        .map_err(ExtractionError::entry_io("read symlink target of", name))?;

    if buf.len() > MAX_SYMLINK_TARGET {
        return Err(ExtractionError::SymlinkTargetTooLong {
            path: name.to_path_buf(),
            limit: MAX_SYMLINK_TARGET,
        });
    }
    Ok(bytes_to_path(buf))
}

#[cfg(unix)]
fn bytes_to_path(bytes: Vec<u8>) -> PathBuf {
    use std::os::unix::ffi::OsStringExt;
    PathBuf::from(std::ffi::OsString::from_vec(bytes))
}

#[cfg(not(unix))]
fn bytes_to_path(bytes: Vec<u8>) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(&bytes).into_owned())
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
    use crate::test_utils::ZipTestBuilder;
    use crate::test_utils::patch_zip_uncompressed_size;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn create_test_dest() -> (TempDir, DestDir) {
        let temp = TempDir::new().expect("failed to create temp dir");
        let dest = DestDir::new(temp.path().to_path_buf()).expect("failed to create dest");
        (temp, dest)
    }

    fn run(data: Vec<u8>, dest: &DestDir, options: ExtractOptions) -> Result<ExtractionReport> {
        let mut ctx = ExtractionContext::new(dest, options, &NeverCancel, &NoopTracker);
        ZipArchive::new(Cursor::new(data))?.extract(&mut ctx)?;
        Ok(ctx.finish())
    }

    #[test]
    fn test_classify_order() {
        assert_eq!(classify(true, Some(0o120_777)), Kind::Directory);
        assert_eq!(classify(false, Some(0o040_755)), Kind::Directory);
        assert_eq!(classify(false, Some(0o120_777)), Kind::Symlink);
        assert_eq!(classify(false, Some(0o100_644)), Kind::File);
        assert_eq!(classify(false, None), Kind::File);
    }

    #[test]
    fn test_zip_format_name() {
        let data = ZipTestBuilder::new().build();
        let archive = ZipArchive::new(Cursor::new(data)).unwrap();
        assert_eq!(archive.format_name(), "zip");
        assert!(archive.is_empty());
    }

    #[test]
    fn test_invalid_zip_rejected() {
        let Err(err) = ZipArchive::new(Cursor::new(vec![b'x'; 256])) else {
            panic!("garbage accepted as a zip archive");
        };
        assert!(matches!(err, ExtractionError::InvalidArchive(_)));
    }

    #[test]
    fn test_extract_files_and_directories() {
        let (_temp, dest) = create_test_dest();
        let data = ZipTestBuilder::new()
            .add_directory("dir/")
            .add_file("dir/a.txt", b"alpha")
            .add_deflated_file("b.txt", b"beta beta beta")
            .build();

        let report = run(data, &dest, ExtractOptions::new()).unwrap();
        assert_eq!(report.files_extracted, 2);
        assert_eq!(report.directories_created, 1);
        assert_eq!(report.bytes_written, 19);
        assert_eq!(
            std::fs::read(dest.as_path().join("b.txt")).unwrap(),
            b"beta beta beta"
        );
    }

    #[test]
    fn test_traversal_entry_rejected() {
        let (_temp, dest) = create_test_dest();
        let data = ZipTestBuilder::new().add_file("../evil.txt", b"x").build();

        let err = run(data, &dest, ExtractOptions::new()).unwrap_err();
        assert!(matches!(err, ExtractionError::PathEscape { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_extract_symlink() {
        let (_temp, dest) = create_test_dest();
        let data = ZipTestBuilder::new()
            .add_file("target.txt", b"data")
            .add_symlink("link", "target.txt")
            .build();

        let report = run(data, &dest, ExtractOptions::new()).unwrap();
        assert_eq!(report.symlinks_created, 1);
        assert_eq!(
            std::fs::read_link(dest.as_path().join("link")).unwrap(),
            PathBuf::from("target.txt")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_escape_rejected() {
        let (_temp, dest) = create_test_dest();
        let data = ZipTestBuilder::new().add_symlink("link", "../../etc").build();

        let err = run(data, &dest, ExtractOptions::new()).unwrap_err();
        assert!(err.is_security_violation());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_target_too_long() {
        let (_temp, dest) = create_test_dest();
        let target = "a".repeat(MAX_SYMLINK_TARGET + 1);
        let data = ZipTestBuilder::new().add_symlink("link", &target).build();

        let err = run(data, &dest, ExtractOptions::new()).unwrap_err();
        assert!(matches!(
            err,
            ExtractionError::SymlinkTargetTooLong {
                limit: MAX_SYMLINK_TARGET,
                ..
            }
        ));
    }

    #[test]
    fn test_read_symlink_target_at_limit() {
        let target = vec![b'a'; MAX_SYMLINK_TARGET];
        let path = read_symlink_target(&mut Cursor::new(target), Path::new("link")).unwrap();
        assert_eq!(path.as_os_str().len(), MAX_SYMLINK_TARGET);
    }

    #[test]
    fn test_understated_size_stops_at_budget() {
        let (_temp, dest) = create_test_dest();
        let payload = vec![0u8; 10_000_000];
        let data = ZipTestBuilder::new()
            .add_deflated_file("bomb.bin", &payload)
            .build();
        let data = patch_zip_uncompressed_size(data, 10);

        let tracker = CleanupTracker::new();
        let options = ExtractOptions::new().with_max_bytes(1000);
        let mut ctx = ExtractionContext::new(&dest, options, &NeverCancel, &tracker);
        let err = ZipArchive::new(Cursor::new(data))
            .unwrap()
            .extract(&mut ctx)
            .unwrap_err();

        assert!(matches!(err, ExtractionError::SizeLimitExceeded { limit: 1000, .. }));
        assert!(ctx.bytes_written() <= 1000);
        assert!(!dest.as_path().join("bomb.bin").exists());
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_cancelled_between_entries() {
        let (_temp, dest) = create_test_dest();
        let data = ZipTestBuilder::new().add_file("a.txt", b"a").build();
        let cancel = std::sync::atomic::AtomicBool::new(true);

        let mut ctx = ExtractionContext::new(&dest, ExtractOptions::new(), &cancel, &NoopTracker);
        let err = ZipArchive::new(Cursor::new(data))
            .unwrap()
            .extract(&mut ctx)
            .unwrap_err();
        assert!(err.is_cancelled());
    }
}
