//! Archive format detection by magic bytes.
//!
//! Only the first [`SNIFF_LEN`] bytes of the file are inspected; file
//! extensions are ignored.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::Result;
use crate::formats::compression::CompressionCodec;

/// Number of leading bytes inspected (covers the tar magic at 257..262).
pub const SNIFF_LEN: usize = 262;

const ZIP_LOCAL_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];
const ZIP_EMPTY_MAGIC: [u8; 4] = [0x50, 0x4B, 0x05, 0x06];
const ZIP_SPANNED_MAGIC: [u8; 4] = [0x50, 0x4B, 0x07, 0x08];
const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];
const BZIP2_MAGIC: [u8; 3] = *b"BZh";
const XZ_MAGIC: [u8; 6] = [0xFD, 0x37, 0x7A, 0x58, 0x5A, 0x00];
const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];
const TAR_MAGIC: &[u8; 5] = b"ustar";
const TAR_MAGIC_OFFSET: usize = 257;

/// Detected archive container.
///
/// The compressed variants are tar streams wrapped in that codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveType {
    /// ZIP archive.
    Zip,
    /// Uncompressed tar archive.
    Tar,
    /// Gzip-compressed tar archive.
    Gzip,
    /// Bzip2-compressed tar archive.
    Bzip2,
    /// XZ-compressed tar archive.
    Xz,
    /// Zstd-compressed tar archive.
    Zstd,
    /// Nothing recognizable.
    Unknown,
}

impl ArchiveType {
    /// Returns a short lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::Tar => "tar",
            Self::Gzip => "tar.gz",
            Self::Bzip2 => "tar.bz2",
            Self::Xz => "tar.xz",
            Self::Zstd => "tar.zst",
            Self::Unknown => "unknown",
        }
    }

    /// Returns the codec wrapping the tar stream, if any.
    #[must_use]
    pub const fn compression(self) -> Option<CompressionCodec> {
        match self {
            Self::Gzip => Some(CompressionCodec::Gzip),
            Self::Bzip2 => Some(CompressionCodec::Bzip2),
            Self::Xz => Some(CompressionCodec::Xz),
            Self::Zstd => Some(CompressionCodec::Zstd),
            Self::Zip | Self::Tar | Self::Unknown => None,
        }
    }

    /// Returns `true` if an extractor exists for this type.
    #[must_use]
    pub const fn is_supported(self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl std::fmt::Display for ArchiveType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Classifies the leading bytes of a file.
///
/// # Examples
///
/// ```
/// use unspool_core::formats::ArchiveType;
/// use unspool_core::formats::detect_bytes;
///
/// assert_eq!(detect_bytes(&[0x1F, 0x8B, 0x08]), ArchiveType::Gzip);
/// assert_eq!(detect_bytes(b"hello"), ArchiveType::Unknown);
/// ```
#[must_use]
pub fn detect_bytes(head: &[u8]) -> ArchiveType {
    if head.starts_with(&ZIP_LOCAL_MAGIC)
        || head.starts_with(&ZIP_EMPTY_MAGIC)
        || head.starts_with(&ZIP_SPANNED_MAGIC)
    {
        return ArchiveType::Zip;
    }
    if head.starts_with(&GZIP_MAGIC) {
        return ArchiveType::Gzip;
    }
    if head.starts_with(&BZIP2_MAGIC) && head.get(3).is_some_and(|b| (b'1'..=b'9').contains(b)) {
        return ArchiveType::Bzip2;
    }
    if head.starts_with(&XZ_MAGIC) {
        return ArchiveType::Xz;
    }
    if head.starts_with(&ZSTD_MAGIC) {
        return ArchiveType::Zstd;
    }
    if head.get(TAR_MAGIC_OFFSET..TAR_MAGIC_OFFSET + TAR_MAGIC.len()) == Some(TAR_MAGIC.as_slice()) {
        return ArchiveType::Tar;
    }
    ArchiveType::Unknown
}

/// Detects the archive type of the file at `path`.
///
/// Files shorter than the magic they would need are `Unknown`, not an
/// error.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn detect_format(path: &Path) -> Result<ArchiveType> {
    let file = File::open(path)?;
    let mut head = Vec::with_capacity(SNIFF_LEN);
    file.take(SNIFF_LEN as u64).read_to_end(&mut head)?;
    let detected = detect_bytes(&head);
    tracing::debug!(path = %path.display(), format = %detected, "detected archive format");
    Ok(detected)
}
