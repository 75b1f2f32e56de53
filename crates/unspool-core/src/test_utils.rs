//! Test utilities for building in-memory archives.
//!
//! Shared by unit tests, integration tests and benchmarks. The tar builder
//! can also emit entry names that `tar::Builder` itself refuses to write
//! (`..` components, absolute paths) so hostile archives can be tested.
//!
//! # Panics
//!
//! All functions in this module may panic on I/O errors since they are
//! designed for test use only where panics are acceptable.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::io::Cursor;
use std::io::Write;

use zip::write::SimpleFileOptions;

/// Builder for creating TAR test archives with various entry types.
///
/// # Examples
///
/// ```
/// use unspool_core::test_utils::TarTestBuilder;
///
/// let tar_data = TarTestBuilder::new()
///     .add_directory("pkg/")
///     .add_file("pkg/file.txt", b"content")
///     .add_symlink("pkg/link", "file.txt")
///     .build();
/// ```
pub struct TarTestBuilder {
    builder: tar::Builder<Vec<u8>>,
}

impl TarTestBuilder {
    /// Creates a new TAR test builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            builder: tar::Builder::new(Vec::new()),
        }
    }

    /// Adds a regular file with mode 0644.
    #[must_use]
    pub fn add_file(self, path: &str, data: &[u8]) -> Self {
        self.add_file_with_mode(path, data, 0o644)
    }

    /// Adds a regular file with custom mode.
    #[must_use]
    pub fn add_file_with_mode(mut self, path: &str, data: &[u8], mode: u32) -> Self {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(mode);
        header.set_cksum();
        self.builder.append_data(&mut header, path, data).unwrap();
        self
    }

    /// Adds a directory.
    #[must_use]
    pub fn add_directory(self, path: &str) -> Self {
        self.add_empty(path, tar::EntryType::Directory, 0o755, None)
    }

    /// Adds a symlink. The target is stored verbatim.
    #[must_use]
    pub fn add_symlink(self, path: &str, target: &str) -> Self {
        self.add_empty(path, tar::EntryType::Symlink, 0o777, Some(target))
    }

    /// Adds a hard link to an archive-root-relative target.
    #[must_use]
    pub fn add_hardlink(self, path: &str, target: &str) -> Self {
        self.add_empty(path, tar::EntryType::Link, 0o644, Some(target))
    }

    /// Adds a FIFO entry.
    #[must_use]
    pub fn add_fifo(self, path: &str) -> Self {
        self.add_empty(path, tar::EntryType::Fifo, 0o644, None)
    }

    /// Adds a regular file whose name is written straight into the header,
    /// bypassing the builder's path checks. Names must fit in 100 bytes.
    #[must_use]
    pub fn add_raw_file(mut self, name: &str, data: &[u8]) -> Self {
        let mut header = raw_header(name, tar::EntryType::Regular, 0o644);
        header.set_size(data.len() as u64);
        header.set_cksum();
        self.builder.append(&header, data).unwrap();
        self
    }

    /// Adds a symlink with a raw, unchecked name.
    #[must_use]
    pub fn add_raw_symlink(mut self, name: &str, target: &str) -> Self {
        let mut header = raw_header(name, tar::EntryType::Symlink, 0o777);
        header.set_link_name(target).unwrap();
        header.set_cksum();
        self.builder.append(&header, std::io::empty()).unwrap();
        self
    }

    fn add_empty(
        mut self,
        path: &str,
        kind: tar::EntryType,
        mode: u32,
        link: Option<&str>,
    ) -> Self {
        let mut header = tar::Header::new_gnu();
        header.set_size(0);
        header.set_mode(mode);
        header.set_entry_type(kind);
        if let Some(target) = link {
            header.set_link_name(target).unwrap();
        }
        header.set_cksum();
        self.builder
            .append_data(&mut header, path, std::io::empty())
            .unwrap();
        self
    }

    /// Builds and returns the TAR archive data.
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        self.builder.into_inner().unwrap()
    }
}

impl Default for TarTestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn raw_header(name: &str, kind: tar::EntryType, mode: u32) -> tar::Header {
    let bytes = name.as_bytes();
    assert!(bytes.len() <= 100, "raw tar names must fit the v7 name field");

    let mut header = tar::Header::new_gnu();
    header.as_old_mut().name[..bytes.len()].copy_from_slice(bytes);
    header.set_size(0);
    header.set_mode(mode);
    header.set_entry_type(kind);
    header
}

/// Builder for creating ZIP test archives with various entry types.
///
/// # Examples
///
/// ```
/// use unspool_core::test_utils::ZipTestBuilder;
///
/// let zip_data = ZipTestBuilder::new()
///     .add_file("file.txt", b"content")
///     .add_directory("dir/")
///     .build();
/// ```
pub struct ZipTestBuilder {
    zip: zip::ZipWriter<Cursor<Vec<u8>>>,
}

impl ZipTestBuilder {
    /// Creates a new ZIP test builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            zip: zip::ZipWriter::new(Cursor::new(Vec::new())),
        }
    }

    /// Adds a stored regular file with mode 0644.
    #[must_use]
    pub fn add_file(self, path: &str, data: &[u8]) -> Self {
        self.add_file_with_mode(path, data, 0o644)
    }

    /// Adds a stored regular file with custom permission bits.
    #[must_use]
    pub fn add_file_with_mode(mut self, path: &str, data: &[u8], mode: u32) -> Self {
        let options = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored)
            .unix_permissions(mode);

        self.zip.start_file(path, options).unwrap();
        self.zip.write_all(data).unwrap();
        self
    }

    /// Adds a deflate-compressed regular file.
    #[must_use]
    pub fn add_deflated_file(mut self, path: &str, data: &[u8]) -> Self {
        let options = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .unix_permissions(0o644);

        self.zip.start_file(path, options).unwrap();
        self.zip.write_all(data).unwrap();
        self
    }

    /// Adds a directory.
    #[must_use]
    pub fn add_directory(mut self, path: &str) -> Self {
        let options = SimpleFileOptions::default().unix_permissions(0o755);
        self.zip.add_directory(path, options).unwrap();
        self
    }

    /// Adds a symlink entry whose payload is the target.
    #[must_use]
    pub fn add_symlink(mut self, path: &str, target: &str) -> Self {
        let options = SimpleFileOptions::default();
        self.zip.add_symlink(path, target, options).unwrap();
        self
    }

    /// Builds and returns the ZIP archive data.
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        self.zip.finish().unwrap().into_inner()
    }
}

impl Default for ZipTestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

const LOCAL_HEADER_SIG: &[u8; 4] = b"PK\x03\x04";
const CENTRAL_HEADER_SIG: &[u8; 4] = b"PK\x01\x02";
const EOCD_LEN: usize = 22;

/// Rewrites the declared uncompressed size of the first entry of a
/// single-entry, comment-free zip, in both the local and central headers.
///
/// Lets tests build archives whose payload decodes to more bytes than the
/// metadata claims.
#[must_use]
pub fn patch_zip_uncompressed_size(mut data: Vec<u8>, size: u32) -> Vec<u8> {
    assert_eq!(&data[..4], LOCAL_HEADER_SIG, "expected a local file header");
    data[22..26].copy_from_slice(&size.to_le_bytes());

    let eocd = data.len() - EOCD_LEN;
    let cd_offset = u32::from_le_bytes(data[eocd + 16..eocd + 20].try_into().unwrap()) as usize;
    assert_eq!(
        &data[cd_offset..cd_offset + 4],
        CENTRAL_HEADER_SIG,
        "expected a central directory header"
    );
    data[cd_offset + 24..cd_offset + 28].copy_from_slice(&size.to_le_bytes());
    data
}
