//! Archive entry metadata.

use std::path::Path;
use std::path::PathBuf;

/// Type of entry in an archive.
///
/// Link targets are carried exactly as stored in the archive and have not
/// been validated.
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
/// use unspool_core::EntryType;
///
/// let file = EntryType::File;
/// let symlink = EntryType::Symlink {
///     target: PathBuf::from("../lib/tool"),
/// };
/// assert!(symlink.is_link());
/// assert!(!file.is_link());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntryType {
    /// Regular file entry.
    File,

    /// Directory entry.
    Directory,

    /// Symbolic link entry. The target is anchored at the link's own
    /// directory (or absolute).
    Symlink {
        /// The symlink target path (not yet validated).
        target: PathBuf,
    },

    /// Hard link entry. The target is relative to the archive root.
    Hardlink {
        /// The hardlink target path (not yet validated).
        target: PathBuf,
    },
}

impl EntryType {
    /// Returns `true` if this is a regular file.
    #[must_use]
    pub const fn is_file(&self) -> bool {
        matches!(self, Self::File)
    }

    /// Returns `true` if this is a directory.
    #[must_use]
    pub const fn is_directory(&self) -> bool {
        matches!(self, Self::Directory)
    }

    /// Returns `true` for symbolic and hard links.
    #[must_use]
    pub const fn is_link(&self) -> bool {
        matches!(self, Self::Symlink { .. } | Self::Hardlink { .. })
    }
}

/// One entry as read from an archive, before any path handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Archive-relative name as stored.
    pub name: PathBuf,
    /// What kind of node the entry describes.
    pub kind: EntryType,
    /// Declared payload size in bytes (untrusted for zip).
    pub size: u64,
    /// POSIX mode bits from the archive, if any.
    pub mode: Option<u32>,
}

impl ArchiveEntry {
    /// Creates an entry.
    #[must_use]
    pub fn new(name: impl Into<PathBuf>, kind: EntryType, size: u64, mode: Option<u32>) -> Self {
        Self {
            name: name.into(),
            kind,
            size,
            mode,
        }
    }

    /// Returns the stored entry name.
    #[must_use]
    pub fn name(&self) -> &Path {
        &self.name
    }

    /// Returns `true` if any executable bit is set in the stored mode.
    #[must_use]
    pub const fn is_executable(&self) -> bool {
        match self.mode {
            Some(mode) => mode & 0o111 != 0,
            None => false,
        }
    }
}
