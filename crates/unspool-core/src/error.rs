//! Error types for archive extraction operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using `ExtractionError`.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Describes how a path tried to leave the destination directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EscapeReason {
    /// A `..` component climbed above the destination root.
    ParentTraversal,
    /// An absolute path does not lie under the destination root.
    OutsideRoot,
    /// A symlink already on disk redirects the path outside the root.
    SymlinkAncestor {
        /// The on-disk symlink that was crossed.
        link: PathBuf,
    },
    /// Resolution crossed more symlinks than the hop limit allows.
    TooManySymlinks,
    /// A symlink entry's target points outside the root.
    SymlinkTarget {
        /// The target value stored in the archive.
        target: PathBuf,
    },
    /// A hard-link entry's target points outside the root.
    HardlinkTarget {
        /// The target value stored in the archive.
        target: PathBuf,
    },
}

impl EscapeReason {
    /// Returns `true` for purely lexical escapes (no filesystem involved).
    #[must_use]
    pub const fn is_lexical(&self) -> bool {
        matches!(self, Self::ParentTraversal | Self::OutsideRoot)
    }
}

impl std::fmt::Display for EscapeReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ParentTraversal => write!(f, "parent directory traversal"),
            Self::OutsideRoot => write!(f, "absolute path outside destination"),
            Self::SymlinkAncestor { link } => {
                write!(f, "existing symlink {} leads outside destination", link.display())
            }
            Self::TooManySymlinks => write!(f, "too many levels of symbolic links"),
            Self::SymlinkTarget { target } => {
                write!(f, "symlink target {} outside destination", target.display())
            }
            Self::HardlinkTarget { target } => {
                write!(f, "hard link target {} outside destination", target.display())
            }
        }
    }
}

/// Errors that can occur during archive extraction.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// I/O operation failed while materializing a specific entry.
    #[error("failed to {action} {path}: {source}")]
    EntryIo {
        /// What was being attempted ("create file", "create directory", ...).
        action: &'static str,
        /// The archive entry name.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Archive format is unsupported or unrecognized.
    #[error("unsupported archive format")]
    UnsupportedFormat,

    /// Archive is corrupted or invalid.
    #[error("invalid archive: {0}")]
    InvalidArchive(String),

    /// A write would have landed outside the destination directory.
    #[error("path escape detected for {path}: {reason}")]
    PathEscape {
        /// The offending entry name or candidate path.
        path: PathBuf,
        /// How the path escaped.
        reason: EscapeReason,
    },

    /// Cumulative extracted bytes exceeded the configured budget.
    #[error("extraction exceeded maximum size limit of {limit} bytes ({attempted} bytes attempted)")]
    SizeLimitExceeded {
        /// Configured budget in bytes.
        limit: u64,
        /// Bytes the extraction would have reached.
        attempted: u64,
    },

    /// Entry payload did not match its declared size.
    #[error("incomplete file {path}: wrote {written} of {expected} bytes")]
    IncompleteEntry {
        /// The archive entry name.
        path: PathBuf,
        /// Bytes actually written.
        written: u64,
        /// Size declared by the archive.
        expected: u64,
    },

    /// A hard link's target never appeared in the archive.
    #[error("hard link target not found: {link} -> {target}")]
    TargetNotFound {
        /// The hard link entry name.
        link: PathBuf,
        /// The (stripped) target it refers to.
        target: PathBuf,
    },

    /// A zip symlink entry stores a target longer than allowed.
    #[error("symlink target too long for {path} (limit {limit} bytes)")]
    SymlinkTargetTooLong {
        /// The archive entry name.
        path: PathBuf,
        /// Maximum accepted target length.
        limit: usize,
    },

    /// Extraction was cancelled by the caller.
    #[error("extraction cancelled")]
    Cancelled,
}

impl ExtractionError {
    /// Returns `true` if this error represents a security violation.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::PathBuf;
    /// use unspool_core::EscapeReason;
    /// use unspool_core::ExtractionError;
    ///
    /// let err = ExtractionError::PathEscape {
    ///     path: PathBuf::from("../etc/passwd"),
    ///     reason: EscapeReason::ParentTraversal,
    /// };
    /// assert!(err.is_security_violation());
    ///
    /// let err = ExtractionError::UnsupportedFormat;
    /// assert!(!err.is_security_violation());
    /// ```
    #[must_use]
    pub const fn is_security_violation(&self) -> bool {
        matches!(
            self,
            Self::PathEscape { .. }
                | Self::SizeLimitExceeded { .. }
                | Self::SymlinkTargetTooLong { .. }
        )
    }

    /// Returns `true` if the caller cancelled the extraction.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns a context string for this error, if available.
    #[must_use]
    pub fn context(&self) -> Option<&str> {
        match self {
            Self::InvalidArchive(msg) => Some(msg),
            Self::EntryIo { action, .. } => Some(action),
            _ => None,
        }
    }

    /// Re-attributes a path escape to `path`, replacing lexical reasons with
    /// `reason`. Other errors pass through unchanged.
    #[must_use]
    pub(crate) fn attribute_escape(self, path: PathBuf, reason: EscapeReason) -> Self {
        match self {
            Self::PathEscape { reason: inner, .. } => Self::PathEscape {
                path,
                reason: if inner.is_lexical() { reason } else { inner },
            },
            other => other,
        }
    }

    pub(crate) fn entry_io(
        action: &'static str,
        path: impl Into<PathBuf>,
    ) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::EntryIo {
            action,
            path,
            source,
        }
    }
}

impl From<zip::result::ZipError> for ExtractionError {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Self::Io(e),
            zip::result::ZipError::UnsupportedArchive(msg) => {
                Self::InvalidArchive(format!("unsupported zip feature: {msg}"))
            }
            other => Self::InvalidArchive(other.to_string()),
        }
    }
}
