//! Paths proven to lie inside the destination directory.

use std::path::Path;
use std::path::PathBuf;

/// Absolute path that the resolver has verified to stay inside the
/// destination root, with every pre-existing symlink along it resolved.
///
/// There is no public constructor; values come from
/// [`PathResolver`](crate::security::PathResolver).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedPath(PathBuf);

impl ResolvedPath {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self(path)
    }

    /// Returns the path as a `&Path`.
    #[inline]
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Converts into the inner `PathBuf`.
    #[inline]
    #[must_use]
    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }
}

impl AsRef<Path> for ResolvedPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}
