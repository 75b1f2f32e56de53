//! Symlink-aware containment checks against the destination root.
//!
//! Lexical checks alone are not enough: a directory that already exists
//! under the root may be a symlink pointing elsewhere, so `a/b/file` can
//! land outside even though it has no `..`. [`PathResolver`] walks the
//! candidate one segment at a time with `lstat`, substitutes every symlink
//! it crosses, and re-checks containment after each substitution.

use std::collections::VecDeque;
use std::ffi::OsString;
use std::io;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use crate::DestDir;
use crate::EscapeReason;
use crate::ExtractionError;
use crate::Result;
use crate::types::ResolvedPath;

/// Maximum number of symlink substitutions in one resolution.
pub const MAX_SYMLINK_HOPS: usize = 255;

/// Resolves candidate paths against a destination root.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use unspool_core::DestDir;
/// use unspool_core::security::PathResolver;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dest = DestDir::new("/tmp/out")?;
/// let resolver = PathResolver::new(&dest);
///
/// let path = resolver.resolve(Path::new("pkg/bin/tool"))?;
/// assert!(path.as_path().starts_with(dest.as_path()));
///
/// assert!(resolver.resolve(Path::new("../etc/passwd")).is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PathResolver<'a> {
    root: &'a Path,
}

impl<'a> PathResolver<'a> {
    /// Creates a resolver for `dest`.
    #[must_use]
    pub fn new(dest: &'a DestDir) -> Self {
        Self {
            root: dest.as_path(),
        }
    }

    /// Returns the root paths are resolved against.
    #[must_use]
    pub fn root(&self) -> &'a Path {
        self.root
    }

    /// Resolves a root-relative candidate, following every existing symlink
    /// along it including the final component.
    ///
    /// A leading `/` is ignored: the name is anchored at the root.
    ///
    /// # Errors
    ///
    /// [`ExtractionError::PathEscape`] if the candidate climbs above the
    /// root, crosses a symlink leading outside it, or crosses more than
    /// [`MAX_SYMLINK_HOPS`] symlinks. I/O errors other than "not found"
    /// from `lstat`/`readlink` are returned as-is.
    pub fn resolve(&self, candidate: &Path) -> Result<ResolvedPath> {
        self.walk(candidate, segments(candidate), EscapeReason::ParentTraversal)
    }

    /// Resolves an absolute candidate that must already lie under the root.
    pub fn resolve_absolute(&self, candidate: &Path) -> Result<ResolvedPath> {
        let inside = candidate
            .strip_prefix(self.root)
            .map_err(|_| escape(candidate, EscapeReason::OutsideRoot))?;
        self.walk(candidate, segments(inside), EscapeReason::OutsideRoot)
    }

    /// Resolves only the parent of a root-relative candidate and re-appends
    /// the final name unresolved.
    ///
    /// Used for nodes that replace whatever sits at their own location
    /// (symlinks, hard links): an existing symlink at the final component
    /// must be replaced, not followed.
    pub fn resolve_parent(&self, candidate: &Path) -> Result<ResolvedPath> {
        let mut pending = segments(candidate);
        let Some(Segment::Name(name)) = pending.pop_back() else {
            return Err(ExtractionError::InvalidArchive(format!(
                "entry {} has no file name",
                candidate.display()
            )));
        };
        let parent = self.walk(candidate, pending, EscapeReason::ParentTraversal)?;
        Ok(ResolvedPath::new(parent.into_path_buf().join(name)))
    }

    /// Walks `pending` from the root. `cursor` only ever holds components
    /// that `lstat` saw as non-symlinks (or that do not exist yet), so a
    /// `..` is applied by popping it.
    fn walk(
        &self,
        candidate: &Path,
        mut pending: VecDeque<Segment>,
        climb: EscapeReason,
    ) -> Result<ResolvedPath> {
        let mut cursor = self.root.to_path_buf();
        let mut hops = 0usize;
        let mut last_link: Option<PathBuf> = None;

        while let Some(segment) = pending.pop_front() {
            let name = match segment {
                Segment::Name(name) => name,
                Segment::Parent => {
                    if cursor.as_path() == self.root {
                        let reason = match last_link.take() {
                            Some(link) => EscapeReason::SymlinkAncestor { link },
                            None => climb,
                        };
                        return Err(escape(candidate, reason));
                    }
                    cursor.pop();
                    continue;
                }
            };
            let next = cursor.join(&name);

            let metadata = match std::fs::symlink_metadata(&next) {
                Ok(metadata) => metadata,
                Err(e) if is_absent(&e) => {
                    cursor = next;
                    continue;
                }
                Err(e) => return Err(ExtractionError::Io(e)),
            };

            if !metadata.file_type().is_symlink() {
                cursor = next;
                continue;
            }

            hops += 1;
            if hops > MAX_SYMLINK_HOPS {
                return Err(escape(candidate, EscapeReason::TooManySymlinks));
            }

            let target = std::fs::read_link(&next)?;
            let mut restarted = if target.is_absolute() {
                let Ok(inside) = target.strip_prefix(self.root) else {
                    return Err(escape(
                        candidate,
                        EscapeReason::SymlinkAncestor { link: next },
                    ));
                };
                cursor = self.root.to_path_buf();
                segments(inside)
            } else {
                // Relative targets continue from the link's own directory.
                segments(&target)
            };
            restarted.extend(pending);
            pending = restarted;
            last_link = Some(next);
        }

        Ok(ResolvedPath::new(cursor))
    }
}

/// One step of a walk.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Name(OsString),
    Parent,
}

fn escape(candidate: &Path, reason: EscapeReason) -> ExtractionError {
    ExtractionError::PathEscape {
        path: candidate.to_path_buf(),
        reason,
    }
}

fn is_absent(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

/// Splits a path into walk steps. Roots, prefixes and `.` are dropped;
/// `..` is kept for the walk to apply against the filesystem.
fn segments(path: &Path) -> VecDeque<Segment> {
    path.components()
        .filter_map(|component| match component {
            Component::Prefix(_) | Component::RootDir | Component::CurDir => None,
            Component::ParentDir => Some(Segment::Parent),
            Component::Normal(s) => Some(Segment::Name(s.to_os_string())),
        })
        .collect()
}
