//! Tracking of partially extracted artifacts.
//!
//! Every node the extractor creates is registered right after creation and
//! unregistered once it is final. Whatever is still registered when an
//! extraction fails or is interrupted is a partial artifact that
//! [`CleanupTracker::cleanup`] removes.

use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::MutexGuard;

/// Receives created filesystem nodes during extraction.
pub trait ArtifactTracker {
    /// Records a newly created node.
    fn register(&self, path: &Path);

    /// Forgets a node that is final or was already removed.
    fn unregister(&self, path: &Path);
}

/// Tracker that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracker;

impl ArtifactTracker for NoopTracker {
    fn register(&self, _path: &Path) {}

    fn unregister(&self, _path: &Path) {}
}

/// Thread-safe tracker that can remove registered artifacts.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use unspool_core::ArtifactTracker;
/// use unspool_core::CleanupTracker;
///
/// let tracker = CleanupTracker::new();
/// tracker.register(Path::new("/tmp/out/partial.bin"));
/// // extraction failed
/// tracker.cleanup();
/// assert!(tracker.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct CleanupTracker {
    paths: Mutex<HashSet<PathBuf>>,
}

impl CleanupTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock cannot leave the set inconsistent.
    fn lock(&self) -> MutexGuard<'_, HashSet<PathBuf>> {
        self.paths
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Returns a snapshot of the currently registered paths, sorted.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.lock().iter().cloned().collect();
        paths.sort();
        paths
    }

    /// Returns the number of registered paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Removes every registered path from disk and clears the registry.
    ///
    /// Removal is best effort: failures other than "not found" are logged
    /// and otherwise ignored. Returns the number of nodes removed.
    pub fn cleanup(&self) -> usize {
        let paths: Vec<PathBuf> = self.lock().drain().collect();

        let mut removed = 0;
        for path in paths {
            match std::fs::remove_file(&path) {
                Ok(()) => {
                    tracing::debug!(path = %path.display(), "removed partial artifact");
                    removed += 1;
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "cleanup failed");
                }
            }
        }
        removed
    }
}

impl ArtifactTracker for CleanupTracker {
    fn register(&self, path: &Path) {
        if path.as_os_str().is_empty() {
            return;
        }
        self.lock().insert(path.to_path_buf());
    }

    fn unregister(&self, path: &Path) {
        self.lock().remove(path);
    }
}
