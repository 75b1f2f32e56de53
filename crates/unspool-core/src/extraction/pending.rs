//! Deferred hard links for forward-only tar streams.
//!
//! A tar hard link may name a target that only appears later in the
//! stream. Such links are queued during the first pass and materialized
//! once every entry has been read.

use std::path::PathBuf;

/// A hard link whose target did not exist yet when its entry was read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingHardLink {
    /// Entry name as stored in the archive, for error messages.
    pub entry_name: PathBuf,
    /// Stripped, root-relative link location.
    pub link: PathBuf,
    /// Stripped, root-relative target.
    pub target: PathBuf,
    /// Link location as resolved when queued.
    pub link_path: PathBuf,
    /// Target location as resolved when queued.
    pub target_path: PathBuf,
}

/// Work queue of deferred hard links, drained in archive order.
#[derive(Debug, Default)]
pub struct PendingLinks {
    queue: Vec<PendingHardLink>,
}

impl PendingLinks {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a link.
    pub fn push(&mut self, link: PendingHardLink) {
        tracing::debug!(
            link = %link.link.display(),
            target = %link.target.display(),
            "deferring hard link until its target exists"
        );
        self.queue.push(link);
    }

    /// Number of queued links.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns `true` if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Empties the queue, yielding links in the order they were queued.
    pub fn drain(&mut self) -> std::vec::Drain<'_, PendingHardLink> {
        self.queue.drain(..)
    }
}
