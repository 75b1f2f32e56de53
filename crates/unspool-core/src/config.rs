//! Extraction options.

/// Options controlling a single extraction call.
///
/// # Examples
///
/// ```
/// use unspool_core::ExtractOptions;
///
/// // No stripping, no byte budget
/// let options = ExtractOptions::default();
/// assert!(options.is_unlimited());
///
/// let options = ExtractOptions::new()
///     .with_strip_components(1)
///     .with_max_bytes(512 * 1024 * 1024);
/// assert_eq!(options.strip_components, 1);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Number of leading path components removed from entry names and
    /// hard-link targets. Symlink targets are never stripped.
    pub strip_components: usize,

    /// Budget for the total number of bytes written to regular files.
    /// `0` means unlimited.
    pub max_bytes: u64,
}

impl ExtractOptions {
    /// Creates options with no stripping and no byte budget.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of leading components to strip.
    #[must_use]
    pub fn with_strip_components(mut self, n: usize) -> Self {
        self.strip_components = n;
        self
    }

    /// Sets the byte budget (`0` disables it).
    #[must_use]
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Returns `true` when no byte budget is enforced.
    #[must_use]
    pub const fn is_unlimited(&self) -> bool {
        self.max_bytes == 0
    }

    /// Returns the byte budget, or `None` when unlimited.
    #[must_use]
    pub const fn byte_limit(&self) -> Option<u64> {
        if self.max_bytes == 0 {
            None
        } else {
            Some(self.max_bytes)
        }
    }
}
