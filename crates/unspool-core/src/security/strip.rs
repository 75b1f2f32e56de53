//! Leading path component removal (`--strip-components`).

use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

/// Removes `n` leading components from an archive-relative path.
///
/// Returns `None` when nothing meaningful is left, in which case the entry
/// is skipped. A leading `/` or `./` counts as a component, matching how
/// tar tools count. Applied to entry names and hard-link targets only;
/// symlink targets are never stripped.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use std::path::PathBuf;
/// use unspool_core::security::strip_components;
///
/// assert_eq!(
///     strip_components(Path::new("pkg/bin/tool"), 1),
///     Some(PathBuf::from("bin/tool"))
/// );
/// assert_eq!(strip_components(Path::new("pkg/"), 1), None);
/// ```
#[must_use]
pub fn strip_components(path: &Path, n: usize) -> Option<PathBuf> {
    let rest: PathBuf = path.components().skip(n).collect();

    let meaningful = rest
        .components()
        .any(|c| matches!(c, Component::Normal(_) | Component::ParentDir));

    meaningful.then_some(rest)
}
