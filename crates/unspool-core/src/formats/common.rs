//! Entry materialization shared by the tar and zip drivers.
//!
//! Every helper takes the raw entry name, applies stripping, resolves the
//! result against the destination root, and only then touches the
//! filesystem.
//!
//! - [`extract_directory`]: idempotent directory creation (0755)
//! - [`extract_file`]: bounded payload copy with size and budget checks
//! - [`extract_symlink`]: symlink creation, target validated but never
//!   rewritten
//! - [`extract_hardlink`] / [`finish_hardlink`]: immediate or deferred
//!   hard links

use std::fs::File;
use std::io::BufWriter;
use std::io::Read;
use std::path::Path;

use crate::EscapeReason;
use crate::ExtractionError;
use crate::Result;
use crate::copy::copy_with_cancel;
use crate::extraction::ExtractionContext;
use crate::extraction::PendingHardLink;
use crate::types::ArchiveEntry;
use crate::types::ResolvedPath;

const DIR_MODE: u32 = 0o755;
const FILE_MODE: u32 = 0o644;
const EXEC_FILE_MODE: u32 = 0o755;

/// How far an entry's declared size can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadBound {
    /// The reader itself ends at the declared size (tar).
    Exact,
    /// The declared size is attacker-controlled metadata; the decoded
    /// stream may be longer (zip).
    Untrusted,
}

fn resolve_name(ctx: &ExtractionContext<'_>, name: &Path, stripped: &Path) -> Result<ResolvedPath> {
    ctx.resolver()
        .resolve(stripped)
        .map_err(|e| e.attribute_escape(name.to_path_buf(), EscapeReason::ParentTraversal))
}

fn resolve_link_location(
    ctx: &ExtractionContext<'_>,
    name: &Path,
    stripped: &Path,
) -> Result<ResolvedPath> {
    ctx.resolver()
        .resolve_parent(stripped)
        .map_err(|e| e.attribute_escape(name.to_path_buf(), EscapeReason::ParentTraversal))
}

fn create_dir_tree(path: &Path) -> std::io::Result<()> {
    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(DIR_MODE);
    }
    builder.create(path)
}

fn create_parent(path: &Path, name: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_tree(parent)
            .map_err(ExtractionError::entry_io("create parent directory for", name))?;
    }
    Ok(())
}

/// Removes whatever non-directory node sits at `path` so a link can take
/// its place. Directories are left alone; link creation then fails.
fn clear_link_location(path: &Path, name: &Path) -> Result<()> {
    match std::fs::symlink_metadata(path) {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => std::fs::remove_file(path)
            .map_err(ExtractionError::entry_io("replace existing node at", name)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ExtractionError::entry_io("inspect", name)(e)),
    }
}

/// Deletes a file the extractor itself rejected and stops tracking it.
fn discard_partial(ctx: &ExtractionContext<'_>, path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => ctx.tracker.unregister(path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => ctx.tracker.unregister(path),
        // Still registered, so the tracker gets another chance
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to remove partial file"),
    }
}

/// Creates a directory entry, including missing parents (mode 0755).
///
/// Idempotent: an existing directory is accepted as-is.
pub fn extract_directory(ctx: &mut ExtractionContext<'_>, name: &Path) -> Result<()> {
    let Some(stripped) = ctx.strip(name) else {
        ctx.skip(name, "stripped to nothing");
        return Ok(());
    };
    let resolved = resolve_name(ctx, name, &stripped)?;

    create_dir_tree(resolved.as_path())
        .map_err(ExtractionError::entry_io("create directory", name))?;

    tracing::debug!(entry = %name.display(), "created directory");
    ctx.report.directories_created += 1;
    Ok(())
}

/// Writes a regular file entry.
///
/// Order of checks:
/// 1. declared size against the remaining budget (no file is created on
///    failure)
/// 2. for [`PayloadBound::Untrusted`] payloads, data remaining after the
///    budget was filled
/// 3. measured size against declared size
/// 4. measured cumulative total against the budget
///
/// Failures in 2-4 delete the file before returning. The final mode is 0755
/// when the entry carries any executable bit, 0644 otherwise.
pub fn extract_file<R: Read + ?Sized>(
    ctx: &mut ExtractionContext<'_>,
    entry: &ArchiveEntry,
    reader: &mut R,
    bound: PayloadBound,
) -> Result<()> {
    let name = entry.name();
    let Some(stripped) = ctx.strip(name) else {
        ctx.skip(name, "stripped to nothing");
        return Ok(());
    };
    let resolved = resolve_name(ctx, name, &stripped)?;
    let path = resolved.as_path();

    ctx.precheck(entry.size)?;
    create_parent(path, name)?;

    let file = File::create(path).map_err(ExtractionError::entry_io("create file", name))?;
    ctx.tracker.register(path);

    let limit = match bound {
        PayloadBound::Exact => entry.size,
        PayloadBound::Untrusted => ctx
            .remaining_budget()
            .unwrap_or_else(|| entry.size.saturating_add(1)),
    };

    let mut writer = BufWriter::with_capacity(ctx.buffer.size(), file);
    let written = match copy_with_cancel(&mut writer, reader, limit, ctx.cancel, &mut ctx.buffer) {
        Ok(written) => written,
        Err(partial) => {
            tracing::debug!(
                entry = %name.display(),
                bytes = partial.bytes_written,
                "copy stopped early"
            );
            return Err(match partial.error {
                ExtractionError::Io(e) => ExtractionError::entry_io("write", name)(e),
                other => other,
            });
        }
    };
    writer
        .into_inner()
        .map_err(|e| ExtractionError::entry_io("write", name)(e.into_error()))?;

    if bound == PayloadBound::Untrusted
        && let Some(limit) = ctx.options().byte_limit()
        && written == limit.saturating_sub(ctx.bytes_written())
        && has_more(reader).map_err(ExtractionError::entry_io("read", name))?
    {
        discard_partial(ctx, path);
        return Err(ExtractionError::SizeLimitExceeded {
            limit,
            attempted: ctx.bytes_written().saturating_add(written).saturating_add(1),
        });
    }

    if written != entry.size {
        discard_partial(ctx, path);
        return Err(ExtractionError::IncompleteEntry {
            path: name.to_path_buf(),
            written,
            expected: entry.size,
        });
    }

    if let Err(e) = ctx.record_written(written) {
        discard_partial(ctx, path);
        return Err(e);
    }

    set_file_mode(path, entry.is_executable())
        .map_err(ExtractionError::entry_io("set permissions on", name))?;

    ctx.tracker.unregister(path);
    tracing::debug!(entry = %name.display(), bytes = written, "extracted file");
    ctx.report.files_extracted += 1;
    ctx.report.created.push(resolved.into_path_buf());
    Ok(())
}

/// Returns `true` if `reader` can still produce at least one byte.
fn has_more<R: Read + ?Sized>(reader: &mut R) -> std::io::Result<bool> {
    let mut probe = [0u8; 1];
    loop {
        match reader.read(&mut probe) {
            Ok(n) => return Ok(n > 0),
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
}

#[cfg(unix)]
fn set_file_mode(path: &Path, executable: bool) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mode = if executable { EXEC_FILE_MODE } else { FILE_MODE };
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
}

// Modes are POSIX-only; other platforms keep their defaults.
#[cfg(not(unix))]
fn set_file_mode(_path: &Path, _executable: bool) -> std::io::Result<()> {
    Ok(())
}

/// Creates a symlink entry.
///
/// The target is stored exactly as given. It is validated by resolving it
/// relative to the link's own (resolved) directory, or as-is when
/// absolute; either way it must stay inside the root.
pub fn extract_symlink(ctx: &mut ExtractionContext<'_>, name: &Path, target: &Path) -> Result<()> {
    let Some(stripped) = ctx.strip(name) else {
        ctx.skip(name, "stripped to nothing");
        return Ok(());
    };
    if target.as_os_str().is_empty() {
        ctx.skip(name, "empty symlink target");
        return Ok(());
    }

    let link_path = resolve_link_location(ctx, name, &stripped)?;
    let link_dir = link_path
        .as_path()
        .parent()
        .unwrap_or_else(|| ctx.dest().as_path());
    let effective = if target.is_absolute() {
        target.to_path_buf()
    } else {
        link_dir.join(target)
    };
    ctx.resolver().resolve_absolute(&effective).map_err(|e| {
        e.attribute_escape(
            name.to_path_buf(),
            EscapeReason::SymlinkTarget {
                target: target.to_path_buf(),
            },
        )
    })?;

    create_parent(link_path.as_path(), name)?;
    clear_link_location(link_path.as_path(), name)?;
    make_symlink(target, link_path.as_path())
        .map_err(ExtractionError::entry_io("create symlink", name))?;

    // Links are final as soon as they exist.
    ctx.tracker.register(link_path.as_path());
    ctx.tracker.unregister(link_path.as_path());

    tracing::debug!(entry = %name.display(), target = %target.display(), "created symlink");
    ctx.report.symlinks_created += 1;
    ctx.report.created.push(link_path.into_path_buf());
    Ok(())
}

#[cfg(unix)]
fn make_symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(not(unix))]
fn make_symlink(_target: &Path, _link: &Path) -> std::io::Result<()> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "symlinks are only supported on Unix",
    ))
}

/// Handles a hard-link entry.
///
/// Both the name and the archive-root-relative target are stripped. If
/// the target already exists the link is created now; otherwise the link
/// is returned for the deferred pass.
pub fn extract_hardlink(
    ctx: &mut ExtractionContext<'_>,
    name: &Path,
    target: &Path,
) -> Result<Option<PendingHardLink>> {
    let Some(link) = ctx.strip(name) else {
        ctx.skip(name, "stripped to nothing");
        return Ok(None);
    };
    let Some(stripped_target) = ctx.strip(target) else {
        ctx.skip(name, "hard link target stripped to nothing");
        return Ok(None);
    };

    let link_path = resolve_link_location(ctx, name, &link)?;
    let target_path = resolve_hardlink_target(ctx, name, target, &stripped_target)?;

    if !node_exists(target_path.as_path(), name)? {
        return Ok(Some(PendingHardLink {
            entry_name: name.to_path_buf(),
            link,
            target: stripped_target,
            link_path: link_path.into_path_buf(),
            target_path: target_path.into_path_buf(),
        }));
    }

    create_hardlink(ctx, name, link_path, &target_path)?;
    Ok(None)
}

/// Materializes a deferred hard link after the whole stream was read.
///
/// Both locations are resolved again since later entries may have changed
/// the tree.
pub fn finish_hardlink(ctx: &mut ExtractionContext<'_>, pending: &PendingHardLink) -> Result<()> {
    let name = pending.entry_name.as_path();
    let link_path = resolve_link_location(ctx, name, &pending.link)?;
    let target_path = resolve_hardlink_target(ctx, name, &pending.target, &pending.target)?;

    if !node_exists(target_path.as_path(), name)? {
        return Err(ExtractionError::TargetNotFound {
            link: name.to_path_buf(),
            target: pending.target.clone(),
        });
    }

    create_hardlink(ctx, name, link_path, &target_path)
}

fn resolve_hardlink_target(
    ctx: &ExtractionContext<'_>,
    name: &Path,
    target: &Path,
    stripped_target: &Path,
) -> Result<ResolvedPath> {
    ctx.resolver().resolve(stripped_target).map_err(|e| {
        e.attribute_escape(
            name.to_path_buf(),
            EscapeReason::HardlinkTarget {
                target: target.to_path_buf(),
            },
        )
    })
}

fn node_exists(path: &Path, name: &Path) -> Result<bool> {
    match std::fs::symlink_metadata(path) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(ExtractionError::entry_io("inspect hard link target of", name)(e)),
    }
}

fn create_hardlink(
    ctx: &mut ExtractionContext<'_>,
    name: &Path,
    link_path: ResolvedPath,
    target_path: &ResolvedPath,
) -> Result<()> {
    if link_path == *target_path {
        ctx.skip(name, "hard link to itself");
        return Ok(());
    }

    create_parent(link_path.as_path(), name)?;
    clear_link_location(link_path.as_path(), name)?;
    std::fs::hard_link(target_path.as_path(), link_path.as_path())
        .map_err(ExtractionError::entry_io("create hard link", name))?;

    // Links are final as soon as they exist.
    ctx.tracker.register(link_path.as_path());
    ctx.tracker.unregister(link_path.as_path());

    tracing::debug!(
        entry = %name.display(),
        target = %target_path.as_path().display(),
        "created hard link"
    );
    ctx.report.hardlinks_created += 1;
    ctx.report.created.push(link_path.into_path_buf());
    Ok(())
}
