//! File-system helpers shared by the symlink reconciler and stow commands.
use anyhow::{Context as _, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Ensure the parent directory of `path` exists, creating it (and any
/// ancestors) if necessary.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create parent: {}", parent.display()))?;
    }
    Ok(())
}

/// True if something (including a dangling symlink) exists at `path`.
#[must_use]
pub fn exists_no_follow(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}

/// Recursively copy a directory tree.
///
/// Symlinks inside the tree are recreated as symlinks rather than
/// followed, so a move across filesystems preserves them.
///
/// # Errors
///
/// Returns an error if the destination directory cannot be created, a source
/// entry cannot be read, or a file cannot be copied.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<()> {
    std::fs::create_dir_all(dst)
        .with_context(|| format!("creating directory {}", dst.display()))?;
    for entry in
        std::fs::read_dir(src).with_context(|| format!("reading directory {}", src.display()))?
    {
        let entry = entry.with_context(|| format!("reading entry in {}", src.display()))?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        copy_entry(&src_path, &dst_path)?;
    }
    Ok(())
}

fn copy_entry(src: &Path, dst: &Path) -> Result<()> {
    let meta = src
        .symlink_metadata()
        .with_context(|| format!("reading metadata of {}", src.display()))?;
    if meta.is_symlink() {
        let link = std::fs::read_link(src)
            .with_context(|| format!("reading link {}", src.display()))?;
        std::os::unix::fs::symlink(&link, dst)
            .with_context(|| format!("recreating link {}", dst.display()))?;
    } else if meta.is_dir() {
        copy_dir_recursive(src, dst)?;
    } else {
        std::fs::copy(src, dst)
            .with_context(|| format!("copying {} to {}", src.display(), dst.display()))?;
    }
    Ok(())
}

/// Move `src` to `dst`, which must not exist yet.
///
/// Uses a rename and falls back to copy-then-delete when the two paths
/// are on different filesystems.
///
/// # Errors
///
/// Returns an error if neither strategy succeeds.
pub fn move_path(src: &Path, dst: &Path) -> Result<()> {
    match std::fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::CrossesDevices => {
            copy_entry(src, dst)?;
            let removed = if src.symlink_metadata()?.is_dir() {
                std::fs::remove_dir_all(src)
            } else {
                std::fs::remove_file(src)
            };
            removed.with_context(|| format!("removing {} after copy", src.display()))
        }
        Err(e) => {
            Err(e).with_context(|| format!("moving {} to {}", src.display(), dst.display()))
        }
    }
}

/// Move `path` into `trash_dir`, returning where it landed.
///
/// Name collisions get a numeric suffix (`a.conf` -> `a 2.conf`), the way
/// the Finder names duplicates.
///
/// # Errors
///
/// Returns an error if the trash directory cannot be created or the move
/// fails.
pub fn move_to_trash(path: &Path, trash_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(trash_dir)
        .with_context(|| format!("creating trash {}", trash_dir.display()))?;
    let name = path
        .file_name()
        .with_context(|| format!("cannot trash {}", path.display()))?;

    let mut dest = trash_dir.join(name);
    let mut n = 2u32;
    while exists_no_follow(&dest) {
        dest = trash_dir.join(numbered(Path::new(name), n));
        n += 1;
    }

    move_path(path, &dest)?;
    Ok(dest)
}

fn numbered(name: &Path, n: u32) -> String {
    let stem = name.file_stem().unwrap_or(name.as_os_str()).to_string_lossy();
    match name.extension() {
        Some(ext) => format!("{stem} {n}.{}", ext.to_string_lossy()),
        None => format!("{stem} {n}"),
    }
}
