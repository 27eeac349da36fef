//! Adopting files into the managed root (`addlink`) and releasing them
//! back (`unlink`).
use anyhow::{Context as _, Result};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{LinkPair, expand, make_link};
use crate::config::targets;
use crate::error::CiderError;
use crate::paths::{HOME_MARKER, normalize};
use crate::resources::fs::{exists_no_follow, move_path};
use crate::resources::Applicable as _;
use crate::resources::symlink::{SymlinkResource, is_symlink, same_file};
use crate::tasks::Context;

/// True if the rule `key` belongs to the stow group `name`.
#[must_use]
pub fn is_link_key(key: &str, name: &str) -> bool {
    key == name
        || key
            .strip_prefix(name)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Work out which rule covers `target` (in `~` form) for group `name`.
///
/// Returns `None` when an existing rule of the group already matches the
/// target's file name and maps to the same directory, otherwise the
/// `(pattern, target_dir)` rule to add: `name/*`, or `name/.*` for hidden
/// files.
///
/// # Errors
///
/// Returns [`CiderError::Conflict`] if the synthesized pattern is already
/// mapped to a different directory.
pub fn rule_for(
    symlinks: &BTreeMap<String, String>,
    name: &str,
    target: &str,
) -> Result<Option<(String, String)>> {
    let (dir, base) = target.rsplit_once('/').unwrap_or(("", target));
    let target_dir = if dir == HOME_MARKER {
        HOME_MARKER.to_string()
    } else {
        format!("{dir}/")
    };

    let covered = symlinks.iter().any(|(key, mapped)| {
        let Some((key_dir, key_base)) = key.rsplit_once('/') else {
            return false;
        };
        key_dir == name
            && *mapped == target_dir
            && glob::Pattern::new(key_base).is_ok_and(|p| p.matches(base))
    });
    if covered {
        return Ok(None);
    }

    let pattern = format!("{name}/{}*", if base.starts_with('.') { "." } else { "" });
    if let Some(existing) = symlinks.get(&pattern) {
        return Err(CiderError::Conflict(format!(
            "{pattern} (already mapped to {existing})"
        ))
        .into());
    }
    Ok(Some((pattern, target_dir)))
}

/// Move each of `paths` under `<symlink dir>/<name>/` and link it back.
///
/// A path that is already the stowed file (for example a link created by an
/// earlier `addlink`) is not moved again.
///
/// # Errors
///
/// Returns [`CiderError::SourceMissing`] if a path does not exist,
/// [`CiderError::Conflict`] if its stow location holds a different file, or
/// an error if moving, linking or updating the documents fails.
pub fn addlink(ctx: &Context, name: &str, paths: &[PathBuf]) -> Result<()> {
    let stow_dir = ctx.symlink_dir().join(name);

    for item in paths {
        let item = normalize(
            &std::path::absolute(item)
                .with_context(|| format!("resolving {}", item.display()))?,
        );
        if !item.exists() {
            return Err(CiderError::SourceMissing(ctx.display(&item)).into());
        }
        let file_name = item.file_name().ok_or_else(|| {
            CiderError::InvalidArgument(format!("cannot link {}", ctx.display(&item)))
        })?;

        let stowed = stow_dir.join(file_name);
        let already_stowed = stowed.exists() && same_file(&stowed, &item);
        if exists_no_follow(&stowed) && !already_stowed {
            return Err(CiderError::Conflict(ctx.display(&stowed)).into());
        }

        let target = ctx.display(&item);
        let rule = rule_for(&ctx.settings.read_bootstrap()?.symlinks, name, &target)?;

        if !already_stowed {
            std::fs::create_dir_all(&stow_dir)
                .with_context(|| format!("creating {}", stow_dir.display()))?;
            move_path(&item, &stowed)?;
        }

        if let Some((pattern, target_dir)) = rule {
            ctx.settings.modify_bootstrap(|mut doc| {
                doc.symlinks.insert(pattern, target_dir);
                doc
            })?;
        }

        if make_link(ctx, &stowed, &item, false)? {
            let cache_file = ctx.settings.targets_file();
            let mut cache = targets::read(&cache_file)?;
            cache.insert(item);
            targets::write(&cache_file, &cache)?;
        }
    }
    Ok(())
}

/// Move every file stowed under `name` back to its original location and
/// drop the group's rules.
///
/// # Errors
///
/// Returns [`CiderError::NotFound`] if no rule belongs to `name`,
/// [`CiderError::Symlink`] if an original location holds unrelated data,
/// or an error if moving files or updating the documents fails.
pub fn unlink(ctx: &Context, name: &str) -> Result<()> {
    let bootstrap = ctx.settings.read_bootstrap()?;
    let symlink_dir = ctx.symlink_dir();

    let rules: Vec<(&String, &String)> = bootstrap
        .symlinks
        .iter()
        .filter(|(key, _)| is_link_key(key, name))
        .collect();
    if rules.is_empty() {
        return Err(CiderError::NotFound(format!("No symlink found with name: {name}")).into());
    }

    let mut released = targets::TargetCache::new();
    for (pattern, target) in rules {
        for pair in expand(&symlink_dir, ctx.home(), pattern, target)? {
            clear_link(ctx, &pair)?;
            move_path(&pair.source, &pair.target)?;
            ctx.log.info(&format!(
                "Moved {} -> {}",
                ctx.display(&pair.source),
                ctx.display(&pair.target)
            ));
            released.insert(pair.target);
        }
    }

    remove_empty_dir(&symlink_dir.join(name))?;

    ctx.settings.modify_bootstrap(|mut doc| {
        doc.symlinks.retain(|key, _| !is_link_key(key, name));
        doc
    })?;

    let cache_file = ctx.settings.targets_file();
    let cache = targets::read(&cache_file)?;
    targets::write(&cache_file, &cache.difference(&released).cloned().collect())?;
    Ok(())
}

/// Remove the link at `pair.target` so the stowed file can move back.
///
/// Dangling links are removed too; anything else refuses to be clobbered.
fn clear_link(ctx: &Context, pair: &LinkPair) -> Result<()> {
    if !exists_no_follow(&pair.target) {
        return Ok(());
    }
    let ours = same_file(&pair.target, &pair.source);
    let dangling = is_symlink(&pair.target) && !pair.target.exists();
    if !(is_symlink(&pair.target) && ours) && !dangling {
        return Err(CiderError::Symlink(format!(
            "{} symlink target already exists at: {}",
            ctx.display(&pair.source),
            ctx.display(&pair.target)
        ))
        .into());
    }
    SymlinkResource::new(pair.source.clone(), pair.target.clone())
        .remove()
        .with_context(|| format!("removing link: {}", pair.target.display()))?;
    Ok(())
}

fn remove_empty_dir(dir: &Path) -> Result<()> {
    match std::fs::remove_dir(dir) {
        Ok(()) => Ok(()),
        Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::DirectoryNotEmpty) => Ok(()),
        Err(e) => Err(e).with_context(|| format!("removing {}", dir.display())),
    }
}
