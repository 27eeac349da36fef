//! Symlink reconciliation.
//!
//! Every rule in the bootstrap `symlinks` table maps a source glob, rooted
//! at the managed symlink directory, to a target template.  A reconciliation
//! pass expands each rule into concrete `(source, target)` pairs, links them,
//! prunes links created by an earlier pass that are no longer declared, and
//! records the new target set in the target cache.
//!
//! ```text
//! rule ──validate──► ensure target dir ──glob──► pairs ──make_link──► linked
//!                                                                       │
//!                         old cache − linked ──prune──► write cache ◄───┘
//! ```
pub mod stow;

use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};

use crate::config::targets::{self, TargetCache};
use crate::error::CiderError;
use crate::paths::{expand_home, has_glob_meta, is_directory_target, is_within, real_path};
use crate::resources::fs::{ensure_parent_dir, move_to_trash};
use crate::resources::symlink::{SymlinkResource, is_symlink};
use crate::resources::{Applicable as _, Resource as _, ResourceChange, ResourceState};
use crate::tasks::Context;

/// A concrete link produced by expanding one rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkPair {
    /// Absolute path under the managed root.
    pub source: PathBuf,
    /// Absolute path the link is created at.
    pub target: PathBuf,
}

/// Outcome of a [`relink`] pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RelinkReport {
    /// Targets in a linked state at the end of the pass.
    pub linked: TargetCache,
    /// Dead links removed from a previous pass.
    pub pruned: Vec<PathBuf>,
    /// Rules or pairs that could not be linked.
    pub failures: usize,
}

impl RelinkReport {
    /// Fail if any rule or pair could not be linked.
    ///
    /// # Errors
    ///
    /// Returns an error naming the number of failures.
    pub fn check(&self) -> Result<()> {
        if self.failures > 0 {
            anyhow::bail!(
                "{} symlink{} could not be linked",
                self.failures,
                if self.failures == 1 { "" } else { "s" }
            );
        }
        Ok(())
    }
}

/// Expand one rule into link pairs.
///
/// The rule is validated before anything touches the filesystem.  The target
/// directory is then created, and the source pattern matched against
/// `symlink_dir`.  Patterns without metacharacters name a single source,
/// which is returned even if it does not exist so the caller reports it.
///
/// # Errors
///
/// Returns [`CiderError::InvalidSymlinkRule`] for a glob source with a file
/// target, or an error if the target directory cannot be created or the
/// managed root cannot be read.
pub fn expand(symlink_dir: &Path, home: &Path, pattern: &str, target: &str) -> Result<Vec<LinkPair>> {
    let directory_target = is_directory_target(target);
    if !directory_target && has_glob_meta(pattern) {
        return Err(CiderError::InvalidSymlinkRule {
            pattern: pattern.to_string(),
            target: target.to_string(),
        }
        .into());
    }

    let expanded = expand_home(target, home);
    if directory_target {
        std::fs::create_dir_all(&expanded)
            .with_context(|| format!("create target dir: {}", expanded.display()))?;
    } else {
        ensure_parent_dir(&expanded)?;
    }

    let sources = if has_glob_meta(pattern) {
        glob_sources(symlink_dir, pattern)?
    } else {
        vec![symlink_dir.join(pattern)]
    };

    Ok(sources
        .into_iter()
        .map(|source| {
            let target = match source.file_name() {
                Some(name) if directory_target => expanded.join(name),
                _ => expanded.clone(),
            };
            LinkPair { source, target }
        })
        .collect())
}

fn glob_sources(symlink_dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let root = glob::Pattern::escape(&symlink_dir.to_string_lossy());
    let full = format!("{root}/{pattern}");
    let options = glob::MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: true,
    };
    glob::glob_with(&full, options)
        .with_context(|| format!("invalid symlink pattern: {pattern}"))?
        .map(|entry| entry.with_context(|| format!("expanding {pattern}")))
        .collect()
}

/// Link `target` to `source`.
///
/// An occupied target is reported as an error, or as a warning when
/// `force` is set; with `force` the occupant is then moved to the trash and
/// linking is retried exactly once.
///
/// Returns whether the pair ends in a linked state.
///
/// # Errors
///
/// Returns [`CiderError::SymlinkSourceMissing`] if `source` does not exist,
/// or an error if the link cannot be created for a reason other than an
/// occupied target.
pub fn make_link(ctx: &Context, source: &Path, target: &Path, force: bool) -> Result<bool> {
    let trash_dir = ctx.settings.trash_dir();
    link_or_trash(ctx, source, target, force, |occupant| {
        move_to_trash(occupant, &trash_dir)
    })
}

fn link_or_trash(
    ctx: &Context,
    source: &Path,
    target: &Path,
    force: bool,
    trash: impl FnOnce(&Path) -> Result<PathBuf>,
) -> Result<bool> {
    if !source.exists() {
        return Err(CiderError::SymlinkSourceMissing(ctx.display(source)).into());
    }

    let link = SymlinkResource::new(source.to_path_buf(), target.to_path_buf());
    if try_link(ctx, &link, force)? {
        return Ok(true);
    }
    if !force {
        return Ok(false);
    }

    match trash(target) {
        Ok(_) => ctx.log.info(&format!("Moved {} to trash", ctx.display(target))),
        Err(e) => {
            ctx.log.error(&format!(
                "Error moving {} to trash: {e:#}",
                ctx.display(target)
            ));
            return Ok(false);
        }
    }

    // Second attempt; a target that is still occupied is an error now.
    try_link(ctx, &link, false)
}

fn try_link(ctx: &Context, link: &SymlinkResource, force: bool) -> Result<bool> {
    let source = ctx.display(&link.source);
    let target = ctx.display(&link.target);

    match link.apply()? {
        ResourceChange::Applied => {
            ctx.log.info(&format!("symlinked {target} -> {source}"));
            Ok(true)
        }
        ResourceChange::AlreadyCorrect => {
            ctx.log.debug(&format!("Already linked: {target} -> {source}"));
            Ok(true)
        }
        ResourceChange::Skipped { .. } => {
            let msg = match link.current_state()? {
                ResourceState::Incorrect { current } => format!(
                    "Linked to wrong target: {target} -> {} (instead of {source})",
                    ctx.display(Path::new(&current))
                ),
                _ => format!("{source} symlink target already exists at: {target}"),
            };
            if force {
                ctx.log.warn(&msg);
            } else {
                ctx.log.error(&msg);
            }
            Ok(false)
        }
    }
}

/// Reconcile every declared rule against the filesystem.
///
/// Failures of one rule or pair are logged and counted; the remaining rules
/// still run, dead links are still pruned and the cache is still written.
/// Callers decide whether a report with failures is fatal (see
/// [`RelinkReport::check`]).
///
/// # Errors
///
/// Returns an error if the bootstrap document or target cache cannot be
/// read, a dead link cannot be removed, or the cache cannot be written.
pub fn relink(ctx: &Context, force: bool) -> Result<RelinkReport> {
    let bootstrap = ctx.settings.read_bootstrap()?;
    let symlink_dir = ctx.symlink_dir();
    let cache_file = ctx.settings.targets_file();
    let previous = targets::read(&cache_file)?;

    let mut report = RelinkReport::default();
    for (pattern, target) in &bootstrap.symlinks {
        let pairs = match expand(&symlink_dir, ctx.home(), pattern, target) {
            Ok(pairs) => pairs,
            Err(e) => {
                ctx.log.error(&format!("{e:#}"));
                report.failures += 1;
                continue;
            }
        };

        for pair in pairs {
            match make_link(ctx, &pair.source, &pair.target, force) {
                Ok(true) => {
                    report.linked.insert(pair.target);
                }
                Ok(false) => report.failures += 1,
                Err(e) => {
                    ctx.log.error(&format!("{e:#}"));
                    report.failures += 1;
                }
            }
        }
    }

    let dead: Vec<&PathBuf> = previous.difference(&report.linked).collect();
    report.pruned = prune(ctx, &symlink_dir, dead)?;
    targets::write(&cache_file, &report.linked)?;

    ctx.log.debug(&format!(
        "{} linked, {} pruned, {} failed",
        report.linked.len(),
        report.pruned.len(),
        report.failures
    ));
    Ok(report)
}

/// Remove links from a previous pass that still resolve under `root`.
///
/// Anything that is no longer a symlink, or that resolves outside the
/// managed root, is left alone even when dangling.
fn prune<'p>(
    ctx: &Context,
    root: &Path,
    candidates: impl IntoIterator<Item = &'p PathBuf>,
) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();
    for target in candidates {
        if !is_symlink(target) || !is_within(&real_path(target), root) {
            ctx.log
                .debug(&format!("leaving stale target alone: {}", ctx.display(target)));
            continue;
        }
        SymlinkResource::new(real_path(target), target.clone())
            .remove()
            .with_context(|| format!("removing dead symlink: {}", target.display()))?;
        ctx.log
            .info(&format!("Removed dead symlink: {}", ctx.display(target)));
        removed.push(target.clone());
    }
    Ok(removed)
}
