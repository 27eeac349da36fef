//! Commands: `relink`, `addlink`, `unlink`.
use anyhow::Result;
use std::path::PathBuf;

use crate::links::{self, stow};
use crate::tasks::Context;

/// Reconcile every declared symlink and prune dead ones.
///
/// With `force`, occupied targets are moved to the trash and linked.
///
/// # Errors
///
/// Returns an error if the pass itself fails, or once it has finished if
/// any rule or pair could not be linked.
pub fn relink(ctx: &Context, force: bool) -> Result<()> {
    let report = links::relink(ctx, force)?;
    report.check()
}

/// Adopt `paths` into the stow group `name`.
///
/// # Errors
///
/// See [`stow::addlink`].
pub fn addlink(ctx: &Context, name: &str, paths: &[PathBuf]) -> Result<()> {
    stow::addlink(ctx, name, paths)
}

/// Release the stow group `name`.
///
/// # Errors
///
/// See [`stow::unlink`].
pub fn unlink(ctx: &Context, name: &str) -> Result<()> {
    stow::unlink(ctx, name)
}
