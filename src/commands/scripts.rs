//! Command: `run-scripts`.
use anyhow::Result;

use crate::tasks::Context;
use crate::tasks::hooks::{self, Hook};

/// Run the `before-scripts` and/or `after-scripts` hooks, in that order.
///
/// # Errors
///
/// Returns the first failing script's error.
pub fn run_scripts(ctx: &Context, before: bool, after: bool) -> Result<()> {
    let selected: Vec<Hook> = [(before, Hook::Before), (after, Hook::After)]
        .into_iter()
        .filter_map(|(on, hook)| on.then_some(hook))
        .collect();
    let count = hooks::run_scripts(ctx, &selected)?;
    ctx.log.debug(&format!("{count} scripts ran"));
    Ok(())
}
