//! Restore step applying recorded application icons.
use anyhow::Result;

use super::{Context, Task, TaskResult};
use crate::resources::Applicable as _;
use crate::resources::icon::IconResource;

/// Apply every recorded icon.
///
/// # Errors
///
/// Returns [`AppMissing`](crate::error::CiderError::AppMissing) for the first
/// application that cannot be found, or an error if an icon cannot be
/// downloaded or set.
pub fn apply_icons(ctx: &Context) -> Result<()> {
    for (app, icon) in ctx.settings.read_bootstrap()?.icons {
        IconResource::new(app, icon, ctx.home().to_path_buf(), ctx.executor.as_ref()).apply()?;
    }
    ctx.log.info("Applied icons");
    Ok(())
}

/// Apply recorded application icons.
#[derive(Debug)]
pub struct ApplyIcons;

impl Task for ApplyIcons {
    fn name(&self) -> &str {
        "Apply icons"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        ctx.settings
            .read_bootstrap()
            .map_or(true, |b| !b.icons.is_empty())
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        apply_icons(ctx)?;
        Ok(TaskResult::Ok)
    }
}
