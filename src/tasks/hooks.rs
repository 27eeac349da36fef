//! Before and after hook scripts.
use anyhow::Result;

use super::{Context, Task, TaskResult};
use crate::config::Bootstrap;
use crate::resources::Applicable as _;
use crate::resources::script::ScriptResource;

/// Which hook list to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    /// `before-scripts`, run first during a restore.
    Before,
    /// `after-scripts`, run last during a restore.
    After,
}

impl Hook {
    const fn label(self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
        }
    }

    fn scripts(self, bootstrap: &Bootstrap) -> &[String] {
        match self {
            Self::Before => &bootstrap.before_scripts,
            Self::After => &bootstrap.after_scripts,
        }
    }
}

/// Run the declared scripts for each of `hooks`, in order.
///
/// Scripts run through `sh -c` with the config directory as working
/// directory. Returns how many ran.
///
/// # Errors
///
/// Returns [`CommandFailed`](crate::error::CiderError::CommandFailed) for the
/// first script that exits non-zero; later scripts do not run.
pub fn run_scripts(ctx: &Context, hooks: &[Hook]) -> Result<usize> {
    let bootstrap = ctx.settings.read_bootstrap()?;
    let mut count = 0;
    for hook in hooks {
        for script in hook.scripts(&bootstrap) {
            ctx.log
                .info(&format!("Running {} script: {script}", hook.label()));
            ScriptResource::new(
                script.clone(),
                ctx.settings.cider_dir.clone(),
                ctx.executor.as_ref(),
            )
            .apply()?;
            count += 1;
        }
    }
    Ok(count)
}

/// Run one hook list as a restore step.
#[derive(Debug)]
pub struct RunScripts {
    hook: Hook,
}

impl RunScripts {
    /// Step running `hook`'s scripts.
    #[must_use]
    pub const fn new(hook: Hook) -> Self {
        Self { hook }
    }
}

impl Task for RunScripts {
    fn name(&self) -> &str {
        match self.hook {
            Hook::Before => "Run before scripts",
            Hook::After => "Run after scripts",
        }
    }

    fn should_run(&self, ctx: &Context) -> bool {
        ctx.settings
            .read_bootstrap()
            .map_or(true, |b| !self.hook.scripts(&b).is_empty())
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let count = run_scripts(ctx, &[self.hook])?;
        ctx.log.debug(&format!("{count} {} scripts ran", self.hook.label()));
        Ok(TaskResult::Ok)
    }
}
