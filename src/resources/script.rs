//! Hook scripts from `before-scripts` / `after-scripts`.
use anyhow::Result;
use std::path::PathBuf;

use super::{Applicable, ResourceChange};
use crate::exec::Executor;

/// One hook command line, run with `sh -c` inside the config directory.
pub struct ScriptResource<'a> {
    /// The command line.
    pub script: String,
    /// Working directory.
    pub dir: PathBuf,
    executor: &'a dyn Executor,
}

impl std::fmt::Debug for ScriptResource<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptResource")
            .field("script", &self.script)
            .field("dir", &self.dir)
            .finish_non_exhaustive()
    }
}

impl<'a> ScriptResource<'a> {
    /// Create a script resource.
    #[must_use]
    pub const fn new(script: String, dir: PathBuf, executor: &'a dyn Executor) -> Self {
        Self {
            script,
            dir,
            executor,
        }
    }
}

impl Applicable for ScriptResource<'_> {
    fn description(&self) -> String {
        self.script.clone()
    }

    fn apply(&self) -> Result<ResourceChange> {
        self.executor.run_shell(&self.dir, &self.script)?;
        Ok(ResourceChange::Applied)
    }
}
