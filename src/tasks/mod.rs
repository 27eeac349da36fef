//! Named restore steps and the runner that records their outcomes.
pub mod context;
pub mod defaults;
pub mod hooks;
pub mod icons;
pub mod packages;
pub mod symlinks;

pub use context::Context;

use anyhow::Result;

use crate::logging::TaskStatus;

/// Outcome of a task that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskResult {
    /// Task ran to completion.
    Ok,
    /// Task decided there was nothing to do.
    Skipped(String),
}

/// A named, executable restore step.
pub trait Task: Send + Sync {
    /// Human-readable task name.
    fn name(&self) -> &str;

    /// Whether the bootstrap declares anything for this task.
    fn should_run(&self, ctx: &Context) -> bool;

    /// Execute the task.
    ///
    /// # Errors
    ///
    /// Returns an error if an external command fails, a document cannot be
    /// read, or the filesystem refuses a change.
    fn run(&self, ctx: &Context) -> Result<TaskResult>;
}

/// The restore sequence, in execution order.
#[must_use]
pub fn restore_tasks(ignore_errors: bool) -> Vec<Box<dyn Task>> {
    vec![
        Box::new(hooks::RunScripts::new(hooks::Hook::Before)),
        Box::new(packages::RegisterTaps),
        Box::new(packages::InstallPackages { ignore_errors }),
        Box::new(symlinks::Relink),
        Box::new(defaults::ApplyDefaults),
        Box::new(icons::ApplyIcons),
        Box::new(hooks::RunScripts::new(hooks::Hook::After)),
    ]
}

/// Execute a task, recording the result in the logger.
///
/// # Errors
///
/// Returns the task's error after recording it as failed.
pub fn execute(task: &dyn Task, ctx: &Context) -> Result<()> {
    if !task.should_run(ctx) {
        ctx.log
            .debug(&format!("skipping task: {} (nothing declared)", task.name()));
        ctx.log
            .record_task(task.name(), TaskStatus::Skipped, Some("nothing declared"));
        return Ok(());
    }

    ctx.log.stage(task.name());

    match task.run(ctx) {
        Ok(TaskResult::Ok) => {
            ctx.log.record_task(task.name(), TaskStatus::Ok, None);
            Ok(())
        }
        Ok(TaskResult::Skipped(reason)) => {
            ctx.log.info(&format!("skipped: {reason}"));
            ctx.log
                .record_task(task.name(), TaskStatus::Skipped, Some(&reason));
            Ok(())
        }
        Err(e) => {
            ctx.log
                .record_task(task.name(), TaskStatus::Failed, Some(&format!("{e:#}")));
            Err(e)
        }
    }
}

/// Run `tasks` in order, stopping at the first failure.
///
/// Tasks after a failure are recorded as skipped so the summary lists the
/// whole sequence.
///
/// # Errors
///
/// Returns the first task error.
pub fn run_all(tasks: &[Box<dyn Task>], ctx: &Context) -> Result<()> {
    for (i, task) in tasks.iter().enumerate() {
        if let Err(e) = execute(task.as_ref(), ctx) {
            for rest in tasks.iter().skip(i + 1) {
                ctx.log
                    .record_task(rest.name(), TaskStatus::Skipped, Some("earlier step failed"));
            }
            return Err(e);
        }
    }
    Ok(())
}

/// Shared fixtures for task, link and command unit tests.
#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
pub mod test_helpers {
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    use super::Context;
    use crate::config::{Bootstrap, Settings, store};
    use crate::logging::test_helpers::RecordingLog;
    use crate::prompt::MockPrompt;
    use crate::resources::test_helpers::MockExecutor;

    /// A throwaway home directory with cider's config and support
    /// directories laid out the way a real machine has them.
    #[derive(Debug)]
    pub struct Sandbox {
        dir: tempfile::TempDir,
        home: PathBuf,
        /// Messages logged through contexts built from this sandbox.
        pub log: Arc<RecordingLog>,
        /// Executor shared by contexts built from this sandbox.
        pub exec: Arc<MockExecutor>,
    }

    impl Sandbox {
        /// Sandbox whose executor succeeds with empty output.
        pub fn new() -> Self {
            Self::with_executor(MockExecutor::default())
        }

        /// Sandbox with a scripted executor.
        pub fn with_executor(exec: MockExecutor) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let home = std::fs::canonicalize(dir.path()).unwrap().join("home");
            let sb = Self {
                dir,
                home,
                log: Arc::new(RecordingLog::default()),
                exec: Arc::new(exec),
            };
            std::fs::create_dir_all(sb.symlink_dir()).unwrap();
            std::fs::create_dir_all(&sb.settings().support_dir).unwrap();
            sb
        }

        /// Home directory.
        pub fn home(&self) -> PathBuf {
            self.home.clone()
        }

        /// Temp root holding the home directory.
        pub fn root(&self) -> &Path {
            self.dir.path()
        }

        /// Directory layout rooted in this sandbox.
        pub fn settings(&self) -> Settings {
            Settings::new(
                self.home.join(".config").join("cider"),
                self.home
                    .join("Library")
                    .join("Application Support")
                    .join("cider"),
                self.home.clone(),
            )
        }

        /// Managed symlink root.
        pub fn symlink_dir(&self) -> PathBuf {
            self.settings().symlink_dir()
        }

        /// Write `content` to `rel` under the managed root.
        pub fn stow(&self, rel: &str, content: &str) -> PathBuf {
            let path = self.symlink_dir().join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, content).unwrap();
            path
        }

        /// Replace the bootstrap document.
        pub fn write_bootstrap(&self, doc: &Bootstrap) {
            store::write(&self.settings().bootstrap_file(), doc).unwrap();
        }

        /// Context whose prompt fails the test if it is asked anything.
        pub fn context(&self) -> Context {
            self.context_with_prompt(MockPrompt::new())
        }

        /// Context answering prompts through `prompt`.
        pub fn context_with_prompt(&self, prompt: MockPrompt) -> Context {
            Context::new(
                self.settings(),
                Arc::clone(&self.log) as Arc<dyn crate::logging::Log>,
                Arc::clone(&self.exec) as Arc<dyn crate::exec::Executor>,
                Arc::new(prompt),
            )
        }
    }
}
