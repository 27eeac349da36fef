//! The [`Context`] threaded through every command and task.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Settings;
use crate::exec::Executor;
use crate::logging::Log;
use crate::prompt::Prompt;
use crate::resources::package::Homebrew;

/// Shared context for commands and restore tasks.
pub struct Context {
    /// Directory layout and document locations.
    pub settings: Settings,
    /// Logger for output and task recording.
    pub log: Arc<dyn Log>,
    /// Command executor (for testing or real system calls).
    pub executor: Arc<dyn Executor>,
    /// Interactive confirmations.
    pub prompt: Arc<dyn Prompt>,
    /// Forward `--debug` to external tools.
    pub debug: bool,
    /// Forward `--verbose` to external tools.
    pub verbose: bool,
    /// Package operations target casks instead of formulas.
    pub cask: bool,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("settings", &self.settings)
            .field("log", &"<dyn Log>")
            .field("executor", &"<dyn Executor>")
            .field("prompt", &"<dyn Prompt>")
            .field("debug", &self.debug)
            .field("verbose", &self.verbose)
            .field("cask", &self.cask)
            .finish()
    }
}

impl Context {
    /// Creates a new context.
    #[must_use]
    pub fn new(
        settings: Settings,
        log: Arc<dyn Log>,
        executor: Arc<dyn Executor>,
        prompt: Arc<dyn Prompt>,
    ) -> Self {
        Self {
            settings,
            log,
            executor,
            prompt,
            debug: false,
            verbose: false,
            cask: false,
        }
    }

    /// Set the debug and verbose flags forwarded to external tools.
    #[must_use]
    pub const fn with_flags(mut self, debug: bool, verbose: bool) -> Self {
        self.debug = debug;
        self.verbose = verbose;
        self
    }

    /// Route package operations to casks.
    #[must_use]
    pub const fn with_cask(mut self, cask: bool) -> Self {
        self.cask = cask;
        self
    }

    /// The user's home directory.
    #[must_use]
    pub fn home(&self) -> &Path {
        &self.settings.home
    }

    /// Managed symlink root.
    #[must_use]
    pub fn symlink_dir(&self) -> PathBuf {
        self.settings.symlink_dir()
    }

    /// Homebrew gateway for the active package kind.
    #[must_use]
    pub fn brew(&self) -> Homebrew<'_> {
        Homebrew::new(self.executor.as_ref(), self.cask).with_flags(self.debug, self.verbose)
    }

    /// Render `path` relative to home for messages.
    #[must_use]
    pub fn display(&self, path: &Path) -> String {
        crate::paths::collapse_home(path, &self.settings.home)
    }
}
