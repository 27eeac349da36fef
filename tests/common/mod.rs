// Shared helpers for integration tests.
//
// Provides a throwaway home directory with cider's config and support
// directories, plus in-memory stand-ins for the logger, the executor and the
// prompt so commands can run end to end without touching the real machine.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use cider_cli::config::{Bootstrap, Settings, store};
use cider_cli::exec::{ExecResult, Executor};
use cider_cli::logging::{Log, TaskEntry, TaskStatus};
use cider_cli::prompt::Prompt;
use cider_cli::tasks::Context;

/// Captures every message as `"<level>: <text>"` and every task record.
#[derive(Debug, Default)]
pub struct MemoryLog {
    lines: Mutex<Vec<String>>,
    tasks: Mutex<Vec<TaskEntry>>,
}

impl MemoryLog {
    /// Messages logged so far, prefixed with their level.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().expect("log lock").clone()
    }

    /// Messages logged at `level` (`"info"`, `"warn"`, ...), without prefix.
    pub fn at(&self, level: &str) -> Vec<String> {
        let prefix = format!("{level}: ");
        self.lines()
            .into_iter()
            .filter_map(|l| l.strip_prefix(&prefix).map(String::from))
            .collect()
    }

    /// Task records so far.
    pub fn tasks(&self) -> Vec<TaskEntry> {
        self.tasks.lock().expect("task lock").clone()
    }

    fn push(&self, level: &str, msg: &str) {
        self.lines
            .lock()
            .expect("log lock")
            .push(format!("{level}: {msg}"));
    }
}

impl Log for MemoryLog {
    fn stage(&self, msg: &str) {
        self.push("stage", msg);
    }
    fn info(&self, msg: &str) {
        self.push("info", msg);
    }
    fn debug(&self, msg: &str) {
        self.push("debug", msg);
    }
    fn warn(&self, msg: &str) {
        self.push("warn", msg);
    }
    fn error(&self, msg: &str) {
        self.push("error", msg);
    }
    fn record_task(&self, name: &str, status: TaskStatus, message: Option<&str>) {
        self.tasks.lock().expect("task lock").push(TaskEntry {
            name: name.to_string(),
            status,
            message: message.map(String::from),
        });
    }
}

/// Records command lines and answers captured runs with queued stdout.
///
/// Every command succeeds; interactive and shell runs do not consume
/// queued output.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    calls: Mutex<Vec<String>>,
    outputs: Mutex<VecDeque<String>>,
    which: bool,
}

impl ScriptedExecutor {
    /// Executor answering successive captured runs with `outputs`.
    pub fn with_outputs(outputs: &[&str]) -> Self {
        Self {
            outputs: Mutex::new(outputs.iter().map(|s| (*s).to_string()).collect()),
            ..Self::default()
        }
    }

    /// Report every program as present on `PATH`.
    pub fn with_which(mut self) -> Self {
        self.which = true;
        self
    }

    /// Command lines received so far, space-joined.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }

    fn record(&self, program: &str, args: &[&str]) {
        let line = std::iter::once(program)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        self.calls.lock().expect("calls lock").push(line);
    }
}

impl Executor for ScriptedExecutor {
    fn run(&self, program: &str, args: &[&str]) -> anyhow::Result<ExecResult> {
        self.run_unchecked(program, args)
    }

    fn run_unchecked(&self, program: &str, args: &[&str]) -> anyhow::Result<ExecResult> {
        self.record(program, args);
        let stdout = self
            .outputs
            .lock()
            .expect("outputs lock")
            .pop_front()
            .unwrap_or_default();
        Ok(ExecResult {
            stdout,
            success: true,
            code: Some(0),
            ..ExecResult::default()
        })
    }

    fn run_interactive(&self, program: &str, args: &[&str]) -> anyhow::Result<()> {
        self.record(program, args);
        Ok(())
    }

    fn run_shell(&self, _dir: &Path, script: &str) -> anyhow::Result<()> {
        self.record("sh", &["-c", script]);
        Ok(())
    }

    fn which(&self, _program: &str) -> bool {
        self.which
    }
}

/// Answers every confirmation the same way.
#[derive(Debug, Clone, Copy)]
pub struct Answer(pub bool);

impl Prompt for Answer {
    fn confirm(&self, _msg: &str) -> bool {
        self.0
    }

    fn pause(&self, _msg: &str) {}
}

/// An isolated home directory backed by a [`tempfile::TempDir`].
pub struct TestHome {
    /// Temporary directory holding `home/`.
    pub root: tempfile::TempDir,
    /// Logger shared by contexts built from this home.
    pub log: Arc<MemoryLog>,
    /// Executor shared by contexts built from this home.
    pub exec: Arc<ScriptedExecutor>,
    home: PathBuf,
}

impl TestHome {
    /// A home with empty config, support and symlinks directories.
    pub fn new() -> Self {
        Self::with_executor(ScriptedExecutor::default())
    }

    /// Same as [`new`](Self::new) with a scripted executor.
    pub fn with_executor(exec: ScriptedExecutor) -> Self {
        let root = tempfile::tempdir().expect("create temp dir");
        let home = std::fs::canonicalize(root.path())
            .expect("canonicalize temp dir")
            .join("home");
        let test_home = Self {
            root,
            log: Arc::new(MemoryLog::default()),
            exec: Arc::new(exec),
            home,
        };
        let settings = test_home.settings();
        std::fs::create_dir_all(settings.symlink_dir()).expect("create symlinks dir");
        std::fs::create_dir_all(&settings.support_dir).expect("create support dir");
        test_home
    }

    /// Home directory.
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Directory layout for this home.
    pub fn settings(&self) -> Settings {
        Settings::new(
            self.home.join(".config/cider"),
            self.home.join("Library/Application Support/cider"),
            self.home.clone(),
        )
    }

    /// Context with every collaborator pointed at this home.
    pub fn context(&self) -> Context {
        self.context_answering(false)
    }

    /// Context whose prompt answers `answer`.
    pub fn context_answering(&self, answer: bool) -> Context {
        Context::new(
            self.settings(),
            Arc::clone(&self.log) as Arc<dyn Log>,
            Arc::clone(&self.exec) as Arc<dyn Executor>,
            Arc::new(Answer(answer)),
        )
    }

    /// Write `content` to `rel` under the symlinks directory.
    pub fn stow(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.settings().symlink_dir().join(rel);
        std::fs::create_dir_all(path.parent().expect("stowed file has a parent"))
            .expect("create stow dir");
        std::fs::write(&path, content).expect("write stowed file");
        path
    }

    /// Write `content` to `rel` under the home directory.
    pub fn file(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.home.join(rel);
        std::fs::create_dir_all(path.parent().expect("file has a parent")).expect("create dir");
        std::fs::write(&path, content).expect("write file");
        path
    }

    /// Replace the bootstrap document.
    pub fn write_bootstrap(&self, doc: &Bootstrap) {
        store::write(&self.settings().bootstrap_file(), doc).expect("write bootstrap");
    }

    /// Current bootstrap document.
    pub fn bootstrap(&self) -> Bootstrap {
        self.settings().read_bootstrap().expect("read bootstrap")
    }

    /// Declare `rules` as the bootstrap's only content.
    pub fn with_rules(&self, rules: &[(&str, &str)]) {
        self.write_bootstrap(&Bootstrap {
            symlinks: rules
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            ..Bootstrap::default()
        });
    }

    /// Targets recorded in the symlink cache.
    pub fn cached_targets(&self) -> Vec<PathBuf> {
        cider_cli::config::targets::read(&self.settings().targets_file())
            .expect("read target cache")
            .into_iter()
            .collect()
    }
}

/// True if `path` is a symlink resolving to `expected`.
pub fn links_to(path: &Path, expected: &Path) -> bool {
    path.symlink_metadata()
        .is_ok_and(|m| m.file_type().is_symlink())
        && std::fs::canonicalize(path).ok() == std::fs::canonicalize(expected).ok()
}
