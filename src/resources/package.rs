//! Homebrew gateway and the package resource.
use std::collections::BTreeSet;

use anyhow::Result;

use super::{Applicable, Resource, ResourceChange, ResourceState};
use crate::config::bootstrap::package_name;
use crate::exec::Executor;

/// Formats and issues `brew` commands for one package kind.
///
/// Formula mode passes `--formula` where brew needs disambiguation; cask
/// mode passes `--cask`.  `--debug`/`--verbose` are forwarded to every
/// command except listings.
#[derive(Clone, Copy)]
pub struct Homebrew<'a> {
    executor: &'a dyn Executor,
    cask: bool,
    debug: bool,
    verbose: bool,
}

impl std::fmt::Debug for Homebrew<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Homebrew")
            .field("executor", &"<dyn Executor>")
            .field("cask", &self.cask)
            .field("debug", &self.debug)
            .field("verbose", &self.verbose)
            .finish()
    }
}

impl<'a> Homebrew<'a> {
    /// Create a gateway for formulas (`cask = false`) or casks.
    #[must_use]
    pub const fn new(executor: &'a dyn Executor, cask: bool) -> Self {
        Self {
            executor,
            cask,
            debug: false,
            verbose: false,
        }
    }

    /// Forward `--debug` and `--verbose` to brew.
    #[must_use]
    pub const fn with_flags(mut self, debug: bool, verbose: bool) -> Self {
        self.debug = debug;
        self.verbose = verbose;
        self
    }

    /// The same gateway switched to the other package kind.
    #[must_use]
    pub const fn kind(self, cask: bool) -> Self {
        Self { cask, ..self }
    }

    /// `"cask"` or `"formula"`, for messages.
    #[must_use]
    pub const fn noun(&self) -> &'static str {
        if self.cask { "cask" } else { "formula" }
    }

    const fn kind_flag(&self) -> &'static str {
        if self.cask { "--cask" } else { "--formula" }
    }

    fn args<'s>(&self, cmd: &'s str, rest: impl IntoIterator<Item = &'s str>) -> Vec<&'s str> {
        let mut args = vec![cmd];
        if self.cask {
            args.push("--cask");
        }
        args.extend(rest);
        if self.debug {
            args.push("--debug");
        }
        if self.verbose {
            args.push("--verbose");
        }
        args
    }

    /// `brew install [--cask] NAME... [--force]`.
    ///
    /// Declared entries may carry flags after the name; they are passed
    /// through.
    ///
    /// # Errors
    ///
    /// Returns [`CommandFailed`](crate::error::CiderError::CommandFailed) on
    /// a non-zero exit.
    pub fn install(&self, entries: &[String], force: bool) -> Result<()> {
        let mut rest: Vec<&str> = entries.iter().flat_map(|e| e.split_whitespace()).collect();
        if force {
            rest.push("--force");
        }
        self.executor.run_interactive("brew", &self.args("install", rest))
    }

    /// `brew upgrade [--cask] ENTRY`.
    ///
    /// # Errors
    ///
    /// Returns an error on a non-zero exit.
    pub fn upgrade(&self, entry: &str) -> Result<()> {
        self.executor
            .run_interactive("brew", &self.args("upgrade", entry.split_whitespace()))
    }

    /// `brew uninstall [--cask --zap] NAME... [--force]`.
    ///
    /// # Errors
    ///
    /// Returns an error on a non-zero exit.
    pub fn remove(&self, names: &[String], force: bool) -> Result<()> {
        let mut rest: Vec<&str> = Vec::new();
        if self.cask {
            rest.push("--zap");
        }
        rest.extend(names.iter().map(String::as_str));
        if force {
            rest.push("--force");
        }
        self.executor.run_interactive("brew", &self.args("uninstall", rest))
    }

    /// Names of installed packages of this kind.
    ///
    /// # Errors
    ///
    /// Returns an error if `brew list` fails.
    pub fn list_installed(&self) -> Result<BTreeSet<String>> {
        let result = self
            .executor
            .run("brew", &["list", "-1", self.kind_flag()])?;
        Ok(lines(&result.stdout))
    }

    /// Installed formulas that depend on `name`, directly or not.
    ///
    /// # Errors
    ///
    /// Returns an error if `brew uses` cannot be spawned.
    pub fn reverse_dependents(&self, name: &str) -> Result<BTreeSet<String>> {
        let result = self
            .executor
            .run_unchecked("brew", &["uses", "--installed", "--recursive", name])?;
        Ok(if result.success {
            lines(&result.stdout)
        } else {
            BTreeSet::new()
        })
    }

    /// Installed packages of this kind with a newer version available.
    ///
    /// # Errors
    ///
    /// Returns an error if `brew outdated` fails.
    pub fn list_outdated(&self) -> Result<BTreeSet<String>> {
        let result = self
            .executor
            .run("brew", &["outdated", "--quiet", self.kind_flag()])?;
        Ok(lines(&result.stdout))
    }

    /// Repositories currently tapped.
    ///
    /// # Errors
    ///
    /// Returns an error if `brew tap` fails.
    pub fn taps(&self) -> Result<BTreeSet<String>> {
        let result = self.executor.run("brew", &["tap"])?;
        Ok(lines(&result.stdout))
    }

    /// `brew tap NAME`.
    ///
    /// # Errors
    ///
    /// Returns an error on a non-zero exit.
    pub fn tap(&self, name: &str) -> Result<()> {
        self.executor.run_interactive("brew", &["tap", name])
    }

    /// `brew untap NAME`.
    ///
    /// # Errors
    ///
    /// Returns an error on a non-zero exit.
    pub fn untap(&self, name: &str) -> Result<()> {
        self.executor.run_interactive("brew", &["untap", name])
    }
}

/// Non-empty trimmed lines, skipping `==>` section headers.
fn lines(output: &str) -> BTreeSet<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with("==>"))
        .map(String::from)
        .collect()
}

/// A declared package: installed when missing, upgraded when outdated.
#[derive(Debug)]
pub struct PackageResource<'a> {
    /// Declared entry, name first, optional flags after.
    pub entry: String,
    brew: Homebrew<'a>,
    installed: &'a BTreeSet<String>,
    outdated: &'a BTreeSet<String>,
}

impl<'a> PackageResource<'a> {
    /// Create a package resource checked against pre-fetched listings.
    #[must_use]
    pub const fn new(
        entry: String,
        brew: Homebrew<'a>,
        installed: &'a BTreeSet<String>,
        outdated: &'a BTreeSet<String>,
    ) -> Self {
        Self {
            entry,
            brew,
            installed,
            outdated,
        }
    }

    /// Package name without flags.
    #[must_use]
    pub fn name(&self) -> &str {
        package_name(&self.entry)
    }
}

impl Applicable for PackageResource<'_> {
    fn description(&self) -> String {
        format!("{} ({})", self.name(), self.brew.noun())
    }

    fn apply(&self) -> Result<ResourceChange> {
        match self.current_state()? {
            ResourceState::Correct => Ok(ResourceChange::AlreadyCorrect),
            ResourceState::Incorrect { .. } => {
                self.brew.upgrade(&self.entry)?;
                Ok(ResourceChange::Applied)
            }
            ResourceState::Missing | ResourceState::Invalid { .. } => {
                self.brew.install(std::slice::from_ref(&self.entry), false)?;
                Ok(ResourceChange::Applied)
            }
        }
    }

    fn remove(&self) -> Result<ResourceChange> {
        if !self.installed.contains(self.name()) {
            return Ok(ResourceChange::AlreadyCorrect);
        }
        self.brew.remove(&[self.name().to_string()], false)?;
        Ok(ResourceChange::Applied)
    }
}

impl Resource for PackageResource<'_> {
    fn current_state(&self) -> Result<ResourceState> {
        let name = self.name();
        Ok(if !self.installed.contains(name) {
            ResourceState::Missing
        } else if self.outdated.contains(name) {
            ResourceState::Incorrect {
                current: "outdated".to_string(),
            }
        } else {
            ResourceState::Correct
        })
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::resources::test_helpers::MockExecutor;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn install_formula_passes_entry_flags() {
        let exec = MockExecutor::default();
        Homebrew::new(&exec, false)
            .install(&names(&["wget --with-iri", "git"]), true)
            .unwrap();
        assert_eq!(exec.calls(), ["brew install wget --with-iri git --force"]);
    }

    #[test]
    fn install_cask_and_debug_flags() {
        let exec = MockExecutor::default();
        Homebrew::new(&exec, true)
            .with_flags(true, true)
            .install(&names(&["iterm2"]), false)
            .unwrap();
        assert_eq!(exec.calls(), ["brew install --cask iterm2 --debug --verbose"]);
    }

    #[test]
    fn remove_cask_zaps() {
        let exec = MockExecutor::default();
        Homebrew::new(&exec, true)
            .remove(&names(&["iterm2"]), false)
            .unwrap();
        assert_eq!(exec.calls(), ["brew uninstall --cask --zap iterm2"]);
    }

    #[test]
    fn remove_formula() {
        let exec = MockExecutor::default();
        Homebrew::new(&exec, false)
            .remove(&names(&["wget"]), false)
            .unwrap();
        assert_eq!(exec.calls(), ["brew uninstall wget"]);
    }

    #[test]
    fn listings_do_not_forward_debug() {
        let exec = MockExecutor::with_responses(vec![(true, "git\nwget\n")]);
        let installed = Homebrew::new(&exec, false)
            .with_flags(true, false)
            .list_installed()
            .unwrap();
        assert_eq!(installed.into_iter().collect::<Vec<_>>(), ["git", "wget"]);
        assert_eq!(exec.calls(), ["brew list -1 --formula"]);
    }

    #[test]
    fn list_skips_section_headers() {
        let exec = MockExecutor::with_responses(vec![(true, "==> Casks\niterm2\n\n")]);
        let installed = Homebrew::new(&exec, true).list_installed().unwrap();
        assert_eq!(installed.len(), 1);
        assert_eq!(exec.calls(), ["brew list -1 --cask"]);
    }

    #[test]
    fn reverse_dependents_tolerates_failure() {
        let exec = MockExecutor::with_responses(vec![(false, "")]);
        let uses = Homebrew::new(&exec, false).reverse_dependents("openssl").unwrap();
        assert!(uses.is_empty());
        assert_eq!(exec.calls(), ["brew uses --installed --recursive openssl"]);
    }

    #[test]
    fn failed_install_carries_argv() {
        let exec = MockExecutor::with_responses(vec![(false, "")]);
        let err = Homebrew::new(&exec, false)
            .install(&names(&["nope"]), false)
            .unwrap_err();
        assert!(err.to_string().contains("brew install nope"));
    }

    #[test]
    fn package_resource_states() {
        let exec = MockExecutor::default();
        let brew = Homebrew::new(&exec, false);
        let installed: BTreeSet<String> = ["git", "wget"].iter().map(|s| (*s).to_string()).collect();
        let outdated: BTreeSet<String> = ["wget"].iter().map(|s| (*s).to_string()).collect();

        let git = PackageResource::new("git".to_string(), brew, &installed, &outdated);
        let wget = PackageResource::new("wget --with-iri".to_string(), brew, &installed, &outdated);
        let jq = PackageResource::new("jq".to_string(), brew, &installed, &outdated);

        assert_eq!(git.current_state().unwrap(), ResourceState::Correct);
        assert!(matches!(wget.current_state().unwrap(), ResourceState::Incorrect { .. }));
        assert_eq!(jq.current_state().unwrap(), ResourceState::Missing);

        assert_eq!(git.apply().unwrap(), ResourceChange::AlreadyCorrect);
        assert_eq!(wget.apply().unwrap(), ResourceChange::Applied);
        assert_eq!(jq.apply().unwrap(), ResourceChange::Applied);
        assert_eq!(
            exec.calls(),
            ["brew upgrade wget --with-iri", "brew install jq"]
        );
    }
}
