//! Directory layout and the persisted documents.
pub mod bootstrap;
pub mod defaults;
pub mod store;
pub mod targets;

use anyhow::Result;
use std::path::{Path, PathBuf};

pub use bootstrap::Bootstrap;
pub use defaults::{DefaultValue, Defaults};

/// Where cider keeps its state.
///
/// All paths are computed once at startup and passed down explicitly; no
/// module reads `$HOME` or the XDG variables on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Config directory holding the bootstrap and preferences documents.
    pub cider_dir: PathBuf,
    /// Support directory holding the target cache and the log file.
    pub support_dir: PathBuf,
    /// The user's home directory.
    pub home: PathBuf,
}

impl Settings {
    /// Build settings from explicit directories.
    #[must_use]
    pub const fn new(cider_dir: PathBuf, support_dir: PathBuf, home: PathBuf) -> Self {
        Self {
            cider_dir,
            support_dir,
            home,
        }
    }

    /// Resolve settings from command-line overrides and the environment.
    ///
    /// Config dir: override, `$CIDER_DIR`, `$XDG_CONFIG_HOME/cider`, then
    /// `~/.config/cider`.  Support dir: override, `$XDG_DATA_HOME/cider`,
    /// then `~/Library/Application Support/cider`.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn resolve(cider_dir: Option<PathBuf>, support_dir: Option<PathBuf>) -> Result<Self> {
        let home = crate::paths::home_dir()?;
        let env = |key: &str| std::env::var_os(key).filter(|v| !v.is_empty()).map(PathBuf::from);

        let cider_dir = cider_dir
            .or_else(|| env("CIDER_DIR"))
            .or_else(|| env("XDG_CONFIG_HOME").map(|p| p.join("cider")))
            .unwrap_or_else(|| home.join(".config").join("cider"));

        let support_dir = support_dir
            .or_else(|| env("XDG_DATA_HOME").map(|p| p.join("cider")))
            .unwrap_or_else(|| {
                home.join("Library")
                    .join("Application Support")
                    .join("cider")
            });

        Ok(Self::new(cider_dir, support_dir, home))
    }

    /// Managed root for stowed files and glob expansion.
    #[must_use]
    pub fn symlink_dir(&self) -> PathBuf {
        self.cider_dir.join("symlinks")
    }

    /// Bootstrap document; a legacy `bootstrap.json` wins when present.
    #[must_use]
    pub fn bootstrap_file(&self) -> PathBuf {
        prefer_legacy(&self.cider_dir, "bootstrap")
    }

    /// Preferences document; a legacy `defaults.json` wins when present.
    #[must_use]
    pub fn defaults_file(&self) -> PathBuf {
        prefer_legacy(&self.cider_dir, "defaults")
    }

    /// Cache of symlink targets created by the last reconciliation.
    #[must_use]
    pub fn targets_file(&self) -> PathBuf {
        self.support_dir.join("symlink_targets.json")
    }

    /// Persistent log file.
    #[must_use]
    pub fn log_file(&self) -> PathBuf {
        self.support_dir.join("cider.log")
    }

    /// Per-user trash used when `--force` displaces a conflicting target.
    #[must_use]
    pub fn trash_dir(&self) -> PathBuf {
        self.home.join(".Trash")
    }

    /// Read the bootstrap document (empty if absent).
    ///
    /// # Errors
    ///
    /// Returns [`CiderError::ConfigRead`](crate::error::CiderError::ConfigRead)
    /// if the file exists but cannot be parsed.
    pub fn read_bootstrap(&self) -> Result<Bootstrap> {
        store::read(&self.bootstrap_file(), Bootstrap::default())
    }

    /// Apply `transform` to the bootstrap document, writing only on change.
    ///
    /// List-valued fields are normalized (sorted, de-duplicated) before the
    /// comparison.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be read or written.
    pub fn modify_bootstrap(&self, transform: impl FnOnce(Bootstrap) -> Bootstrap) -> Result<bool> {
        store::modify(&self.bootstrap_file(), |doc: Bootstrap| {
            transform(doc).normalized()
        })
    }

    /// Read the preferences document (empty if absent).
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn read_defaults(&self) -> Result<Defaults> {
        store::read(&self.defaults_file(), Defaults::default())
    }

    /// Apply `transform` to the preferences document, writing only on change.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be read or written.
    pub fn modify_defaults(&self, transform: impl FnOnce(Defaults) -> Defaults) -> Result<bool> {
        store::modify(&self.defaults_file(), transform)
    }
}

fn prefer_legacy(dir: &Path, stem: &str) -> PathBuf {
    let legacy = dir.join(format!("{stem}.json"));
    if legacy.is_file() {
        legacy
    } else {
        dir.join(format!("{stem}.toml"))
    }
}
