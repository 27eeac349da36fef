//! Command-line surface.
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::defaults::GLOBAL_DOMAIN;
use crate::error::CiderError;

/// Release version, or the package version for local builds.
pub const VERSION: &str = match option_env!("CIDER_VERSION") {
    Some(v) => v,
    None => env!("CARGO_PKG_VERSION"),
};

/// Top-level CLI entry point.
#[derive(Parser, Debug)]
#[command(
    name = "cider",
    about = "Bootstrap a Mac from a declarative config: packages, defaults, icons and dotfiles",
    version = VERSION
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Flags accepted by every subcommand.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Show every command run and pass --debug to brew
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Enable verbose output and pass --verbose to brew
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Override the config directory (default: $CIDER_DIR or ~/.config/cider)
    #[arg(long, global = true, value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    /// Override the support directory holding the symlink cache and log
    #[arg(long, global = true, value_name = "DIR")]
    pub support_dir: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Install formulas and add them to the bootstrap
    Install(InstallOpts),
    /// Uninstall formulas and remove them from the bootstrap
    Rm(RemoveOpts),
    /// List bootstrapped formulas
    #[command(visible_alias = "ls")]
    List(ListOpts),
    /// Show installed formulas missing from the bootstrap
    Missing,
    /// List taps, add one, or show `missing` taps
    Tap {
        /// Tap to add, or `missing`
        name: Option<String>,
    },
    /// Untap a repository and remove it from the bootstrap
    Untap {
        /// Tap to remove
        name: String,
    },
    /// Symlink every declared dotfile and prune dead links
    Relink {
        /// Move conflicting files to the trash
        #[arg(short, long)]
        force: bool,
    },
    /// Write a preference and record it
    #[command(visible_alias = "write")]
    SetDefault(SetDefaultOpts),
    /// Delete a preference and forget it
    #[command(visible_alias = "delete")]
    RemoveDefault(RemoveDefaultOpts),
    /// Write every recorded preference
    ApplyDefaults,
    /// Set and record a custom application icon
    SetIcon {
        /// Application name, without `.app`
        app: String,
        /// Icon path or URL
        icon: String,
    },
    /// Restore an application's default icon
    RemoveIcon {
        /// Application name, without `.app`
        app: String,
    },
    /// Set every recorded icon
    ApplyIcons,
    /// Run the before and after hook scripts
    RunScripts(RunScriptsOpts),
    /// Install and configure everything the bootstrap declares
    Restore(RestoreOpts),
    /// Move files into the symlinks directory and link them back
    Addlink {
        /// Stow group under the symlinks directory
        name: String,
        /// Files or directories to adopt
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Move a stow group's files back and forget its links
    Unlink {
        /// Stow group under the symlinks directory
        name: String,
    },
    /// Manage casks instead of formulas
    Cask {
        /// Package operation to run in cask mode.
        #[command(subcommand)]
        command: CaskCommand,
    },
    /// Generate shell completions
    Completions {
        /// Target shell
        shell: clap_complete::Shell,
    },
}

/// Package subcommands available in cask mode.
#[derive(Subcommand, Debug)]
pub enum CaskCommand {
    /// Install casks and add them to the bootstrap
    Install(InstallOpts),
    /// Uninstall casks and remove them from the bootstrap
    Rm(RemoveOpts),
    /// List bootstrapped casks
    #[command(visible_alias = "ls")]
    List(ListOpts),
    /// Show installed casks missing from the bootstrap
    Missing,
}

/// Options for `install`.
#[derive(Args, Debug, Clone)]
pub struct InstallOpts {
    /// Pass --force to brew
    #[arg(short, long)]
    pub force: bool,

    /// Packages to install
    #[arg(required = true)]
    pub names: Vec<String>,
}

/// Options for `rm`.
#[derive(Args, Debug, Clone)]
pub struct RemoveOpts {
    /// Packages to remove
    #[arg(required = true)]
    pub names: Vec<String>,
}

/// Options for `list`.
#[derive(Args, Debug, Clone)]
pub struct ListOpts {
    /// Only show packages starting with this prefix
    pub prefix: Option<String>,
}

/// Options for `set-default`.
#[derive(Args, Debug, Clone)]
pub struct SetDefaultOpts {
    /// Write to NSGlobalDomain; arguments shift to KEY VALUE
    #[arg(short, long = "global")]
    pub global: bool,

    /// Pass -f to `defaults write`
    #[arg(short, long)]
    pub force: bool,

    /// Preference domain (or the key with --global)
    pub domain: String,

    /// Key (or the value with --global)
    pub key: String,

    /// Value; yes/no become booleans, numbers keep their type
    pub value: Option<String>,
}

impl SetDefaultOpts {
    /// Resolve the positional arguments into `(domain, key, value)`.
    ///
    /// # Errors
    ///
    /// Returns [`CiderError::InvalidArgument`] when the argument count does
    /// not match `--global`.
    pub fn resolve(&self) -> Result<(String, String, String), CiderError> {
        match (self.global, &self.value) {
            (true, None) => Ok((
                GLOBAL_DOMAIN.to_string(),
                self.domain.clone(),
                self.key.clone(),
            )),
            (false, Some(value)) => Ok((self.domain.clone(), self.key.clone(), value.clone())),
            (true, Some(_)) => Err(CiderError::InvalidArgument(
                "--global takes KEY VALUE, not a domain".to_string(),
            )),
            (false, None) => Err(CiderError::InvalidArgument(
                "missing VALUE (usage: set-default DOMAIN KEY VALUE)".to_string(),
            )),
        }
    }
}

/// Options for `remove-default`.
#[derive(Args, Debug, Clone)]
pub struct RemoveDefaultOpts {
    /// Delete from NSGlobalDomain; the first argument is the key
    #[arg(short, long = "global")]
    pub global: bool,

    /// Preference domain (or the key with --global)
    pub domain: String,

    /// Key to delete; omit to delete the whole domain
    pub key: Option<String>,
}

impl RemoveDefaultOpts {
    /// Resolve the positional arguments into `(domain, key)`.
    ///
    /// # Errors
    ///
    /// Returns [`CiderError::InvalidArgument`] when `--global` is combined
    /// with a domain.
    pub fn resolve(&self) -> Result<(String, Option<String>), CiderError> {
        match (self.global, &self.key) {
            (true, None) => Ok((GLOBAL_DOMAIN.to_string(), Some(self.domain.clone()))),
            (true, Some(_)) => Err(CiderError::InvalidArgument(
                "--global takes only KEY, not a domain".to_string(),
            )),
            (false, key) => Ok((self.domain.clone(), key.clone())),
        }
    }
}

/// Options for `run-scripts`.
#[derive(Args, Debug, Clone)]
pub struct RunScriptsOpts {
    /// Only run before-scripts
    #[arg(long, conflicts_with = "after")]
    pub before: bool,

    /// Only run after-scripts
    #[arg(long)]
    pub after: bool,
}

impl RunScriptsOpts {
    /// Which hooks to run as `(before, after)`; neither flag means both.
    #[must_use]
    pub const fn hooks(&self) -> (bool, bool) {
        if self.before || self.after {
            (self.before, self.after)
        } else {
            (true, true)
        }
    }
}

/// Options for `restore`.
#[derive(Args, Debug, Clone)]
pub struct RestoreOpts {
    /// Warn about packages that fail to install instead of asking
    #[arg(short, long)]
    pub ignore_errors: bool,
}
