//! Restore prerequisites: OS release, Command Line Tools and Homebrew.
use anyhow::Result;
use std::fmt;
use std::path::Path;

use crate::error::CiderError;
use crate::exec::Executor;
use crate::tasks::Context;

/// Oldest supported macOS release.
pub const MIN_VERSION: OsVersion = OsVersion { major: 10, minor: 9 };

/// Where to get the Command Line Tools.
pub const XCODE_URL: &str = "https://developer.apple.com/xcode/resources/";

/// Where to get Homebrew.
pub const BREW_URL: &str = "https://brew.sh";

/// A macOS product version, compared on major and minor numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct OsVersion {
    /// `10`, `11`, ...
    pub major: u32,
    /// `9` in `10.9.5`.
    pub minor: u32,
}

impl OsVersion {
    /// Parse `sw_vers -productVersion` output such as `10.15.7` or `14`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.trim().split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = match parts.next() {
            Some(minor) => minor.parse().ok()?,
            None => 0,
        };
        Some(Self { major, minor })
    }
}

impl fmt::Display for OsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Fail unless the running release is at least [`MIN_VERSION`].
///
/// # Errors
///
/// Returns [`CiderError::UnsupportedOs`] for an older or unparseable
/// release, or an error if `sw_vers` cannot be run.
pub fn check_os(executor: &dyn Executor) -> Result<()> {
    let raw = executor.run("sw_vers", &["-productVersion"])?.stdout;
    match OsVersion::parse(&raw) {
        Some(version) if version >= MIN_VERSION => Ok(()),
        _ => Err(CiderError::UnsupportedOs {
            version: raw.trim().to_string(),
        }
        .into()),
    }
}

/// True if the active developer directory has a `git` binary.
#[must_use]
pub fn has_xcode_tools(executor: &dyn Executor) -> bool {
    executor
        .run_unchecked("xcode-select", &["-print-path"])
        .is_ok_and(|r| r.success && Path::new(r.stdout.trim()).join("usr/bin/git").exists())
}

/// Make sure the Command Line Tools are installed, offering to install them.
///
/// # Errors
///
/// Returns [`CiderError::XcodeMissing`] if they are still missing after the
/// installer was offered.
pub fn check_xcode(ctx: &Context) -> Result<()> {
    if has_xcode_tools(ctx.executor.as_ref()) {
        return Ok(());
    }

    ctx.log
        .info("Installing the Command Line Tools (expect a GUI popup):");
    ctx.executor.run_unchecked("xcode-select", &["--install"])?;
    ctx.prompt
        .pause("Press return when the installation is complete.");

    if has_xcode_tools(ctx.executor.as_ref()) {
        Ok(())
    } else {
        Err(CiderError::XcodeMissing {
            url: XCODE_URL.to_string(),
        }
        .into())
    }
}

/// Fail unless `brew` is on `PATH`.
///
/// # Errors
///
/// Returns [`CiderError::BrewMissing`] otherwise.
pub fn check_brew(executor: &dyn Executor) -> Result<()> {
    if executor.which("brew") {
        Ok(())
    } else {
        Err(CiderError::BrewMissing {
            url: BREW_URL.to_string(),
        }
        .into())
    }
}

/// Run every prerequisite check, in order.
///
/// # Errors
///
/// Returns the first failing check's error.
pub fn assert_requirements(ctx: &Context) -> Result<()> {
    check_os(ctx.executor.as_ref())?;
    check_xcode(ctx)?;
    check_brew(ctx.executor.as_ref())
}
