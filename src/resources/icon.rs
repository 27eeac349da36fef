//! Custom application icons.
//!
//! Applications are located on disk (falling back to Spotlight) and their
//! icon is set or reset through `NSWorkspace`, driven by a JavaScript for
//! Automation snippet run with `osascript`.
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};

use super::{Applicable, ResourceChange};
use crate::error::CiderError;
use crate::exec::Executor;
use crate::paths::expand_home;

const SET_ICON_JXA: &str = "ObjC.import('AppKit');\
function run(argv) {\
  var image = argv.length > 1 ? $.NSImage.alloc.initWithContentsOfFile(argv[1]) : $();\
  return $.NSWorkspace.sharedWorkspace.setIconForFileOptions(image, argv[0], 0);\
}";

/// Where an icon comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconSource {
    /// A file on disk (plain path or `file://` URL, `~` expanded).
    Local(PathBuf),
    /// An `http(s)://` URL to download first.
    Remote(String),
}

impl IconSource {
    /// Classify a declared icon location.
    #[must_use]
    pub fn parse(icon: &str, home: &Path) -> Self {
        if icon.starts_with("http://") || icon.starts_with("https://") {
            Self::Remote(icon.to_string())
        } else {
            let path = icon.strip_prefix("file://").unwrap_or(icon);
            Self::Local(expand_home(path, home))
        }
    }
}

/// Locate `<app>.app`, searching `dirs` first and Spotlight second.
///
/// # Errors
///
/// Returns an error only if `mdfind` cannot be spawned.
pub fn path_for_app(executor: &dyn Executor, app: &str, dirs: &[PathBuf]) -> Result<Option<PathBuf>> {
    let bundle = format!("{app}.app");
    if let Some(found) = dirs.iter().map(|d| d.join(&bundle)).find(|p| p.is_dir()) {
        return Ok(Some(found));
    }

    let query = format!(
        "kMDItemContentType == 'com.apple.application-bundle' && kMDItemFSName == '{bundle}'"
    );
    let result = executor.run_unchecked("mdfind", &[query.as_str()])?;
    if !result.success {
        return Ok(None);
    }
    Ok(result
        .stdout
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(PathBuf::from))
}

/// Standard application folders for `home`.
#[must_use]
pub fn app_dirs(home: &Path) -> Vec<PathBuf> {
    vec![PathBuf::from("/Applications"), home.join("Applications")]
}

/// Last path segment of `url`, used to name the downloaded file.
fn icon_file_name(url: &str) -> &str {
    url.rsplit('/')
        .next()
        .filter(|n| !n.is_empty())
        .unwrap_or("icon.icns")
}

/// A fresh private directory for one download, removed on drop.
fn staging_dir() -> Result<tempfile::TempDir> {
    tempfile::Builder::new()
        .prefix("cider-icon-")
        .tempdir()
        .context("creating icon download directory")
}

/// Download `url` into `dir`.
fn download(url: &str, dir: &Path) -> Result<PathBuf> {
    let dest = dir.join(icon_file_name(url));

    let response = ureq::get(url)
        .call()
        .with_context(|| format!("downloading {url}"))?;
    let mut reader = response.into_body().into_reader();
    let mut file = std::fs::File::create_new(&dest)
        .with_context(|| format!("creating {}", dest.display()))?;
    std::io::copy(&mut reader, &mut file).with_context(|| format!("writing {}", dest.display()))?;
    Ok(dest)
}

/// An application's custom icon.
pub struct IconResource<'a> {
    /// Application name without `.app`.
    pub app: String,
    /// Declared icon location.
    pub icon: String,
    home: PathBuf,
    executor: &'a dyn Executor,
}

impl std::fmt::Debug for IconResource<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IconResource")
            .field("app", &self.app)
            .field("icon", &self.icon)
            .field("home", &self.home)
            .finish_non_exhaustive()
    }
}

impl<'a> IconResource<'a> {
    /// Create an icon resource.
    #[must_use]
    pub const fn new(app: String, icon: String, home: PathBuf, executor: &'a dyn Executor) -> Self {
        Self {
            app,
            icon,
            home,
            executor,
        }
    }

    fn app_path(&self) -> Result<PathBuf> {
        path_for_app(self.executor, &self.app, &app_dirs(&self.home))?
            .ok_or_else(|| CiderError::AppMissing(self.app.clone()).into())
    }

    fn run_jxa(&self, args: &[&str]) -> Result<()> {
        let mut argv = vec!["-l", "JavaScript", "-e", SET_ICON_JXA];
        argv.extend_from_slice(args);
        self.executor.run("osascript", &argv)?;
        Ok(())
    }
}

impl Applicable for IconResource<'_> {
    fn description(&self) -> String {
        format!("{} icon", self.app)
    }

    fn apply(&self) -> Result<ResourceChange> {
        let app_path = self.app_path()?;
        let (icon_path, staging) = match IconSource::parse(&self.icon, &self.home) {
            IconSource::Local(path) => (path, None),
            IconSource::Remote(url) => {
                tracing::info!("Downloading {} icon: {url}", self.app);
                let dir = staging_dir()?;
                (download(&url, dir.path())?, Some(dir))
            }
        };
        let app_arg = app_path.to_string_lossy();
        let icon_arg = icon_path.to_string_lossy();
        self.run_jxa(&[app_arg.as_ref(), icon_arg.as_ref()])?;
        drop(staging);
        Ok(ResourceChange::Applied)
    }

    fn remove(&self) -> Result<ResourceChange> {
        let app_path = self.app_path()?;
        let app_arg = app_path.to_string_lossy();
        self.run_jxa(&[app_arg.as_ref()])?;
        Ok(ResourceChange::Applied)
    }
}
