//! Symlink resource.
use anyhow::{Context as _, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{Applicable, Resource, ResourceChange, ResourceState};
use crate::error::CiderError;
use crate::paths::real_path;

/// A symlink at `target` pointing to `source`.
///
/// Applying never replaces anything: an occupied target is reported as
/// [`ResourceChange::Skipped`] and left for the caller's conflict policy.
#[derive(Debug, Clone)]
pub struct SymlinkResource {
    /// The source file/directory (what the symlink points to).
    pub source: PathBuf,
    /// The target path (where the symlink will be created).
    pub target: PathBuf,
}

impl SymlinkResource {
    /// Create a new symlink resource.
    #[must_use]
    pub const fn new(source: PathBuf, target: PathBuf) -> Self {
        Self { source, target }
    }

    /// Create the link if nothing occupies `target`.
    ///
    /// Returns `false` when the target already exists; creation and the
    /// existence check are a single system call.
    fn create(&self) -> Result<bool> {
        match std::os::unix::fs::symlink(&self.source, &self.target) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(e).with_context(|| {
                format!(
                    "creating symlink {} -> {}",
                    self.target.display(),
                    self.source.display()
                )
            }),
        }
    }
}

impl Applicable for SymlinkResource {
    fn description(&self) -> String {
        format!("{} -> {}", self.target.display(), self.source.display())
    }

    fn apply(&self) -> Result<ResourceChange> {
        if !self.source.exists() {
            return Err(CiderError::SymlinkSourceMissing(self.source.display().to_string()).into());
        }

        if self.create()? {
            return Ok(ResourceChange::Applied);
        }

        match self.current_state()? {
            ResourceState::Correct => Ok(ResourceChange::AlreadyCorrect),
            ResourceState::Incorrect { current } => Ok(ResourceChange::Skipped {
                reason: format!("linked to {current}"),
            }),
            ResourceState::Invalid { reason } => Ok(ResourceChange::Skipped { reason }),
            // Vanished between the create attempt and the check.
            ResourceState::Missing => Ok(ResourceChange::Skipped {
                reason: "target changed while linking".to_string(),
            }),
        }
    }

    fn remove(&self) -> Result<ResourceChange> {
        if !is_symlink(&self.target) {
            return Ok(ResourceChange::Skipped {
                reason: "not a symlink".to_string(),
            });
        }
        std::fs::remove_file(&self.target)
            .with_context(|| format!("removing symlink: {}", self.target.display()))?;
        Ok(ResourceChange::Applied)
    }
}

impl Resource for SymlinkResource {
    fn current_state(&self) -> Result<ResourceState> {
        let Ok(meta) = self.target.symlink_metadata() else {
            return Ok(ResourceState::Missing);
        };

        if !meta.is_symlink() {
            return Ok(ResourceState::Invalid {
                reason: "target already exists".to_string(),
            });
        }

        if same_file(&self.target, &self.source) {
            Ok(ResourceState::Correct)
        } else {
            Ok(ResourceState::Incorrect {
                current: real_path(&self.target).display().to_string(),
            })
        }
    }
}

/// True if `path` is itself a symlink (dangling or not).
#[must_use]
pub fn is_symlink(path: &Path) -> bool {
    path.symlink_metadata().is_ok_and(|m| m.is_symlink())
}

/// True if both paths resolve to the same location.
#[must_use]
pub fn same_file(a: &Path, b: &Path) -> bool {
    real_path(a) == real_path(b)
}
