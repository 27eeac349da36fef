//! Cache of symlink targets materialized by the last reconciliation.
use anyhow::Result;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use super::store;

/// Sorted set of absolute target paths.
pub type TargetCache = BTreeSet<PathBuf>;

/// Read the cache, empty when absent.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be parsed.
pub fn read(path: &Path) -> Result<TargetCache> {
    store::read(path, TargetCache::new())
}

/// Overwrite the cache.
///
/// # Errors
///
/// Returns an error if the cache cannot be written.
pub fn write(path: &Path, targets: &TargetCache) -> Result<()> {
    store::write(path, targets)
}
