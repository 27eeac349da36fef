//! Read / modify / write access to persisted documents.
//!
//! The encoding is picked from the file extension: `.json` documents use
//! [`serde_json`], everything else [`toml`].  Both serializers are driven
//! from `BTreeMap`/`BTreeSet`-backed types so rewriting unchanged data
//! yields byte-identical files.
//!
//! There is no cross-process locking: two invocations modifying the same
//! document concurrently can lose an update.
use anyhow::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::CiderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Toml,
}

impl Format {
    fn of(path: &Path) -> Self {
        if path.extension().is_some_and(|ext| ext == "json") {
            Self::Json
        } else {
            Self::Toml
        }
    }
}

/// Read the document at `path`, returning `fallback` if it does not exist.
///
/// An empty file reads as `fallback` too.
///
/// # Errors
///
/// Returns [`CiderError::ConfigRead`] for any other I/O failure and for
/// content that does not parse.
pub fn read<T: DeserializeOwned>(path: &Path, fallback: T) -> Result<T> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(fallback),
        Err(e) => return Err(read_error(path, e)),
    };

    if content.trim().is_empty() {
        return Ok(fallback);
    }

    match Format::of(path) {
        Format::Json => serde_json::from_str(&content).map_err(|e| read_error(path, e)),
        Format::Toml => toml::from_str(&content).map_err(|e| read_error(path, e)),
    }
}

/// Overwrite the document at `path`, creating parent directories.
///
/// # Errors
///
/// Returns [`CiderError::ConfigWrite`] if serialization or the write fails.
pub fn write<T: Serialize>(path: &Path, document: &T) -> Result<()> {
    let mut content = match Format::of(path) {
        Format::Json => serde_json::to_string_pretty(document).map_err(|e| write_error(path, e))?,
        Format::Toml => toml::to_string_pretty(document).map_err(|e| write_error(path, e))?,
    };
    if !content.ends_with('\n') {
        content.push('\n');
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| write_error(path, e))?;
    }
    std::fs::write(path, content).map_err(|e| write_error(path, e))?;
    tracing::debug!("wrote {}", path.display());
    Ok(())
}

/// Read, transform, and write back only if the value changed.
///
/// `transform` receives an owned copy; the original is kept for the
/// comparison.  Returns whether a write happened.
///
/// # Errors
///
/// Returns an error if the document cannot be read or written.
pub fn modify<T, F>(path: &Path, transform: F) -> Result<bool>
where
    T: Serialize + DeserializeOwned + Clone + PartialEq + Default,
    F: FnOnce(T) -> T,
{
    let original: T = read(path, T::default())?;
    let updated = transform(original.clone());
    if updated == original {
        return Ok(false);
    }
    write(path, &updated)?;
    Ok(true)
}

fn read_error(path: &Path, e: impl std::error::Error + Send + Sync + 'static) -> anyhow::Error {
    CiderError::ConfigRead {
        path: path.to_path_buf(),
        source: Box::new(e),
    }
    .into()
}

fn write_error(path: &Path, e: impl std::error::Error + Send + Sync + 'static) -> anyhow::Error {
    CiderError::ConfigWrite {
        path: path.to_path_buf(),
        source: Box::new(e),
    }
    .into()
}
