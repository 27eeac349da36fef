//! Domain-specific error types for cider.
//!
//! Internal modules return [`anyhow::Result`] and wrap a [`CiderError`] at
//! the point where a failure has a user-facing meaning.  The CLI boundary in
//! `main` walks the error chain, prints a single line, and exits with the
//! code declared by the first [`CiderError`] it finds.
//!
//! # Error kinds
//!
//! ```text
//! CiderError
//! ├── ConfigRead / ConfigWrite  : persisted documents
//! ├── InvalidSymlinkRule        : glob source mapped to a fixed file target
//! ├── SymlinkSourceMissing      : declared source absent under symlinks/
//! ├── Conflict / Symlink        : occupied targets, refuse-to-clobber
//! ├── SourceMissing / NotFound  : addlink / unlink / rm inputs
//! ├── CommandFailed             : external process exited non-zero
//! └── UnsupportedOs / XcodeMissing / BrewMissing / AppMissing
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Errors with a user-facing meaning and a declared process exit code.
#[derive(Error, Debug)]
pub enum CiderError {
    /// A persisted document exists but cannot be read or parsed.
    #[error("error reading {}: {source}", path.display())]
    ConfigRead {
        /// Path of the document.
        path: PathBuf,
        /// Underlying I/O or parse error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A persisted document cannot be serialized or written.
    #[error("error writing {}: {source}", path.display())]
    ConfigWrite {
        /// Path of the document.
        path: PathBuf,
        /// Underlying I/O or serialization error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A symlink rule combines glob metacharacters with a file target.
    #[error("invalid symlink: {pattern} => {target} (did you mean to add a trailing '/'?)")]
    InvalidSymlinkRule {
        /// Source glob, relative to the symlinks directory.
        pattern: String,
        /// Target template as declared.
        target: String,
    },

    /// The source of a link pair does not exist.
    #[error("symlink source \"{0}\" does not exist")]
    SymlinkSourceMissing(String),

    /// A stow location is already occupied by a different file.
    #[error("link already exists at {0}")]
    Conflict(String),

    /// A path given to `addlink` does not exist.
    #[error("can't link {0}: no such file or directory")]
    SourceMissing(String),

    /// A symlink target is occupied and would be clobbered.
    #[error("{0}")]
    Symlink(String),

    /// The named item is not declared.
    #[error("{0}")]
    NotFound(String),

    /// An external command exited non-zero.
    #[error("`{}` failed with code {}", argv.join(" "), code.map_or_else(|| "?".to_string(), |c| c.to_string()))]
    CommandFailed {
        /// Full argument vector, program first.
        argv: Vec<String>,
        /// Exit code, or `None` when terminated by a signal.
        code: Option<i32>,
    },

    /// The running macOS release is too old.
    #[error("unsupported OS version {version}; please upgrade to 10.9 or later and try again")]
    UnsupportedOs {
        /// Product version as reported by the OS.
        version: String,
    },

    /// The Command Line Tools are not installed.
    #[error("Command Line Tools are not installed (see {url})")]
    XcodeMissing {
        /// Where to get them.
        url: String,
    },

    /// Homebrew is not installed.
    #[error("Homebrew is not installed (see {url})")]
    BrewMissing {
        /// Installation instructions.
        url: String,
    },

    /// An application could not be located.
    #[error("application not found: '{0}'")]
    AppMissing(String),

    /// Command-line arguments were inconsistent.
    #[error("{0}")]
    InvalidArgument(String),
}

impl CiderError {
    /// Process exit code for this error.
    ///
    /// External command failures forward the child's non-zero exit code;
    /// everything else exits with `1`.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::CommandFailed {
                code: Some(code), ..
            } if *code != 0 => *code,
            _ => 1,
        }
    }
}

/// Return the exit code for an arbitrary error chain.
///
/// Uses the first [`CiderError`] found in the chain, defaulting to `1`.
#[must_use]
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<CiderError>())
        .map_or(1, CiderError::exit_code)
}
