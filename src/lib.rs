//! Declarative macOS bootstrapping.
//!
//! A single bootstrap document lists the Homebrew formulas, casks and taps
//! a machine should have, the dotfiles to symlink out of a managed
//! directory, application icons and hook scripts.  A separate preferences
//! document records `defaults` values.  Every mutating command changes the
//! system first and records the change second, so the documents only ever
//! describe state that was actually reached.
//!
//! The public API is organised into layers:
//!
//! - **[`config`]**: directory layout and the persisted documents
//! - **[`resources`]**: idempotent primitives (symlinks, packages, preferences, icons)
//! - **[`links`]**: symlink reconciliation and adopt/release of stowed files
//! - **[`tasks`]**: named restore steps and the shared [`tasks::Context`]
//! - **[`commands`]**: one function per subcommand
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod links;
pub mod logging;
pub mod paths;
pub mod platform;
pub mod prompt;
pub mod resources;
pub mod tasks;
