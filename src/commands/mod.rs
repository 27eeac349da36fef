//! One function per subcommand.
//!
//! Commands take the shared [`Context`](crate::tasks::Context) and return
//! `anyhow::Result`; `main` owns printing the error and choosing the exit
//! code.
pub mod defaults;
pub mod icons;
pub mod links;
pub mod packages;
pub mod restore;
pub mod scripts;
