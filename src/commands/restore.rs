//! Command: `restore`.
use anyhow::Result;

use crate::platform;
use crate::tasks::{self, Context};

/// Check prerequisites, then run every restore step in order.
///
/// Nothing is changed when a prerequisite is missing.  Each step's outcome
/// is recorded through [`Log::record_task`](crate::logging::Log::record_task)
/// for the run summary.
///
/// # Errors
///
/// Returns the failing prerequisite or the first failing step's error.
pub fn restore(ctx: &Context, ignore_errors: bool) -> Result<()> {
    platform::assert_requirements(ctx)?;
    tasks::run_all(&tasks::restore_tasks(ignore_errors), ctx)
}
