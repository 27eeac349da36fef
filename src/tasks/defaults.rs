//! Restore step writing recorded `defaults` values.
use anyhow::Result;

use super::{Context, Task, TaskResult};
use crate::resources::Applicable as _;
use crate::resources::defaults::DefaultsResource;

/// Write every recorded preference. Returns how many keys were written.
///
/// # Errors
///
/// Returns an error if the preferences document cannot be read or a
/// `defaults write` fails.
pub fn apply_defaults(ctx: &Context) -> Result<usize> {
    let defaults = ctx.settings.read_defaults()?;
    let mut count = 0;
    for (domain, keys) in defaults {
        for (key, value) in keys {
            DefaultsResource::new(domain.clone(), key, value, ctx.executor.as_ref()).apply()?;
            count += 1;
        }
    }
    ctx.log.info("Applied defaults");
    Ok(count)
}

/// Apply the preferences document.
#[derive(Debug)]
pub struct ApplyDefaults;

impl Task for ApplyDefaults {
    fn name(&self) -> &str {
        "Apply defaults"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        ctx.settings.read_defaults().map_or(true, |d| !d.is_empty())
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        apply_defaults(ctx)?;
        Ok(TaskResult::Ok)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::{DefaultValue, store};
    use crate::tasks::test_helpers::Sandbox;

    #[test]
    fn writes_every_recorded_key() {
        let sb = Sandbox::new();
        let ctx = sb.context();
        let mut doc = crate::config::Defaults::new();
        doc.entry("com.apple.dock".to_string())
            .or_default()
            .insert("autohide".to_string(), DefaultValue::Bool(true));
        doc.entry("com.apple.dock".to_string())
            .or_default()
            .insert("tilesize".to_string(), DefaultValue::Int(36));
        store::write(&ctx.settings.defaults_file(), &doc).unwrap();

        assert_eq!(apply_defaults(&ctx).unwrap(), 2);
        assert_eq!(
            sb.exec.calls(),
            [
                "defaults write com.apple.dock autohide -bool true",
                "defaults write com.apple.dock tilesize -int 36",
            ]
        );
    }

    #[test]
    fn nothing_recorded_means_nothing_to_run() {
        let sb = Sandbox::new();
        assert!(!ApplyDefaults.should_run(&sb.context()));
    }
}
