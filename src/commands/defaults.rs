//! Commands: `set-default`, `remove-default`, `apply-defaults`.
use anyhow::Result;

use crate::config::DefaultValue;
use crate::resources::defaults::{self, DefaultsResource};
use crate::resources::Applicable as _;
use crate::tasks::Context;

/// Write a preference, then record it.
///
/// `raw` is interpreted by [`DefaultValue::parse`].
///
/// # Errors
///
/// Returns an error if `defaults write` fails (nothing is recorded) or the
/// preferences document cannot be updated.
pub fn set_default(ctx: &Context, domain: &str, key: &str, raw: &str, force: bool) -> Result<()> {
    let value = DefaultValue::parse(raw);
    DefaultsResource::new(
        domain.to_string(),
        key.to_string(),
        value.clone(),
        ctx.executor.as_ref(),
    )
    .with_force(force)
    .apply()?;

    let changed = ctx.settings.modify_defaults(|mut doc| {
        doc.entry(domain.to_string())
            .or_default()
            .insert(key.to_string(), value);
        doc
    })?;
    if changed {
        ctx.log.info("Updated defaults");
    }
    Ok(())
}

/// Delete a key (or a whole domain when `key` is `None`), then forget it.
///
/// # Errors
///
/// Returns an error if `defaults delete` fails or the preferences
/// document cannot be updated.
pub fn remove_default(ctx: &Context, domain: &str, key: Option<&str>) -> Result<()> {
    defaults::delete(ctx.executor.as_ref(), domain, key)?;

    let changed = ctx.settings.modify_defaults(|mut doc| {
        match key {
            Some(key) => {
                if let Some(keys) = doc.get_mut(domain) {
                    keys.remove(key);
                    if keys.is_empty() {
                        doc.remove(domain);
                    }
                }
            }
            None => {
                doc.remove(domain);
            }
        }
        doc
    })?;
    if changed {
        ctx.log.info("Updated defaults");
    }
    Ok(())
}

/// Write every recorded preference.
///
/// # Errors
///
/// Returns the first `defaults write` failure.
pub fn apply(ctx: &Context) -> Result<()> {
    let count = crate::tasks::defaults::apply_defaults(ctx)?;
    ctx.log.debug(&format!("{count} preference keys written"));
    Ok(())
}
