//! Commands: `set-icon`, `remove-icon`, `apply-icons`.
use anyhow::Result;

use crate::error::CiderError;
use crate::resources::icon::{self, IconResource};
use crate::resources::Applicable as _;
use crate::tasks::Context;

/// Record `icon` for `app`, then set it.
///
/// # Errors
///
/// Returns an error if the bootstrap cannot be updated, the application
/// cannot be found, or the icon cannot be fetched or set.
pub fn set_icon(ctx: &Context, app: &str, icon: &str) -> Result<()> {
    ctx.settings.modify_bootstrap(|mut bootstrap| {
        bootstrap.icons.insert(app.to_string(), icon.to_string());
        bootstrap
    })?;
    IconResource::new(
        app.to_string(),
        icon.to_string(),
        ctx.home().to_path_buf(),
        ctx.executor.as_ref(),
    )
    .apply()?;
    Ok(())
}

/// Forget `app`'s icon and restore the default one.
///
/// # Errors
///
/// Returns [`CiderError::AppMissing`] before touching the bootstrap when
/// the application cannot be found.
pub fn remove_icon(ctx: &Context, app: &str) -> Result<()> {
    let dirs = icon::app_dirs(ctx.home());
    if icon::path_for_app(ctx.executor.as_ref(), app, &dirs)?.is_none() {
        return Err(CiderError::AppMissing(app.to_string()).into());
    }

    ctx.settings.modify_bootstrap(|mut bootstrap| {
        bootstrap.icons.remove(app);
        bootstrap
    })?;
    IconResource::new(
        app.to_string(),
        String::new(),
        ctx.home().to_path_buf(),
        ctx.executor.as_ref(),
    )
    .remove()?;
    Ok(())
}

/// Set every recorded icon.
///
/// # Errors
///
/// Returns the first failure.
pub fn apply(ctx: &Context) -> Result<()> {
    crate::tasks::icons::apply_icons(ctx)
}
