//! Commands: `install`, `rm`, `list`, `missing`, `tap`, `untap`.
//!
//! Every command talks to Homebrew first and records the result in the
//! bootstrap document second, so a failed brew call leaves the document
//! untouched.  `ctx.cask` selects formulas or casks.
use anyhow::Result;
use std::collections::BTreeSet;

use crate::config::bootstrap::package_name;
use crate::error::CiderError;
use crate::tasks::Context;

/// Keyword accepted by `tap` in place of a repository name.
pub const MISSING_KEYWORD: &str = "missing";

/// Install `names` and record them in the bootstrap.
///
/// # Errors
///
/// Returns an error if brew fails (nothing is recorded) or the bootstrap
/// cannot be updated.
pub fn install(ctx: &Context, names: &[String], force: bool) -> Result<()> {
    ctx.brew().install(names, force)?;
    add_to_bootstrap(ctx, names)
}

/// Record `names` as declared packages of the active kind.
fn add_to_bootstrap(ctx: &Context, names: &[String]) -> Result<()> {
    let cask = ctx.cask;
    for name in names {
        let added = ctx.settings.modify_bootstrap(|mut bootstrap| {
            bootstrap.packages_mut(cask).insert(name.clone());
            bootstrap
        })?;
        if added {
            ctx.log.info(&format!("Added {name} to bootstrap"));
        } else {
            ctx.log
                .warn(&format!("{name} already bootstrapped; skipping install"));
        }
    }
    Ok(())
}

/// Uninstall `names` and drop them from the bootstrap.
///
/// Declared entries carrying install flags are matched by package name.
///
/// # Errors
///
/// Returns an error if brew fails or the bootstrap cannot be updated.
pub fn rm(ctx: &Context, names: &[String]) -> Result<()> {
    ctx.brew().remove(names, false)?;

    let cask = ctx.cask;
    for name in names {
        let removed = ctx.settings.modify_bootstrap(|mut bootstrap| {
            bootstrap
                .packages_mut(cask)
                .retain(|entry| package_name(entry) != name);
            bootstrap
        })?;
        if removed {
            ctx.log.info(&format!("Removed {name} from bootstrap"));
        } else {
            ctx.log.warn(&format!("{name} not found in bootstrap"));
        }
    }
    Ok(())
}

/// Declared entries of the active kind starting with `prefix`.
///
/// # Errors
///
/// Returns an error if the bootstrap cannot be read.
pub fn bootstrapped(ctx: &Context, prefix: Option<&str>) -> Result<Vec<String>> {
    let bootstrap = ctx.settings.read_bootstrap()?;
    Ok(bootstrap
        .packages(ctx.cask)
        .iter()
        .filter(|entry| prefix.is_none_or(|p| entry.starts_with(p)))
        .cloned()
        .collect())
}

/// Print declared entries, one per line.
///
/// # Errors
///
/// Returns [`CiderError::NotFound`] when nothing matches.
pub fn list(ctx: &Context, prefix: Option<&str>) -> Result<()> {
    let entries = bootstrapped(ctx, prefix)?;
    if entries.is_empty() {
        return Err(CiderError::NotFound("nothing to list".to_string()).into());
    }
    emit(&entries.join("\n"));
    Ok(())
}

/// Installed packages absent from the bootstrap, sorted.
///
/// Formulas only count when no declared formula depends on them, so
/// dependencies pulled in by declared packages are not reported.  Names
/// matching a `missing-ignore` pattern are skipped.
///
/// # Errors
///
/// Returns an error if brew cannot list packages.
pub fn find_missing(ctx: &Context) -> Result<Vec<String>> {
    let bootstrap = ctx.settings.read_bootstrap()?;
    let declared: BTreeSet<&str> = bootstrap
        .packages(ctx.cask)
        .iter()
        .map(|e| package_name(e))
        .collect();
    let ignore = bootstrap.missing_ignore_patterns();
    let brew = ctx.brew();

    let mut missing = Vec::new();
    for name in brew.list_installed()? {
        if declared.contains(name.as_str()) || ignore.iter().any(|p| p.matches(&name)) {
            continue;
        }
        if !ctx.cask {
            let dependents = brew.reverse_dependents(&name)?;
            if dependents.iter().any(|d| declared.contains(d.as_str())) {
                continue;
            }
        }
        missing.push(name);
    }
    Ok(missing)
}

/// Report installed-but-undeclared packages and offer to record them.
///
/// # Errors
///
/// Returns an error if brew cannot list packages or the bootstrap cannot
/// be updated.
pub fn missing(ctx: &Context) -> Result<()> {
    let names = find_missing(ctx)?;
    let heading = format!(
        "{} missing {}{} (tip: try `brew uses --installed` to see what's using it)",
        names.len(),
        ctx.brew().noun(),
        plural(names.len())
    );
    offer(ctx, &names, &heading, add_to_bootstrap)
}

/// Command output proper, as opposed to log messages.
#[allow(clippy::print_stdout)]
fn emit(text: &str) {
    println!("{text}");
}

const fn plural(count: usize) -> &'static str {
    if count == 1 { "" } else { "s" }
}

/// Print `names` under a warning and ask before handing them to `add`.
fn offer(
    ctx: &Context,
    names: &[String],
    heading: &str,
    add: impl FnOnce(&Context, &[String]) -> Result<()>,
) -> Result<()> {
    if names.is_empty() {
        emit("Everything up to date.");
        return Ok(());
    }

    ctx.log.warn(heading);
    emit(&format!("{}\n", names.join("\n")));

    if ctx.prompt.confirm("Add to bootstrap? [y/N] ") {
        add(ctx, names)?;
    }
    Ok(())
}

/// `tap` with no name lists declared taps, `tap missing` reports system
/// taps absent from the bootstrap, and `tap NAME` taps and records `NAME`.
///
/// # Errors
///
/// Returns an error if brew fails or the bootstrap cannot be updated.
pub fn tap(ctx: &Context, name: Option<&str>) -> Result<()> {
    match name {
        None => {
            let taps = ctx.settings.read_bootstrap()?.taps;
            if !taps.is_empty() {
                emit(&taps.into_iter().collect::<Vec<_>>().join("\n"));
            }
            Ok(())
        }
        Some(MISSING_KEYWORD) => {
            let names = missing_taps(ctx)?;
            let heading = format!("{} missing tap{}", names.len(), plural(names.len()));
            offer(ctx, &names, &heading, add_taps)
        }
        Some(name) => {
            ctx.brew().tap(name)?;
            add_taps(ctx, &[name.to_string()])
        }
    }
}

/// Taps registered with brew but not declared.
///
/// # Errors
///
/// Returns an error if `brew tap` fails.
pub fn missing_taps(ctx: &Context) -> Result<Vec<String>> {
    let declared = ctx.settings.read_bootstrap()?.taps;
    Ok(ctx
        .brew()
        .taps()?
        .into_iter()
        .filter(|t| !declared.contains(t))
        .collect())
}

fn add_taps(ctx: &Context, names: &[String]) -> Result<()> {
    for name in names {
        let added = ctx.settings.modify_bootstrap(|mut bootstrap| {
            bootstrap.taps.insert(name.clone());
            bootstrap
        })?;
        if added {
            ctx.log.info(&format!("Added {name} tap to bootstrap"));
        } else {
            ctx.log.warn(&format!("{name} tap already bootstrapped"));
        }
    }
    Ok(())
}

/// Untap `name` and drop it from the bootstrap.
///
/// # Errors
///
/// Returns an error if brew fails or the bootstrap cannot be updated.
pub fn untap(ctx: &Context, name: &str) -> Result<()> {
    ctx.brew().untap(name)?;
    let removed = ctx.settings.modify_bootstrap(|mut bootstrap| {
        bootstrap.taps.remove(name);
        bootstrap
    })?;
    if removed {
        ctx.log.info(&format!("Removed {name} tap from bootstrap"));
    } else {
        ctx.log.warn(&format!("{name} tap not found in bootstrap"));
    }
    Ok(())
}
