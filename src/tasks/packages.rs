//! Tap registration and package installation for a restore.
use anyhow::Result;
use std::collections::BTreeSet;

use super::{Context, Task, TaskResult};
use crate::config::bootstrap::package_name;
use crate::resources::package::PackageResource;
use crate::resources::{Applicable as _, ResourceChange};

/// Tap every declared repository.
#[derive(Debug)]
pub struct RegisterTaps;

impl Task for RegisterTaps {
    fn name(&self) -> &str {
        "Register taps"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        ctx.settings
            .read_bootstrap()
            .map_or(true, |b| !b.taps.is_empty())
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let brew = ctx.brew();
        for tap in &ctx.settings.read_bootstrap()?.taps {
            brew.tap(tap)?;
        }
        Ok(TaskResult::Ok)
    }
}

/// Install declared formulas and casks.
#[derive(Debug)]
pub struct InstallPackages {
    /// Downgrade per-package failures to warnings instead of asking.
    pub ignore_errors: bool,
}

impl Task for InstallPackages {
    fn name(&self) -> &str {
        "Install packages"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        ctx.settings
            .read_bootstrap()
            .map_or(true, |b| !b.formulas.is_empty() || !b.casks.is_empty())
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        install_packages(ctx, self.ignore_errors)?;
        Ok(TaskResult::Ok)
    }
}

/// Install everything the bootstrap declares.
///
/// Each formula's cask dependencies are installed just before it; casks not
/// needed by any formula follow at the end.  Outdated formulas are upgraded
/// instead of installed.
///
/// # Errors
///
/// Returns an error if brew cannot list packages, or a package fails to
/// install and the user declines to continue.
pub fn install_packages(ctx: &Context, ignore_errors: bool) -> Result<()> {
    let bootstrap = ctx.settings.read_bootstrap()?;
    let formulas = ctx.brew().kind(false);
    let casks = ctx.brew().kind(true);

    let installed_formulas = formulas.list_installed()?;
    let installed_casks = casks.list_installed()?;
    let outdated = formulas.list_outdated()?;
    let never_outdated = BTreeSet::new();

    let mut remaining_casks = bootstrap.casks.clone();
    for formula in &bootstrap.formulas {
        let name = package_name(formula);
        for cask in bootstrap.cask_dependencies(name) {
            ctx.log
                .info(&format!("Installing {cask} dependency for {name}"));
            let entry = take_entry(&mut remaining_casks, cask);
            safe_install(
                ctx,
                &PackageResource::new(entry, casks, &installed_casks, &never_outdated),
                ignore_errors,
            )?;
        }
        safe_install(
            ctx,
            &PackageResource::new(formula.clone(), formulas, &installed_formulas, &outdated),
            ignore_errors,
        )?;
    }

    for cask in remaining_casks {
        safe_install(
            ctx,
            &PackageResource::new(cask, casks, &installed_casks, &never_outdated),
            ignore_errors,
        )?;
    }
    Ok(())
}

/// Remove and return the declared entry for `name`, or `name` itself when
/// the dependency is not declared as a cask.
fn take_entry(entries: &mut BTreeSet<String>, name: &str) -> String {
    let found = entries.iter().find(|e| package_name(e) == name).cloned();
    match found {
        Some(entry) => {
            entries.remove(&entry);
            entry
        }
        None => name.to_string(),
    }
}

fn safe_install(ctx: &Context, package: &PackageResource<'_>, ignore_errors: bool) -> Result<()> {
    let name = package.name();
    match package.apply() {
        Ok(ResourceChange::Applied) => {
            ctx.log.debug(&format!("installed {}", package.description()));
            Ok(())
        }
        Ok(_) => {
            ctx.log.debug(&format!("{name} already installed"));
            Ok(())
        }
        Err(_) if ignore_errors => {
            ctx.log.warn(&format!("Failed to install {name}"));
            Ok(())
        }
        Err(e) => {
            if ctx
                .prompt
                .confirm(&format!("Failed to install {name}. Continue? [y/N] "))
            {
                Ok(())
            } else {
                Err(e)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::config::Bootstrap;
    use crate::logging::test_helpers::Level;
    use crate::prompt::MockPrompt;
    use crate::resources::test_helpers::MockExecutor;
    use crate::tasks::test_helpers::Sandbox;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    /// Listing responses: installed formulas, installed casks, outdated.
    fn listings(formulas: &str, casks: &str, outdated: &str) -> Vec<(bool, String)> {
        vec![
            (true, formulas.to_string()),
            (true, casks.to_string()),
            (true, outdated.to_string()),
        ]
    }

    fn sandbox(responses: Vec<(bool, String)>, bootstrap: &Bootstrap) -> Sandbox {
        let sb = Sandbox::with_executor(MockExecutor::with_responses(
            responses.iter().map(|(ok, s)| (*ok, s.as_str())).collect(),
        ));
        sb.write_bootstrap(bootstrap);
        sb
    }

    #[test]
    fn cask_dependencies_install_before_their_formula() {
        let bootstrap = Bootstrap {
            formulas: set(&["mpv"]),
            casks: set(&["iterm2", "xquartz"]),
            dependencies: [("mpv".to_string(), vec!["casks/xquartz".to_string()])].into(),
            ..Bootstrap::default()
        };
        let sb = sandbox(listings("", "", ""), &bootstrap);
        let ctx = sb.context();

        install_packages(&ctx, false).unwrap();

        assert_eq!(
            sb.exec.calls()[3..],
            [
                "brew install --cask xquartz",
                "brew install mpv",
                "brew install --cask iterm2",
            ]
        );
        assert_eq!(
            sb.log.at(Level::Info),
            ["Installing xquartz dependency for mpv"]
        );
    }

    #[test]
    fn installed_packages_are_skipped_and_outdated_upgraded() {
        let bootstrap = Bootstrap {
            formulas: set(&["git", "wget --with-iri"]),
            casks: set(&["iterm2"]),
            ..Bootstrap::default()
        };
        let sb = sandbox(listings("git\nwget\n", "iterm2\n", "wget\n"), &bootstrap);
        let ctx = sb.context();

        install_packages(&ctx, false).unwrap();
        assert_eq!(sb.exec.calls()[3..], ["brew upgrade wget --with-iri"]);
    }

    #[test]
    fn ignore_errors_warns_and_continues() {
        let bootstrap = Bootstrap {
            formulas: set(&["broken", "fine"]),
            ..Bootstrap::default()
        };
        let mut responses = listings("", "", "");
        responses.push((false, String::new()));
        let sb = sandbox(responses, &bootstrap);
        let ctx = sb.context();

        install_packages(&ctx, true).unwrap();
        assert_eq!(sb.log.at(Level::Warn), ["Failed to install broken"]);
        assert_eq!(sb.exec.calls().last().unwrap(), "brew install fine");
    }

    #[test]
    fn failure_asks_and_continues_on_yes() {
        let bootstrap = Bootstrap {
            formulas: set(&["broken", "fine"]),
            ..Bootstrap::default()
        };
        let mut responses = listings("", "", "");
        responses.push((false, String::new()));
        let sb = sandbox(responses, &bootstrap);
        let mut prompt = MockPrompt::new();
        prompt
            .expect_confirm()
            .withf(|msg| msg.starts_with("Failed to install broken. Continue? [y/N]"))
            .times(1)
            .return_const(true);
        let ctx = sb.context_with_prompt(prompt);

        install_packages(&ctx, false).unwrap();
        assert_eq!(sb.exec.calls().last().unwrap(), "brew install fine");
    }

    #[test]
    fn failure_aborts_on_no() {
        let bootstrap = Bootstrap {
            formulas: set(&["broken", "fine"]),
            ..Bootstrap::default()
        };
        let mut responses = listings("", "", "");
        responses.push((false, String::new()));
        let sb = sandbox(responses, &bootstrap);
        let mut prompt = MockPrompt::new();
        prompt.expect_confirm().times(1).return_const(false);
        let ctx = sb.context_with_prompt(prompt);

        assert!(install_packages(&ctx, false).is_err());
        assert_eq!(sb.exec.calls().last().unwrap(), "brew install broken");
    }

    #[test]
    fn taps_are_registered() {
        let sb = Sandbox::new();
        sb.write_bootstrap(&Bootstrap {
            taps: set(&["homebrew/cask-fonts"]),
            ..Bootstrap::default()
        });
        let ctx = sb.context();
        assert!(RegisterTaps.should_run(&ctx));
        RegisterTaps.run(&ctx).unwrap();
        assert_eq!(sb.exec.calls(), ["brew tap homebrew/cask-fonts"]);
    }

    #[test]
    fn undeclared_dependency_is_installed_by_name() {
        let mut entries = set(&["iterm2 --no-quarantine"]);
        assert_eq!(take_entry(&mut entries, "iterm2"), "iterm2 --no-quarantine");
        assert!(entries.is_empty());
        assert_eq!(take_entry(&mut entries, "xquartz"), "xquartz");
    }
}
