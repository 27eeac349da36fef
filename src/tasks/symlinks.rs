//! Restore step reconciling declared symlinks.
use anyhow::Result;

use super::{Context, Task, TaskResult};
use crate::links;

/// Reconcile declared symlinks and prune undeclared ones.
#[derive(Debug)]
pub struct Relink;

impl Task for Relink {
    fn name(&self) -> &str {
        "Relink symlinks"
    }

    fn should_run(&self, _ctx: &Context) -> bool {
        // Always runs: with no rules it still prunes earlier links.
        true
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let report = links::relink(ctx, false)?;
        report.check()?;
        ctx.log.info(&format!(
            "{} linked, {} pruned",
            report.linked.len(),
            report.pruned.len()
        ));
        Ok(TaskResult::Ok)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::Bootstrap;
    use crate::tasks::test_helpers::Sandbox;

    #[test]
    fn links_declared_rules() {
        let sb = Sandbox::new();
        sb.stow("zsh/.zshrc", "");
        sb.write_bootstrap(&Bootstrap {
            symlinks: [("zsh/.*".to_string(), "~".to_string())].into(),
            ..Bootstrap::default()
        });
        let ctx = sb.context();
        assert_eq!(Relink.run(&ctx).unwrap(), TaskResult::Ok);
        assert!(sb.home().join(".zshrc").symlink_metadata().is_ok());
    }

    #[test]
    fn conflicts_fail_the_step() {
        let sb = Sandbox::new();
        sb.stow("zsh/.zshrc", "");
        std::fs::write(sb.home().join(".zshrc"), "mine").unwrap();
        sb.write_bootstrap(&Bootstrap {
            symlinks: [("zsh/.*".to_string(), "~".to_string())].into(),
            ..Bootstrap::default()
        });
        let ctx = sb.context();
        assert!(Relink.run(&ctx).is_err());
    }
}
