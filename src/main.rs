//! `cider` command-line entry point.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::{CommandFactory as _, Parser as _};

use cider_cli::cli::{CaskCommand, Cli, Command};
use cider_cli::commands::{defaults, icons, links, packages, restore, scripts};
use cider_cli::config::Settings;
use cider_cli::error::exit_code_for;
use cider_cli::exec::SystemExecutor;
use cider_cli::logging::{self, Log, Logger};
use cider_cli::prompt::StdinPrompt;
use cider_cli::tasks::Context;

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            #[allow(clippy::print_stderr)]
            {
                eprintln!("Error: {e:#}");
            }
            ExitCode::from(u8::try_from(exit_code_for(&e)).unwrap_or(1))
        }
    }
}

fn run(args: Cli) -> Result<()> {
    let command = match args.command {
        Command::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "cider", &mut std::io::stdout());
            return Ok(());
        }
        command => command,
    };

    let global = args.global;
    let settings = Settings::resolve(global.config_dir, global.support_dir)?;
    logging::init_subscriber(global.verbose || global.debug, Some(&settings.log_file()));

    let env = settings.read_bootstrap()?.env;
    let log = Arc::new(Logger::new(Some(settings.log_file())));
    let ctx = Context::new(
        settings,
        Arc::clone(&log) as Arc<dyn Log>,
        Arc::new(SystemExecutor::new(env, global.debug)),
        Arc::new(StdinPrompt),
    )
    .with_flags(global.debug, global.verbose);

    dispatch(command, ctx, &log)
}

fn dispatch(command: Command, ctx: Context, log: &Logger) -> Result<()> {
    match command {
        Command::Install(opts) => packages::install(&ctx, &opts.names, opts.force),
        Command::Rm(opts) => packages::rm(&ctx, &opts.names),
        Command::List(opts) => packages::list(&ctx, opts.prefix.as_deref()),
        Command::Missing => packages::missing(&ctx),
        Command::Tap { name } => packages::tap(&ctx, name.as_deref()),
        Command::Untap { name } => packages::untap(&ctx, &name),
        Command::Relink { force } => links::relink(&ctx, force),
        Command::SetDefault(opts) => {
            let (domain, key, value) = opts.resolve()?;
            defaults::set_default(&ctx, &domain, &key, &value, opts.force)
        }
        Command::RemoveDefault(opts) => {
            let (domain, key) = opts.resolve()?;
            defaults::remove_default(&ctx, &domain, key.as_deref())
        }
        Command::ApplyDefaults => defaults::apply(&ctx),
        Command::SetIcon { app, icon } => icons::set_icon(&ctx, &app, &icon),
        Command::RemoveIcon { app } => icons::remove_icon(&ctx, &app),
        Command::ApplyIcons => icons::apply(&ctx),
        Command::RunScripts(opts) => {
            let (before, after) = opts.hooks();
            scripts::run_scripts(&ctx, before, after)
        }
        Command::Restore(opts) => {
            let result = restore::restore(&ctx, opts.ignore_errors);
            log.print_summary();
            result
        }
        Command::Addlink { name, paths } => links::addlink(&ctx, &name, &paths),
        Command::Unlink { name } => links::unlink(&ctx, &name),
        Command::Cask { command } => {
            let ctx = ctx.with_cask(true);
            match command {
                CaskCommand::Install(opts) => packages::install(&ctx, &opts.names, opts.force),
                CaskCommand::Rm(opts) => packages::rm(&ctx, &opts.names),
                CaskCommand::List(opts) => packages::list(&ctx, opts.prefix.as_deref()),
                CaskCommand::Missing => packages::missing(&ctx),
            }
        }
        Command::Completions { .. } => Ok(()),
    }
}
