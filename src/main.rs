//! Komodo settings launcher
//!
//! Resolves, generates and exports the Komodo bot's layered settings.

use anyhow::Result;
use clap::Parser;
use komodo_settings::cli::check::{CheckOutcome, failure_report, run_check};
use komodo_settings::cli::flatten::run_flatten;
use komodo_settings::cli::init::run_init;
use komodo_settings::cli::vars::run_vars;
use komodo_settings::cli::{Cli, Command};
use komodo_settings::config::{Schema, SettingsLoader};
use komodo_settings::logging::{self, LogTarget};
use std::process::ExitCode;
use tracing::{debug, warn};

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging based on --log option
    let target = cli.log_target();
    logging::init(&target, cli.verbose)?;
    if target != LogTarget::parse(&cli.log) {
        warn!("Logging to stderr because stdout carries export lines");
    }

    let selector = cli.selector();
    debug!(%selector, dir = %cli.dir.display(), "Starting");

    match cli.command {
        Command::Flatten(ref args) => {
            run_flatten(args)?;
        }
        Command::Check(ref args) => {
            let loader = SettingsLoader::new(Schema::komodo()?).with_base_dir(&cli.dir);
            match run_check(&loader, selector, args)? {
                CheckOutcome::Ready(report) => print!("{}", report),
                CheckOutcome::Failed(err) => {
                    eprintln!("{}", failure_report(&err));
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        Command::Init => {
            let loader = SettingsLoader::new(Schema::komodo()?).with_base_dir(&cli.dir);
            run_init(&loader, selector)?;
        }
        Command::Vars => {
            run_vars(&Schema::komodo()?, selector);
        }
    }

    Ok(ExitCode::SUCCESS)
}
