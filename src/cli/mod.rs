//! CLI command definitions for komodo
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.
//! Running without a subcommand is a usage error.

pub mod check;
pub mod flatten;
pub mod init;
pub mod vars;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Selector;
use crate::logging::LogTarget;
use check::CheckArgs;
use flatten::FlattenArgs;

/// Variable selecting the deployment environment.
pub const SELECTOR_VAR: &str = "KOMODO_ENV";

/// Komodo settings tools
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(subcommand_required = true, arg_required_else_help = true)]
pub struct Cli {
    /// Deployment environment: dev or prod (default: dev for debug builds)
    #[arg(short, long, global = true, env = SELECTOR_VAR, value_enum, ignore_case = true)]
    pub env: Option<Selector>,

    /// Directory holding the settings documents
    #[arg(long, global = true, value_name = "DIR", default_value = ".")]
    pub dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Selected environment, falling back to the build default.
    pub fn selector(&self) -> Selector {
        self.env.unwrap_or_else(Selector::for_build)
    }

    /// Log target from `--log`, moved off stdout when stdout carries exports.
    pub fn log_target(&self) -> LogTarget {
        match LogTarget::parse(&self.log) {
            LogTarget::Stdout if self.command.writes_exports_to_stdout() => LogTarget::Stderr,
            target => target,
        }
    }
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print a settings document as shell export statements
    Flatten(FlattenArgs),

    /// Resolve and validate settings, reporting every problem
    Check(CheckArgs),

    /// Generate the settings document from defaults if it does not exist
    Init,

    /// List every recognised environment variable
    Vars,
}

impl Command {
    /// Whether the command prints export lines on stdout.
    pub fn writes_exports_to_stdout(&self) -> bool {
        match self {
            Command::Flatten(args) => args.output.is_none(),
            Command::Check(args) => args.print,
            Command::Init | Command::Vars => false,
        }
    }
}
