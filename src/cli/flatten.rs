//! Flatten subcommand for komodo CLI
//!
//! Projects a nested settings document (TOML, YAML or JSON) into
//! `export NAME=value` lines that a shell can source.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use crate::config::{project, read_document, render_exports};

/// Arguments for the flatten subcommand
#[derive(Args, Debug)]
pub struct FlattenArgs {
    /// Document to flatten (.toml, .yaml, .yml or .json)
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// Output file path (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Run the flatten command.
pub fn run_flatten(args: &FlattenArgs) -> Result<()> {
    let document = read_document(&args.input)?;
    let exports = render_exports(&project(&document));

    if let Some(ref path) = args.output {
        std::fs::write(path, &exports)
            .with_context(|| format!("failed to write {}", path.display()))?;
        eprintln!("Exported to {}", path.display());
    } else {
        print!("{}", exports);
    }

    Ok(())
}
