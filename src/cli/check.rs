//! Check subcommand: resolve settings the way the bot does at startup.

use anyhow::Result;
use clap::Args;
use tracing::info;

use crate::config::{AppSettings, EnvLookup, Selector, SettingsLoader, render_exports};
use crate::error::ConfigurationError;

/// Arguments for the check subcommand
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Print the resolved settings as export statements
    #[arg(long)]
    pub print: bool,
}

/// Outcome of a check, mapped to the process exit status by the caller.
#[derive(Debug)]
pub enum CheckOutcome {
    /// Settings resolved; the report is ready to print.
    Ready(String),
    /// Settings could not be resolved.
    Failed(ConfigurationError),
}

/// Run the check command, honouring the document toggle.
pub fn run_check<E: EnvLookup>(
    loader: &SettingsLoader<E>,
    selector: Selector,
    args: &CheckArgs,
) -> Result<CheckOutcome> {
    let loaded = match loader.load_from_env(selector) {
        Ok(loaded) => loaded,
        Err(err) => return Ok(CheckOutcome::Failed(err)),
    };

    let mut report = String::new();
    if loaded.created()
        && let Some(ref path) = loaded.document
    {
        report.push_str(&format!(
            "Default settings saved to {}. Please update the settings file as needed and restart the application.\n",
            path.display()
        ));
    }
    report.push_str(&format!(
        "Settings OK for {} (source: {})\n",
        loaded.settings.selector(),
        loaded.source
    ));
    for problem in &loaded.problems {
        report.push_str(&format!("warning: {}\n", problem));
    }

    if let Ok(app) = AppSettings::try_from(&loaded.settings) {
        info!(
            bot = %app.discord.bot_name,
            database = %app.database.host,
            "Resolved Komodo settings"
        );
    }

    if args.print {
        report.push_str(&render_exports(&loaded.settings.exports()));
    }

    Ok(CheckOutcome::Ready(report))
}

/// Human-readable failure listing, with a hint when a document was generated.
pub fn failure_report(err: &ConfigurationError) -> String {
    let mut report = err.to_string();
    if let Some(ref path) = err.document_created {
        report.push_str(&format!(
            "\nDefault settings were saved to {}. Fill in the generated file and restart.",
            path.display()
        ));
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LeafSpec, Schema, USE_FILE_VAR};
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn schema() -> Schema {
        Schema::builder()
            .section("discord", |s| {
                s.leaf("token", LeafSpec::string("").required())
                    .leaf("guild_id", LeafSpec::integer(0))
            })
            .build()
            .unwrap()
    }

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_check_env_only_success_prints_exports() {
        let temp = TempDir::new().unwrap();
        let loader = SettingsLoader::new(schema())
            .with_base_dir(temp.path())
            .with_env(env(&[
                (USE_FILE_VAR, "false"),
                ("KOMODO_DISCORD_TOKEN", "abc"),
            ]));

        let outcome = run_check(&loader, Selector::Production, &CheckArgs { print: true }).unwrap();
        let CheckOutcome::Ready(report) = outcome else {
            panic!("expected success");
        };
        assert!(report.contains("source: environment variables"));
        assert!(report.contains("export KOMODO_DISCORD_TOKEN=\"abc\"\n"));
        assert!(report.contains("export KOMODO_DISCORD_GUILD_ID=0\n"));
        assert!(!loader.document_path(Selector::Production).exists());
    }

    #[test]
    fn test_check_failure_mentions_generated_document() {
        let temp = TempDir::new().unwrap();
        let loader = SettingsLoader::new(schema())
            .with_base_dir(temp.path())
            .with_env(env(&[]));

        let outcome = run_check(
            &loader,
            Selector::Production,
            &CheckArgs { print: false },
        )
        .unwrap();
        let CheckOutcome::Failed(err) = outcome else {
            panic!("expected failure");
        };
        let report = failure_report(&err);
        assert!(report.contains("- discord.token"));
        assert!(report.contains("Fill in the generated file"));
    }
}
