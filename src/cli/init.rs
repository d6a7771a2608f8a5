//! Init subcommand: generate the settings document from defaults.

use anyhow::Result;

use crate::config::{EnvLookup, Selector, SettingsLoader};

/// Run the init command. An existing document is left untouched.
pub fn run_init<E: EnvLookup>(loader: &SettingsLoader<E>, selector: Selector) -> Result<()> {
    let document = loader.store().load_or_create(loader.schema(), selector)?;
    if document.created {
        println!(
            "Default settings saved to {}. Please update the settings file as needed.",
            document.path.display()
        );
    } else {
        println!(
            "{} already exists; leaving it untouched.",
            document.path.display()
        );
    }
    Ok(())
}
