//! Deployment environment selector.

use clap::ValueEnum;
use std::fmt;

/// Which deployment environment's document and defaults apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Selector {
    /// Local development (`settings.dev.toml`)
    #[value(name = "dev", alias = "development")]
    Development,
    /// Production deployment (`settings.toml`)
    #[value(name = "prod", alias = "production")]
    Production,
}

impl Selector {
    /// Settings document file name for this environment.
    pub fn file_name(self) -> &'static str {
        match self {
            Selector::Development => "settings.dev.toml",
            Selector::Production => "settings.toml",
        }
    }

    /// Default selector for this build: development for debug builds.
    pub fn for_build() -> Self {
        if cfg!(debug_assertions) {
            Selector::Development
        } else {
            Selector::Production
        }
    }
}

impl Default for Selector {
    fn default() -> Self {
        Self::for_build()
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Development => write!(f, "dev"),
            Selector::Production => write!(f, "prod"),
        }
    }
}
