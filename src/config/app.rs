//! Typed view of the Komodo settings.

use serde::{Deserialize, Serialize};

use super::loader::Settings;

/// Komodo application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    pub version: String,
    pub discord: DiscordSettings,
    pub pnw: PnwSettings,
    pub ai: AiSettings,
    pub database: DatabaseSettings,
    pub logging: LoggingSettings,
}

/// Bot settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscordSettings {
    pub token: String,
    pub client_secret: String,
    pub bot_name: String,
    pub default_command_prefix: String,
    pub developer_guild_id: i64,
}

/// Politics & War API settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PnwSettings {
    pub api_key: String,
    pub bot_key: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiSettings {
    pub openai_key: String,
    pub chatbot_channel_id: i64,
    pub tenor: TenorSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenorSettings {
    pub api_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: i64,
    pub database: String,
    pub user: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    pub stream: StreamLoggingSettings,
    pub file: FileLoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamLoggingSettings {
    pub level: String,
    pub level_discord: String,
    pub datefmt: String,
    pub format_info: String,
    pub format_debug: String,
    pub format_warning: String,
    pub format_error: String,
    pub format_critical: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileLoggingSettings {
    /// Empty disables file logging.
    pub path: String,
    pub level: String,
    pub level_discord: String,
    pub datefmt: String,
    pub format: String,
}

impl TryFrom<&Settings> for AppSettings {
    type Error = serde_json::Error;

    fn try_from(settings: &Settings) -> Result<Self, Self::Error> {
        serde_json::from_value(settings.to_json())
    }
}
