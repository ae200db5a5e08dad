//! Configuration loading for relaybot.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable consulted for the bot token before the settings file.
pub const TOKEN_ENV: &str = "RELAYBOT_BOT_TOKEN";

/// Get the relaybot home directory (~/.relaybot).
pub fn get_home_dir() -> Result<PathBuf> {
    let home = directories::UserDirs::new()
        .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

    Ok(home.home_dir().join(".relaybot"))
}

/// Get the default settings file path.
pub fn get_settings_path() -> Result<PathBuf> {
    Ok(get_home_dir()?.join("settings.json"))
}

/// Load settings from `path`, or from ~/.relaybot/settings.json when `None`.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => get_settings_path()?,
    };

    if !path.exists() {
        return Err(Error::Config(format!(
            "Settings file not found at {}. Run 'relaybot setup' first.",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(&path)?;
    let settings: Settings = serde_json::from_str(&content)?;
    validate_settings(&settings)?;

    tracing::debug!("Loaded settings from {}", path.display());
    Ok(settings)
}

/// Load settings or return defaults if the file is missing or unreadable.
pub fn load_settings_or_default(path: Option<&Path>) -> Settings {
    load_settings(path).unwrap_or_else(|e| {
        tracing::warn!("Failed to load settings: {}, using defaults", e);
        Settings::default()
    })
}

/// Write settings as pretty JSON, creating the parent directory.
pub fn save_settings(path: &Path, settings: &Settings) -> Result<()> {
    validate_settings(settings)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(settings)?)?;
    Ok(())
}

fn validate_settings(settings: &Settings) -> Result<()> {
    if settings.scripts.timeout_seconds == 0 {
        return Err(Error::Config(
            "scripts.timeout_seconds must be greater than zero".to_string(),
        ));
    }
    if settings.scripts.extension.trim().is_empty() {
        return Err(Error::Config("scripts.extension must not be empty".to_string()));
    }
    if settings.scripts.interpreter.trim().is_empty() {
        return Err(Error::Config("scripts.interpreter must not be empty".to_string()));
    }
    Ok(())
}

/// Telegram configuration.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
}

/// Journal storage configuration.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct StorageConfig {
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("bot_database.db")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// Script runner configuration.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ScriptsConfig {
    #[serde(default = "default_scripts_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_scripts_extension")]
    pub extension: String,
    #[serde(default = "default_scripts_interpreter")]
    pub interpreter: String,
    #[serde(default = "default_scripts_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_scripts_directory() -> PathBuf {
    PathBuf::from("scripts")
}

fn default_scripts_extension() -> String {
    ".py".to_string()
}

fn default_scripts_interpreter() -> String {
    "python3".to_string()
}

fn default_scripts_timeout_seconds() -> u64 {
    30
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            directory: default_scripts_directory(),
            extension: default_scripts_extension(),
            interpreter: default_scripts_interpreter(),
            timeout_seconds: default_scripts_timeout_seconds(),
        }
    }
}

/// relaybot settings.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Settings {
    #[serde(default)]
    pub telegram: TelegramConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub scripts: ScriptsConfig,
}

impl Settings {
    /// Pick the bot token: an explicit override wins over the settings file.
    pub fn resolve_token(&self, override_token: Option<&str>) -> Result<String> {
        override_token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(ToString::to_string)
            .or_else(|| {
                self.telegram
                    .bot_token
                    .as_deref()
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(ToString::to_string)
            })
            .ok_or_else(|| {
                Error::Config(format!(
                    "No bot token configured. Pass --token, set {} or add telegram.bot_token to the settings file.",
                    TOKEN_ENV
                ))
            })
    }
}

/// Mask a token for display, keeping the numeric bot id prefix.
pub fn mask_token(token: &str) -> String {
    match token.split_once(':') {
        Some((id, _)) => format!("{}:****", id),
        None => "****".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn empty_file_gets_defaults() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.storage.database_path, PathBuf::from("bot_database.db"));
        assert_eq!(settings.scripts.directory, PathBuf::from("scripts"));
        assert_eq!(settings.scripts.extension, ".py");
        assert_eq!(settings.scripts.timeout_seconds, 30);
        assert!(settings.telegram.bot_token.is_none());
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"scripts": {"interpreter": "sh", "extension": ".sh"}}"#).unwrap();
        assert_eq!(settings.scripts.interpreter, "sh");
        assert_eq!(settings.scripts.extension, ".sh");
        assert_eq!(settings.scripts.timeout_seconds, 30);
    }

    #[test]
    fn missing_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nope.json");
        assert!(matches!(load_settings(Some(path.as_path())), Err(Error::Config(_))));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        std::fs::write(&path, r#"{"scripts": {"timeout_seconds": 0}}"#).unwrap();
        assert!(matches!(load_settings(Some(path.as_path())), Err(Error::Config(_))));
    }

    #[test]
    fn save_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("settings.json");
        let mut settings = Settings::default();
        settings.telegram.bot_token = Some("123:abc".to_string());
        save_settings(&path, &settings).unwrap();

        let loaded = load_settings(Some(path.as_path())).unwrap();
        assert_eq!(loaded.telegram.bot_token.as_deref(), Some("123:abc"));
    }

    #[test]
    fn token_override_wins() {
        let mut settings = Settings::default();
        settings.telegram.bot_token = Some("from-file".to_string());
        assert_eq!(settings.resolve_token(Some("from-env")).unwrap(), "from-env");
        assert_eq!(settings.resolve_token(Some("  ")).unwrap(), "from-file");
        assert!(Settings::default().resolve_token(None).is_err());
    }

    #[test]
    fn masked_token_hides_secret() {
        assert_eq!(mask_token("123456:ABC-DEF"), "123456:****");
        assert_eq!(mask_token("garbage"), "****");
    }
}
