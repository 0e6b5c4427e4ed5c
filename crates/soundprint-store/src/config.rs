use anyhow::{Context, Result};
use confyg::{env, Confygery};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for a soundprint store.
///
/// Configuration is loaded from multiple sources with the following priority:
/// 1. Explicit overrides (e.g. [`Config::load_with_db_path`])
/// 2. Environment variables (SOUNDPRINT_* prefix)
/// 3. Config file (~/.config/soundprint/config.toml)
/// 4. Built-in defaults (lowest priority)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the SQLite database.
    ///
    /// Can be set via:
    /// - ENV: SOUNDPRINT_DATABASE_PATH
    /// - Config: database_path = "/path/to/db"
    /// - Default: ~/.local/share/soundprint/soundprint.db
    #[serde(default = "default_db_path")]
    pub database_path: PathBuf,

    /// How long a writer waits on a locked database file, in milliseconds.
    ///
    /// Can be set via:
    /// - ENV: SOUNDPRINT_BUSY_TIMEOUT_MS
    /// - Config: busy_timeout_ms = 5000
    #[serde(
        default = "default_busy_timeout_ms",
        deserialize_with = "deserialize_millis"
    )]
    pub busy_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Searches for config file at: ~/.config/soundprint/config.toml
    /// Reads environment variables with SOUNDPRINT_ prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        let config_path = config_file_path();

        let mut builder = Confygery::new().context("Failed to create config builder")?;

        if config_path.exists() {
            let path_str = config_path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Config path contains invalid UTF-8"))?;
            builder
                .add_file(path_str)
                .context("Failed to load config file")?;
        }

        let env_opts = env::Options::with_top_level("soundprint");
        builder
            .add_env(env_opts)
            .context("Failed to load environment variables")?;

        let config: Self = builder
            .build()
            .context("Failed to build configuration")?;

        Ok(config)
    }

    /// Load configuration, then point it at `db_path`.
    pub fn load_with_db_path(db_path: PathBuf) -> Result<Self> {
        let mut config = Self::load()?;
        config.database_path = db_path;
        Ok(config)
    }

    #[must_use]
    pub const fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

/// Returns: ~/.local/share/soundprint/soundprint.db (or platform equivalent)
fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("soundprint")
        .join("soundprint.db")
}

const fn default_busy_timeout_ms() -> u64 {
    5_000
}

/// Environment values arrive as strings, file values as integers.
fn deserialize_millis<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Millis {
        Number(u64),
        Text(String),
    }

    match Millis::deserialize(deserializer)? {
        Millis::Number(ms) => Ok(ms),
        Millis::Text(text) => text.trim().parse().map_err(|e| {
            serde::de::Error::custom(format!("busy_timeout_ms {text:?} is not a number: {e}"))
        }),
    }
}

/// Get the config file path.
///
/// Returns:
/// - Linux: ~/.config/soundprint/config.toml
/// - macOS: ~/Library/Application Support/soundprint/config.toml
/// - Windows: %APPDATA%\soundprint\config.toml
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("soundprint")
        .join("config.toml")
}
