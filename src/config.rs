//! Store configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

static DEFAULT_DATABASE_PATH: &str = "~/.local/share/calstore/events.db";

fn default_database() -> PathBuf {
    PathBuf::from(DEFAULT_DATABASE_PATH)
}

fn default_account() -> String {
    "local".to_string()
}

/// Configuration at ~/.config/calstore/config.toml
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StoreConfig {
    /// SQLite database location; `~` is expanded.
    #[serde(default = "default_database")]
    pub database: PathBuf,

    /// Account owning calendars created by default.
    #[serde(default = "default_account")]
    pub account: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            database: default_database(),
            account: default_account(),
        }
    }
}

impl StoreConfig {
    pub fn config_path() -> StoreResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| StoreError::Config("Could not determine config directory".into()))?
            .join("calstore");

        Ok(config_dir.join("config.toml"))
    }

    /// Load the config, falling back to defaults when no file exists.
    pub fn load() -> StoreResult<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let config: StoreConfig =
                toml::from_str(&content).map_err(|e| StoreError::Config(e.to_string()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save the config, creating the directory when needed.
    pub fn save(&self) -> StoreResult<()> {
        let path = Self::config_path()?;
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| StoreError::Config(e.to_string()))?;
        std::fs::write(&path, content)?;

        Ok(())
    }

    /// Database path with `~` expanded.
    pub fn database_path(&self) -> PathBuf {
        let full_path_str = shellexpand::tilde(&self.database.to_string_lossy()).into_owned();

        PathBuf::from(full_path_str)
    }
}
