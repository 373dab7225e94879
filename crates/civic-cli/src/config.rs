//! Configuration loading for the civic CLI

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};

use civic_rl::AgentConfig;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "CIVIC_CONFIG";

/// Local config file name
pub const CONFIG_FILE: &str = "civic.toml";

/// Full configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub agent: AgentConfig,
    pub persistence: PersistenceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Emit JSON log lines instead of human-readable ones
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Where the policy snapshot lives. Without it the policy is in-memory only.
    pub snapshot_path: Option<PathBuf>,
    /// Save the snapshot after every resolution
    pub autosave: bool,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            snapshot_path: None,
            autosave: true,
        }
    }
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// Returns the file used, if any, so the caller can report it once
    /// logging is up.
    pub fn load() -> Result<(Self, Option<PathBuf>)> {
        let path = Self::find_config_file();
        let config = Self::from_sources(path.as_deref(), true)?;
        Ok((config, path))
    }

    /// Defaults, then `file` if given, then `CIVIC__*` variables if `with_env`
    pub fn from_sources(file: Option<&Path>, with_env: bool) -> Result<Self> {
        let mut builder = ConfigBuilder::<config::builder::DefaultState>::default();

        if let Some(path) = file {
            builder = builder.add_source(File::from(path.to_path_buf()).required(false));
        }

        // CIVIC__AGENT__EPSILON=0.1 style overrides
        if with_env {
            builder = builder.add_source(
                Environment::with_prefix("CIVIC")
                    .separator("__")
                    .try_parsing(true),
            );
        }

        let config: Self = builder
            .build()?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config
            .agent
            .validate()
            .context("Invalid [agent] configuration")?;
        Ok(config)
    }

    /// Check in order: CIVIC_CONFIG, ./civic.toml, ~/.config/civic/civic.toml
    pub fn find_config_file() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let local = PathBuf::from(CONFIG_FILE);
        if local.exists() {
            return Some(local);
        }

        let user_config = dirs::home_dir()?
            .join(".config")
            .join("civic")
            .join(CONFIG_FILE);
        user_config.exists().then_some(user_config)
    }

    /// One-line description of where configuration came from
    pub fn source_description(file: Option<&Path>) -> String {
        match file {
            Some(path) => format!("Loaded config from {}", path.display()),
            None => "No config file found, using defaults".to_string(),
        }
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to render configuration")
    }
}
