use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::common::User;
use crate::service::remote::DEFAULT_POLL_INTERVAL;

pub const DEFAULT_CONFIG_PATH: &str = "config/friend_chat.json";
pub const DEFAULT_DATABASE_PATH: &str = "data/friend_chat.db";
pub const DEFAULT_USER_ID: &str = "alice";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub user: UserConfig,
    #[serde(default)]
    pub backend: BackendConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserConfig {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Where friend and chat data come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    Local {
        #[serde(default = "default_database_path")]
        database_path: PathBuf,
    },
    Remote {
        base_url: String,
        #[serde(default = "default_poll_interval_ms")]
        poll_interval_ms: u64,
    },
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            id: DEFAULT_USER_ID.to_string(),
            display_name: None,
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::Local {
            database_path: default_database_path(),
        }
    }
}

impl UserConfig {
    pub fn to_user(&self) -> User {
        User::new(self.id.clone(), self.display_name.clone())
    }
}

impl BackendConfig {
    pub fn poll_interval(&self) -> Option<Duration> {
        match self {
            Self::Remote {
                poll_interval_ms, ..
            } => Some(Duration::from_millis(*poll_interval_ms)),
            Self::Local { .. } => None,
        }
    }
}

fn default_database_path() -> PathBuf {
    PathBuf::from(DEFAULT_DATABASE_PATH)
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL.as_millis() as u64
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] io::Error),

    #[error("config is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Read and parse the config at `path`.
pub fn read_config(path: impl AsRef<Path>) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Like [`read_config`], but a missing or broken file yields the defaults.
pub fn load_config(path: &str) -> AppConfig {
    match read_config(path) {
        Ok(config) => config,
        Err(ConfigError::Io(err)) if err.kind() == io::ErrorKind::NotFound => {
            log::info!("Config file {path} not found; using defaults");
            AppConfig::default()
        }
        Err(err) => {
            log::warn!("Failed to load config file {path}: {err}; using defaults");
            AppConfig::default()
        }
    }
}

pub fn save_config(path: impl AsRef<Path>, config: &AppConfig) -> Result<(), ConfigError> {
    let path = path.as_ref();
    crate::storage::ensure_parent_dir(path)?;
    fs::write(path, serde_json::to_string_pretty(config)?)?;
    Ok(())
}
