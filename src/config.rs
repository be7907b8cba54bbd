//! Configuration loading.
//!
//! Resolution order: explicit `--config` path, then `SWARMDESK_CONFIG_PATH`,
//! then `./swarmdesk.yaml`, then `~/.config/swarmdesk/config.yaml`, then
//! built-in defaults. `SWARMDESK_DB_PATH` and `SWARMDESK_PORT` override the
//! corresponding fields after the file is loaded.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_PATH_ENV: &str = "SWARMDESK_CONFIG_PATH";
pub const DB_PATH_ENV: &str = "SWARMDESK_DB_PATH";
pub const PORT_ENV: &str = "SWARMDESK_PORT";

/// Default port for the HTTP interaction surface.
pub const DEFAULT_PORT: u16 = 8474;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub reminders: RemindersConfig,
    #[serde(default)]
    pub delivery: DeliveryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("swarmdesk.db")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port for the HTTP interaction surface.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemindersConfig {
    /// Run the periodic sweep (default: true).
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Seconds between sweeps (default: 3600).
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Age, in hours, past which an active request gets reminders (default: 24).
    #[serde(default = "default_age_threshold_hours")]
    pub age_threshold_hours: u64,
}

impl Default for RemindersConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            interval_secs: default_interval_secs(),
            age_threshold_hours: default_age_threshold_hours(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_interval_secs() -> u64 {
    3_600
}

fn default_age_threshold_hours() -> u64 {
    24
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Delay in milliseconds before the single delivery retry (default: 500).
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

fn default_retry_backoff_ms() -> u64 {
    500
}

impl AppConfig {
    /// Load configuration, falling back to defaults when no file is found.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match Self::find_file(explicit) {
            Some(path) => {
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("reading config file {}", path.display()))?;
                serde_yaml::from_str(&text)
                    .with_context(|| format!("parsing config file {}", path.display()))?
            }
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    fn find_file(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Some(PathBuf::from(path));
        }
        let project = PathBuf::from("swarmdesk.yaml");
        if project.exists() {
            return Some(project);
        }
        if let Some(dir) = dirs::config_dir() {
            let user = dir.join("swarmdesk").join("config.yaml");
            if user.exists() {
                return Some(user);
            }
        }
        None
    }

    fn apply_env(&mut self) {
        if let Ok(path) = std::env::var(DB_PATH_ENV) {
            self.database.path = PathBuf::from(path);
        }
        if let Ok(port) = std::env::var(PORT_ENV)
            && let Ok(port) = port.parse()
        {
            self.server.port = port;
        }
    }
}
