//! Configuration loading and management.
//!
//! Resolution order (later wins):
//! 1. Built-in defaults
//! 2. First config file found: `--config <file>`, `./todo-web.yaml`,
//!    `~/.todo-web/config.yaml`
//! 3. Environment: `TODO_WEB_DB_PATH`, `TODO_WEB_PORT`, `TODO_WEB_RETENTION_DAYS`
//! 4. CLI flags (applied by `main`)

use crate::service::DEFAULT_RETENTION_DAYS;
use anyhow::{Context, Result, anyhow};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Config file name looked up in the working directory.
pub const PROJECT_CONFIG_FILE: &str = "todo-web.yaml";

/// Default port for the web UI.
pub const DEFAULT_PORT: u16 = 8080;

/// Upper bound for `retention_days` (100 years).
pub const MAX_RETENTION_DAYS: i64 = 36_500;

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
}

/// Server-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Interface the web UI binds to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port the web UI listens on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding `index.html`.
    #[serde(default = "default_templates_dir")]
    pub templates_dir: PathBuf,

    /// Directory served under `/static/`.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,

    /// Todos older than this are swept at startup.
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            host: default_host(),
            port: default_port(),
            templates_dir: default_templates_dir(),
            static_dir: default_static_dir(),
            retention_days: default_retention_days(),
        }
    }
}

impl ServerConfig {
    /// Retention period, or an error when `retention_days` is outside
    /// `1..=MAX_RETENTION_DAYS`.
    pub fn retention(&self) -> Result<Duration> {
        retention_from_days(self.retention_days).ok_or_else(|| {
            anyhow!(
                "retention_days must be between 1 and {}, got {}",
                MAX_RETENTION_DAYS,
                self.retention_days
            )
        })
    }
}

fn retention_from_days(days: i64) -> Option<Duration> {
    if (1..=MAX_RETENTION_DAYS).contains(&days) {
        Duration::try_days(days)
    } else {
        None
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("todo.db")
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_templates_dir() -> PathBuf {
    PathBuf::from("templates")
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

fn default_retention_days() -> i64 {
    DEFAULT_RETENTION_DAYS
}

impl Config {
    /// Load configuration from file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Resolve the config file and environment overrides.
    ///
    /// Returns the config and the file it came from, if any. An explicit path
    /// must exist; the implicit locations are skipped when absent. Out-of-range
    /// settings are an error.
    pub fn discover(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => default_config_locations().into_iter().find(|p| p.is_file()),
        };

        let mut config = match &path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_env_from(|key| std::env::var(key).ok());
        config.server.retention()?;

        Ok((config, path))
    }

    /// Apply `TODO_WEB_*` overrides read through `lookup`.
    ///
    /// Unparsable or out-of-range numbers are ignored with a warning.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(db_path) = lookup("TODO_WEB_DB_PATH") {
            self.server.db_path = PathBuf::from(db_path);
        }

        if let Some(port) = lookup("TODO_WEB_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => warn!(value = %port, "Ignoring invalid TODO_WEB_PORT"),
            }
        }

        if let Some(days) = lookup("TODO_WEB_RETENTION_DAYS") {
            match days.parse::<i64>() {
                Ok(parsed) if retention_from_days(parsed).is_some() => {
                    self.server.retention_days = parsed;
                }
                _ => warn!(value = %days, "Ignoring invalid TODO_WEB_RETENTION_DAYS"),
            }
        }
    }

    /// Address string for the listener, e.g. `127.0.0.1:8080`.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn default_config_locations() -> Vec<PathBuf> {
    let mut locations = vec![PathBuf::from(PROJECT_CONFIG_FILE)];
    if let Some(home) = dirs::home_dir() {
        locations.push(home.join(".todo-web").join("config.yaml"));
    }
    locations
}
