//! User configuration.
//!
//! Config file: `<config dir>/study-quest/config.toml`, or the path given with
//! `--config`. Every key is optional.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::db;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite file, defaults to the platform data dir
    pub database: Option<PathBuf>,
    /// user logged in on start
    pub user: Option<String>,
    /// desktop notifications for milestones
    pub notifications: bool,
    /// tracing filter used when RUST_LOG is unset
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: None,
            user: None,
            notifications: true,
            log_filter: "info".to_string(),
        }
    }
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("study-quest").join("config.toml"))
    }

    /// explicit path must exist; the default path may be missing
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_file(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_file(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn database_path(&self) -> PathBuf {
        self.database.clone().unwrap_or_else(db::default_db_path)
    }
}
