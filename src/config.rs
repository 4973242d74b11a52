//! Configuration loading and management.
//!
//! Lookup order: an explicit `--config` path, then `keydate-sync/config.yaml`
//! in the working directory, then `config.yaml` in the user config directory,
//! then built-in defaults. `KEYDATE_SYNC_*` environment variables are applied
//! on top of whichever file was used.

use crate::source::schema::DEFAULT_KEY_DATE_FIELD_UID;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_DIR: &str = "keydate-sync";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub target: TargetConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

/// Legacy scheduling store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Path to the legacy SQLite database (opened read-only).
    #[serde(default = "default_source_path")]
    pub db_path: PathBuf,

    /// MD_PROP_UID of the custom field holding key-date labels.
    #[serde(default = "default_key_date_field_uid")]
    pub key_date_field_uid: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            db_path: default_source_path(),
            key_date_field_uid: default_key_date_field_uid(),
        }
    }
}

/// Normalized target store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetConfig {
    #[serde(default = "default_target_path")]
    pub db_path: PathBuf,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            db_path: default_target_path(),
        }
    }
}

/// HTTP listener.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_source_path() -> PathBuf {
    PathBuf::from("keydate-sync/legacy.db")
}

fn default_key_date_field_uid() -> String {
    DEFAULT_KEY_DATE_FIELD_UID.to_string()
}

fn default_target_path() -> PathBuf {
    PathBuf::from("keydate-sync/target.db")
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

/// Directories searched for `config.yaml`.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub project_dir: Option<PathBuf>,
    pub user_dir: Option<PathBuf>,
}

impl ConfigPaths {
    pub fn discover() -> Self {
        Self {
            project_dir: Some(PathBuf::from(APP_DIR)),
            user_dir: dirs::config_dir().map(|d| d.join(APP_DIR)),
        }
    }

    fn candidates(&self) -> impl Iterator<Item = PathBuf> + '_ {
        self.project_dir
            .iter()
            .chain(self.user_dir.iter())
            .map(|dir| dir.join("config.yaml"))
    }
}

impl Config {
    /// Load configuration from file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    /// Resolve configuration and report which file, if any, was used.
    pub fn resolve(explicit: Option<&Path>, paths: &ConfigPaths) -> Result<(Self, Option<PathBuf>)> {
        let (mut config, used) = match explicit {
            Some(path) => (Self::load(path)?, Some(path.to_path_buf())),
            None => match paths.candidates().find(|p| p.exists()) {
                Some(path) => (Self::load(&path)?, Some(path)),
                None => (Self::default(), None),
            },
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        debug!(config = ?used, "configuration resolved");
        Ok((config, used))
    }

    /// Apply `KEYDATE_SYNC_*` overrides; unparsable numbers are ignored.
    pub fn apply_env_overrides<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = var("KEYDATE_SYNC_SOURCE_DB") {
            self.source.db_path = PathBuf::from(path);
        }
        if let Some(uid) = var("KEYDATE_SYNC_KEY_DATE_FIELD") {
            self.source.key_date_field_uid = uid;
        }
        if let Some(path) = var("KEYDATE_SYNC_TARGET_DB") {
            self.target.db_path = PathBuf::from(path);
        }
        if let Some(host) = var("KEYDATE_SYNC_HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("KEYDATE_SYNC_PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
    }

    /// Ensure the target database directory exists.
    pub fn ensure_target_dir(&self) -> Result<()> {
        if let Some(parent) = self.target.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}
