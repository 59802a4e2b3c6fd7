//! Persistent client configuration model and file-backed manager.

use clap::ValueEnum;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::features::FeatureSet;
use crate::forms::{FilterType, DEFAULT_FILTER_USER, DEFAULT_ISSUE_LIMIT};

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_issue_limit() -> u32 {
    DEFAULT_ISSUE_LIMIT
}

fn default_user() -> String {
    DEFAULT_FILTER_USER.to_string()
}

/// Request used to check that the server answers and accepts the key.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionProbe {
    /// `/users/current.json`, reports who the key belongs to.
    #[default]
    CurrentUser,
    /// `/projects.json`, for servers that restrict the identity endpoint.
    Projects,
}

/// Represents the configuration persisted on disk: connection pre-fill values, issue filter defaults, the connection probe and the enabled feature set.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Config {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    pub api_key: Option<String>,
    #[serde(default = "default_issue_limit")]
    pub issue_limit: u32,
    pub default_filter: FilterType,
    #[serde(default = "default_user")]
    pub default_user: String,
    pub connection_probe: ConnectionProbe,
    pub features: FeatureSet,
}

impl Default for Config {
    /// Returns baseline config when no persisted settings are available.
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            issue_limit: default_issue_limit(),
            default_filter: FilterType::default(),
            default_user: default_user(),
            connection_probe: ConnectionProbe::default(),
            features: FeatureSet::default(),
        }
    }
}

/// Manages loading and saving of the configuration as a JSON file in the platform-specific config directory.
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    /// Binds a manager to the platform config path, when the platform has one.
    pub fn new() -> Option<Self> {
        let dirs = directories::ProjectDirs::from("org", "redmine-desk", "redmine-desk")?;
        Some(Self::with_path(dirs.config_dir().join("config.json")))
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Loads config from disk, falling back to defaults when the file is
    /// missing, unreadable or not valid JSON.
    pub fn load(&self) -> Config {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Config::default(),
            Err(err) => {
                warn!("Failed to read {}: {}", self.path.display(), err);
                return Config::default();
            }
        };
        serde_json::from_str(&content).unwrap_or_else(|err| {
            warn!("Ignoring invalid config {}: {}", self.path.display(), err);
            Config::default()
        })
    }

    /// Persists config to disk, creating parent directories when needed.
    /// The API key is stored in plain text, so a file holding one is made
    /// readable by its owner only.
    pub fn save(&self, config: &Config) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(config)?;
        fs::write(&self.path, content)?;
        if config.api_key.is_some() {
            restrict_to_owner(&self.path)?;
            debug!("API key stored in {}", self.path.display());
        }
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_to_owner(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_to_owner(_path: &Path) -> io::Result<()> {
    Ok(())
}
