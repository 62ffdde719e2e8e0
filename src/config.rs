//! Config module - Manages gitup configuration (gitup.toml).
//!
//! Configuration file contains:
//! - GitHub API endpoint, user agent and target branch
//! - Repository creation and comparison settings
//! - Retry policy for uploads
//! - Location of the credential record

use crate::sync::comparator::CompareMode;
use crate::sync::github::DEFAULT_API_BASE;
use crate::sync::reconcile::DEFAULT_COMMIT_MESSAGE;
use crate::sync::retry::RetryConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main gitup configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// GitHub REST endpoint (GitHub Enterprise: https://host/api/v3)
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Branch to read and write; repository default branch when unset
    #[serde(default)]
    pub branch: Option<String>,

    /// Create missing repositories as private
    #[serde(default)]
    pub private: bool,

    /// How local and remote content are compared
    #[serde(default)]
    pub compare: CompareMode,

    /// Number of parallel uploads
    #[serde(default = "default_jobs")]
    pub jobs: usize,

    /// Commit message template; `{path}` is the relative file path
    #[serde(default = "default_commit_message")]
    pub commit_message: String,

    /// Credential record location (default: <config dir>/gitup/credentials.json)
    #[serde(default)]
    pub credentials_path: Option<PathBuf>,

    /// Upload retry policy
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_user_agent() -> String {
    env!("CARGO_PKG_NAME").to_string()
}

fn default_jobs() -> usize {
    1
}

fn default_commit_message() -> String {
    DEFAULT_COMMIT_MESSAGE.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            user_agent: default_user_agent(),
            branch: None,
            private: false,
            compare: CompareMode::default(),
            jobs: default_jobs(),
            commit_message: default_commit_message(),
            credentials_path: None,
            retry: RetryConfig::default(),
        }
    }
}

/// Get default config directory (~/.config/gitup/).
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("gitup"))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get default config file path.
pub fn default_config_path() -> PathBuf {
    default_config_dir().join("gitup.toml")
}

/// Get default credential record path.
pub fn default_credentials_path() -> PathBuf {
    default_config_dir().join("credentials.json")
}

impl Config {
    /// Load config from file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Cannot parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load config from `path`, or defaults when the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).with_context(|| "Cannot serialize config to TOML")?;

        std::fs::write(path, content)
            .with_context(|| format!("Cannot write config file: {}", path.display()))?;

        Ok(())
    }

    /// Where the token is persisted.
    pub fn credentials_path(&self) -> PathBuf {
        self.credentials_path
            .clone()
            .unwrap_or_else(default_credentials_path)
    }
}
