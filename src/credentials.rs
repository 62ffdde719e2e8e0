//! Credential store - Persists the GitHub API token between runs.
//!
//! The record is a flat JSON object (`{"github_token": "..."}`) rewritten
//! wholesale on every save. A record that cannot be parsed is reset instead
//! of failing the run.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Opaque bearer token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// `None` for blank tokens.
    pub fn new(token: &str) -> Option<Self> {
        let token = token.trim();
        (!token.is_empty()).then(|| Self(token.to_string()))
    }

    pub fn token(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    // Never print the token itself
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CredentialRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    github_token: Option<String>,
}

/// File-backed token storage.
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored token, if any. Malformed records are reset and read as absent.
    pub fn load(&self) -> Result<Option<Credential>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let json = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read credentials: {}", self.path.display()))?;

        match serde_json::from_str::<CredentialRecord>(&json) {
            Ok(record) => Ok(record.github_token.as_deref().and_then(Credential::new)),
            Err(e) => {
                warn!(
                    "Error reading token from {} ({}). Resetting the file.",
                    self.path.display(),
                    e
                );
                self.write(&CredentialRecord::default())?;
                Ok(None)
            }
        }
    }

    /// Overwrite the record with `credential`.
    pub fn save(&self, credential: &Credential) -> Result<()> {
        self.write(&CredentialRecord {
            github_token: Some(credential.token().to_string()),
        })
    }

    fn write(&self, record: &CredentialRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(record)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Cannot write credentials: {}", self.path.display()))?;

        // Restrict file permissions on Unix
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }
}
