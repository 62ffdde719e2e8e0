//! Repository resolution - Find the target repository or create it.

use super::api::{ContentsApi, RepositoryHandle};
use anyhow::{Context, Result};
use tracing::info;

/// Looks up repositories owned by the authenticated identity.
pub struct RepositoryResolver<'a> {
    api: &'a dyn ContentsApi,
    owner: String,
}

impl<'a> RepositoryResolver<'a> {
    /// Fetch the authenticated login once; every lookup is scoped to it.
    pub fn connect(api: &'a dyn ContentsApi) -> Result<Self> {
        let owner = api
            .current_user()
            .context("Cannot fetch GitHub username")?;
        Ok(Self { api, owner })
    }

    /// `false` on 404; other API errors are returned as-is, without retry.
    pub fn exists(&self, name: &str) -> Result<bool> {
        self.api
            .repo_exists(&self.owner, name)
            .with_context(|| format!("Cannot check repository '{}/{}'", self.owner, name))
    }

    pub fn create(&self, name: &str, private: bool) -> Result<RepositoryHandle> {
        let repo = self
            .api
            .create_repo(name, private)
            .with_context(|| format!("Failed to create repository '{}'", name))?;
        info!("Repository '{}' created successfully.", repo.full_name);
        Ok(repo)
    }

    /// Existing repository, or a newly created one.
    pub fn resolve(&self, name: &str, private: bool) -> Result<RepositoryHandle> {
        if self.exists(name)? {
            info!("Repository '{}/{}' already exists.", self.owner, name);
            return Ok(RepositoryHandle::new(&self.owner, name));
        }
        info!("Repository '{}/{}' not found, creating it...", self.owner, name);
        self.create(name, private)
    }
}
