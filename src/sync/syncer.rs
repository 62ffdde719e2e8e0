//! Syncer - Runs repository resolution, traversal and reconciliation in order.

use super::api::ContentsApi;
use super::comparator::{BlobShaComparator, ContentComparator};
use super::reconcile::{Reconciler, SyncReport, DEFAULT_COMMIT_MESSAGE};
use super::repository::RepositoryResolver;
use super::retry::{RetryPolicy, Sleeper, ThreadSleeper};
use super::walker::{collect_files, IgnoreList};
use crate::config::Config;
use anyhow::{bail, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Options of one sync run.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Create the repository as private if it does not exist
    pub private: bool,
    /// Worker threads for uploads; 1 keeps the run sequential
    pub jobs: usize,
    pub retry: RetryPolicy,
    /// Commit message template, `{path}` is replaced by the relative path
    pub commit_message: String,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            private: false,
            jobs: 1,
            retry: RetryPolicy::default(),
            commit_message: DEFAULT_COMMIT_MESSAGE.to_string(),
        }
    }
}

impl From<&Config> for SyncOptions {
    fn from(config: &Config) -> Self {
        Self {
            private: config.private,
            jobs: config.jobs.max(1),
            retry: RetryPolicy::from(&config.retry),
            commit_message: config.commit_message.clone(),
        }
    }
}

/// Mirrors a local directory into a remote repository.
pub struct Syncer {
    api: Arc<dyn ContentsApi>,
    comparator: Box<dyn ContentComparator>,
    sleeper: Box<dyn Sleeper>,
    options: SyncOptions,
}

impl Syncer {
    /// Blob-sha comparison and real sleeps.
    pub fn new(api: Arc<dyn ContentsApi>, options: SyncOptions) -> Self {
        Self {
            api,
            comparator: Box::new(BlobShaComparator),
            sleeper: Box::new(ThreadSleeper),
            options,
        }
    }

    pub fn with_comparator(mut self, comparator: Box<dyn ContentComparator>) -> Self {
        self.comparator = comparator;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Box<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Sync `root` into the repository `repo_name` of the authenticated user.
    ///
    /// The root is validated before the first network call.
    pub fn run(&self, repo_name: &str, root: &Path, ignore: &IgnoreList) -> Result<SyncReport> {
        if !root.is_dir() {
            bail!("Invalid path provided: {}", root.display());
        }
        if repo_name.trim().is_empty() {
            bail!("Repository name is required");
        }

        let resolver = RepositoryResolver::connect(self.api.as_ref())?;
        let repo = resolver.resolve(repo_name.trim(), self.options.private)?;

        let files = collect_files(root, ignore)?;
        info!(
            "Reconciling {} file(s) with {} (compare: {}, jobs: {})",
            files.len(),
            repo.full_name,
            self.comparator.name(),
            self.options.jobs
        );

        let reconciler = Reconciler::new(
            self.api.as_ref(),
            &repo,
            self.comparator.as_ref(),
            self.options.retry,
            self.sleeper.as_ref(),
        )
        .with_commit_message(&self.options.commit_message);
        let reports = reconciler.reconcile_all(&files, self.options.jobs)?;

        Ok(SyncReport {
            repository: Some(repo),
            files: reports,
        })
    }
}
