//! Reconciliation engine - Per-file decide-skip-or-upload.
//!
//! Every file ends in exactly one terminal state:
//!
//! ```text
//! Pending -> Skipped
//! Pending -> Uploading -> Succeeded
//! Pending -> Uploading -> Failed(n attempts)
//! Pending -> Failed(0 attempts)        local read or remote fetch failed
//! ```

use super::api::{ContentsApi, RepositoryHandle, UploadRequest};
use super::comparator::ContentComparator;
use super::retry::{RetryPolicy, Sleeper};
use super::walker::FileEntry;
use anyhow::{Context, Result};
use rayon::prelude::*;
use tracing::{error, info, warn};

/// Default commit message; `{path}` is replaced with the relative path.
pub const DEFAULT_COMMIT_MESSAGE: &str = "Upload {path}";

/// Terminal state of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Remote content already matches; no write call was made
    Skipped { sha: String },
    /// Upload succeeded
    Uploaded {
        /// Blob sha now stored remotely
        sha: String,
        /// Revision that was replaced, `None` when the file was created
        previous_sha: Option<String>,
        attempts: u32,
    },
    /// Gave up on this file
    Failed { attempts: u32, error: String },
}

/// Outcome for one relative path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub relative_path: String,
    pub outcome: FileOutcome,
}

/// Outcomes of a whole run, in traversal order.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub repository: Option<RepositoryHandle>,
    pub files: Vec<FileReport>,
}

impl SyncReport {
    pub fn total(&self) -> usize {
        self.files.len()
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Skipped { .. }))
    }

    pub fn uploaded(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Uploaded { .. }))
    }

    /// Uploads that created a new remote file.
    pub fn created(&self) -> usize {
        self.count(|o| {
            matches!(
                o,
                FileOutcome::Uploaded {
                    previous_sha: None,
                    ..
                }
            )
        })
    }

    /// Uploads that replaced an existing revision.
    pub fn updated(&self) -> usize {
        self.uploaded() - self.created()
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Failed { .. }))
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileReport> {
        self.files
            .iter()
            .filter(|f| matches!(f.outcome, FileOutcome::Failed { .. }))
    }

    /// Look up the outcome for a relative path.
    pub fn outcome(&self, relative_path: &str) -> Option<&FileOutcome> {
        self.files
            .iter()
            .find(|f| f.relative_path == relative_path)
            .map(|f| &f.outcome)
    }

    fn count(&self, pred: impl Fn(&FileOutcome) -> bool) -> usize {
        self.files.iter().filter(|f| pred(&f.outcome)).count()
    }
}

/// Reconciles local files against one remote repository.
pub struct Reconciler<'a> {
    api: &'a dyn ContentsApi,
    repo: &'a RepositoryHandle,
    comparator: &'a dyn ContentComparator,
    retry: RetryPolicy,
    sleeper: &'a dyn Sleeper,
    commit_message: String,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        api: &'a dyn ContentsApi,
        repo: &'a RepositoryHandle,
        comparator: &'a dyn ContentComparator,
        retry: RetryPolicy,
        sleeper: &'a dyn Sleeper,
    ) -> Self {
        Self {
            api,
            repo,
            comparator,
            retry,
            sleeper,
            commit_message: DEFAULT_COMMIT_MESSAGE.to_string(),
        }
    }

    /// Override the commit message template (`{path}` placeholder).
    pub fn with_commit_message(mut self, template: &str) -> Self {
        self.commit_message = template.to_string();
        self
    }

    fn message_for(&self, relative_path: &str) -> String {
        self.commit_message.replace("{path}", relative_path)
    }

    /// Reconcile every file; `jobs > 1` spreads files over a worker pool.
    /// The returned reports keep the order of `files`.
    pub fn reconcile_all(&self, files: &[FileEntry], jobs: usize) -> Result<Vec<FileReport>> {
        if jobs <= 1 {
            return Ok(files.iter().map(|f| self.reconcile(f)).collect());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .context("Cannot build upload worker pool")?;
        Ok(pool.install(|| files.par_iter().map(|f| self.reconcile(f)).collect()))
    }

    /// Bring one file in line with the remote.
    pub fn reconcile(&self, entry: &FileEntry) -> FileReport {
        let path = entry.relative_path.as_str();
        info!("Processing file: {}", path);

        FileReport {
            relative_path: path.to_string(),
            outcome: self.decide(entry),
        }
    }

    fn decide(&self, entry: &FileEntry) -> FileOutcome {
        let path = entry.relative_path.as_str();

        let content = match std::fs::read(&entry.path) {
            Ok(content) => content,
            Err(e) => {
                error!("Cannot read {}: {}", entry.path.display(), e);
                return FileOutcome::Failed {
                    attempts: 0,
                    error: format!("cannot read local file: {}", e),
                };
            }
        };

        let remote = match self.api.get_file(self.repo, path) {
            Ok(remote) => remote,
            Err(e) => {
                error!("Cannot fetch remote metadata for {}: {}", path, e);
                return FileOutcome::Failed {
                    attempts: 0,
                    error: e.to_string(),
                };
            }
        };

        if let Some(remote) = &remote {
            if self.comparator.matches(&content, remote) {
                info!("No changes in {}. Skipping.", path);
                return FileOutcome::Skipped {
                    sha: remote.sha.clone(),
                };
            }
        }

        let previous_sha = remote.map(|r| r.sha);
        let request = UploadRequest {
            path,
            content: &content,
            message: self.message_for(path),
            previous_sha: previous_sha.as_deref(),
        };

        let max_attempts = self.retry.max_attempts;
        let result = self.retry.run(
            self.sleeper,
            |_| self.api.put_file(self.repo, &request),
            |attempt, e| {
                warn!(
                    "Upload attempt {}/{} for {} failed: {}",
                    attempt, max_attempts, path, e
                );
            },
        );

        match result {
            Ok((receipt, attempts)) => {
                let action = if previous_sha.is_some() { "updated" } else { "created" };
                info!("Successfully uploaded {} ({})", path, action);
                FileOutcome::Uploaded {
                    sha: receipt.sha,
                    previous_sha,
                    attempts,
                }
            }
            Err(exhausted) => {
                error!(
                    "Failed to upload {} after {} attempts: {}",
                    path, exhausted.attempts, exhausted.last_error
                );
                FileOutcome::Failed {
                    attempts: exhausted.attempts,
                    error: exhausted.last_error.to_string(),
                }
            }
        }
    }
}
