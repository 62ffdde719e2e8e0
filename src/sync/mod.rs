//! Sync module - Mirror a local directory into a GitHub repository.
//!
//! This module contains:
//! - ContentsApi trait for abstraction, with the GitHub REST client
//! - Repository resolution (lookup or create)
//! - Directory traversal with a substring ignore list
//! - Content comparison, bounded retry and the per-file reconciliation engine

pub mod api;
pub mod comparator;
pub mod github;
pub mod reconcile;
pub mod repository;
pub mod retry;
pub mod syncer;
pub mod walker;

pub use api::{
    ApiError, ApiResult, ContentsApi, RemoteFileRecord, RepositoryHandle, UploadReceipt,
    UploadRequest,
};
pub use comparator::{BlobShaComparator, CompareMode, ContentComparator, RawBytesComparator};
pub use github::GitHubClient;
pub use reconcile::{FileOutcome, FileReport, Reconciler, SyncReport};
pub use repository::RepositoryResolver;
pub use retry::{Backoff, RetryPolicy, Sleeper, ThreadSleeper};
pub use syncer::{SyncOptions, Syncer};
pub use walker::{collect_files, FileEntry, IgnoreList};
