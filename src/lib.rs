//! gitup Core Library
//!
//! Mirrors a local directory tree into a GitHub repository through the REST
//! contents API:
//! - Resolve the API token (argument or persisted credential record)
//! - Find the target repository, creating it when missing
//! - Walk the directory, skipping ignored paths
//! - Upload only files whose content differs from the remote copy, with
//!   bounded retry per file
//!
//! Pipeline: Credentials -> Repository -> Walk -> Reconcile (skip | upload | fail)

pub mod config;
pub mod credentials;
pub mod sync;

// Re-export main types
pub use config::Config;
pub use credentials::{Credential, CredentialStore};
pub use sync::{ContentsApi, GitHubClient, IgnoreList, SyncOptions, SyncReport, Syncer};
