//! ContentsApi trait - Abstraction over the remote repository host.
//!
//! The reconciliation engine only talks to this trait, so tests can swap the
//! GitHub client for an in-memory fake.

use thiserror::Error;

/// Errors returned by a remote API call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, TLS, connection reset...)
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("GitHub API error {status}: {body}")]
    Status { status: u16, body: String },

    /// A contents lookup resolved to a directory or submodule
    #[error("remote path '{0}' is not a file")]
    NotAFile(String),

    /// The response body could not be interpreted
    #[error("cannot decode response: {0}")]
    Decode(String),
}

impl ApiError {
    /// HTTP status, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// A repository the run uploads into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryHandle {
    pub owner: String,
    pub name: String,
    /// `owner/name`, used to build contents URLs
    pub full_name: String,
    /// Whether this run created the repository
    pub created: bool,
}

impl RepositoryHandle {
    pub fn new(owner: &str, name: &str) -> Self {
        Self {
            owner: owner.to_string(),
            name: name.to_string(),
            full_name: format!("{}/{}", owner, name),
            created: false,
        }
    }
}

/// Remote counterpart of a local file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFileRecord {
    /// Relative path inside the repository
    pub path: String,
    /// Git blob SHA-1; also the revision identifier needed to overwrite
    pub sha: String,
    pub size: u64,
    /// Decoded content, when the API returned it inline
    pub content: Option<Vec<u8>>,
}

/// A create-or-update request for one file.
#[derive(Debug, Clone)]
pub struct UploadRequest<'a> {
    pub path: &'a str,
    pub content: &'a [u8],
    pub message: String,
    /// Revision being replaced; `None` creates the file
    pub previous_sha: Option<&'a str>,
}

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    /// Blob sha of the content now stored remotely
    pub sha: String,
    /// `true` for 201 Created, `false` for 200 OK
    pub created: bool,
}

/// Remote operations needed by a sync run.
pub trait ContentsApi: Send + Sync {
    /// Login of the authenticated identity.
    fn current_user(&self) -> ApiResult<String>;

    /// `Ok(false)` on 404, error on any other non-success status.
    fn repo_exists(&self, owner: &str, name: &str) -> ApiResult<bool>;

    /// Create a repository under the authenticated identity.
    fn create_repo(&self, name: &str, private: bool) -> ApiResult<RepositoryHandle>;

    /// Fetch remote metadata for a path; `Ok(None)` if it does not exist.
    fn get_file(&self, repo: &RepositoryHandle, path: &str)
        -> ApiResult<Option<RemoteFileRecord>>;

    /// Create or update a file.
    fn put_file(&self, repo: &RepositoryHandle, request: &UploadRequest<'_>)
        -> ApiResult<UploadReceipt>;
}
