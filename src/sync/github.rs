//! GitHub REST client - Repository lookup/creation and the contents API.
//!
//! Uses the blocking reqwest client; every request carries the bearer token,
//! the GitHub JSON media type and a pinned API version.

use super::api::{
    ApiError, ApiResult, ContentsApi, RemoteFileRecord, RepositoryHandle, UploadReceipt,
    UploadRequest,
};
use crate::config::Config;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Method, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Public GitHub API endpoint
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

const API_VERSION: &str = "2022-11-28";
const MEDIA_TYPE: &str = "application/vnd.github+json";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Deserialize)]
struct UserResponse {
    login: String,
}

#[derive(Serialize)]
struct CreateRepoRequest<'a> {
    name: &'a str,
    private: bool,
    auto_init: bool,
}

#[derive(Deserialize)]
struct CreateRepoResponse {
    name: String,
    full_name: String,
    owner: UserResponse,
}

/// GET /contents answers with an object for files and an array for directories.
#[derive(Deserialize)]
#[serde(untagged)]
enum ContentsResponse {
    Entry(ContentEntry),
    Listing(serde::de::IgnoredAny),
}

#[derive(Deserialize)]
struct ContentEntry {
    #[serde(rename = "type")]
    kind: String,
    sha: String,
    #[serde(default)]
    size: u64,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Serialize)]
struct PutContentsRequest<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Deserialize)]
struct PutContentsResponse {
    content: PutContentsEntry,
}

#[derive(Deserialize)]
struct PutContentsEntry {
    sha: String,
}

/// Blocking GitHub API client bound to one token.
pub struct GitHubClient {
    client: Client,
    api_base: String,
    token: String,
    branch: Option<String>,
}

impl GitHubClient {
    /// Client for api.github.com with the default user agent.
    pub fn new(token: &str) -> ApiResult<Self> {
        Self::with_base_url(token, DEFAULT_API_BASE)
    }

    /// Client for a custom API base (GitHub Enterprise, test servers).
    pub fn with_base_url(token: &str, api_base: &str) -> ApiResult<Self> {
        Self::build(token, api_base, env!("CARGO_PKG_NAME"), None)
    }

    /// Client configured from the config file (base URL, user agent, branch).
    pub fn from_config(config: &Config, token: &str) -> ApiResult<Self> {
        Self::build(
            token,
            &config.api_base,
            &config.user_agent,
            config.branch.clone(),
        )
    }

    /// Target a specific branch for reads and writes.
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    fn build(
        token: &str,
        api_base: &str,
        user_agent: &str,
        branch: Option<String>,
    ) -> ApiResult<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.to_string(),
            branch,
        })
    }

    /// Build an endpoint URL; every segment is percent-encoded.
    fn endpoint<'s>(&self, segments: impl IntoIterator<Item = &'s str>) -> ApiResult<Url> {
        let mut url = Url::parse(&self.api_base)
            .map_err(|e| ApiError::Decode(format!("invalid API base '{}': {}", self.api_base, e)))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::Decode(format!("invalid API base '{}'", self.api_base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn contents_url(&self, repo: &RepositoryHandle, path: &str) -> ApiResult<Url> {
        let head = ["repos", repo.owner.as_str(), repo.name.as_str(), "contents"];
        self.endpoint(head.into_iter().chain(path.split('/')))
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!("[GitHub] {} {}", method, url);
        self.client
            .request(method, url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(ACCEPT, MEDIA_TYPE)
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    fn parse<T: for<'de> Deserialize<'de>>(response: Response) -> ApiResult<T> {
        response
            .json::<T>()
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// Turn a non-success response into `ApiError::Status`.
fn ensure_success(response: Response) -> ApiResult<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().unwrap_or_default();
    Err(ApiError::Status { status, body })
}

/// Decode inline base64 content; the API wraps it at 60 columns.
fn decode_inline(entry: &ContentEntry) -> ApiResult<Option<Vec<u8>>> {
    match (&entry.content, entry.encoding.as_deref()) {
        (Some(content), Some("base64")) => {
            let compact: String = content.split_whitespace().collect();
            STANDARD
                .decode(compact)
                .map(Some)
                .map_err(|e| ApiError::Decode(format!("invalid base64 content: {}", e)))
        }
        _ => Ok(None),
    }
}

impl ContentsApi for GitHubClient {
    fn current_user(&self) -> ApiResult<String> {
        let url = self.endpoint(["user"])?;
        let response = ensure_success(self.request(Method::GET, url).send()?)?;
        let user: UserResponse = Self::parse(response)?;
        Ok(user.login)
    }

    fn repo_exists(&self, owner: &str, name: &str) -> ApiResult<bool> {
        let url = self.endpoint(["repos", owner, name])?;
        let response = self.request(Method::GET, url).send()?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        ensure_success(response)?;
        Ok(true)
    }

    fn create_repo(&self, name: &str, private: bool) -> ApiResult<RepositoryHandle> {
        let url = self.endpoint(["user", "repos"])?;
        let body = CreateRepoRequest {
            name,
            private,
            auto_init: false,
        };
        let response = ensure_success(self.request(Method::POST, url).json(&body).send()?)?;
        let repo: CreateRepoResponse = Self::parse(response)?;

        Ok(RepositoryHandle {
            owner: repo.owner.login,
            name: repo.name,
            full_name: repo.full_name,
            created: true,
        })
    }

    fn get_file(
        &self,
        repo: &RepositoryHandle,
        path: &str,
    ) -> ApiResult<Option<RemoteFileRecord>> {
        let mut url = self.contents_url(repo, path)?;
        if let Some(branch) = &self.branch {
            url.query_pairs_mut().append_pair("ref", branch);
        }

        let response = self.request(Method::GET, url).send()?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = ensure_success(response)?;

        let entry = match Self::parse::<ContentsResponse>(response)? {
            ContentsResponse::Entry(entry) if entry.kind == "file" => entry,
            _ => return Err(ApiError::NotAFile(path.to_string())),
        };
        let content = decode_inline(&entry)?;

        Ok(Some(RemoteFileRecord {
            path: path.to_string(),
            sha: entry.sha,
            size: entry.size,
            content,
        }))
    }

    fn put_file(
        &self,
        repo: &RepositoryHandle,
        request: &UploadRequest<'_>,
    ) -> ApiResult<UploadReceipt> {
        let url = self.contents_url(repo, request.path)?;
        let body = PutContentsRequest {
            message: &request.message,
            content: STANDARD.encode(request.content),
            branch: self.branch.as_deref(),
            sha: request.previous_sha,
        };

        let response = ensure_success(self.request(Method::PUT, url).json(&body).send()?)?;
        let created = response.status() == StatusCode::CREATED;
        let result: PutContentsResponse = Self::parse(response)?;

        Ok(UploadReceipt {
            sha: result.content.sha,
            created,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(content: Option<&str>, encoding: Option<&str>) -> ContentEntry {
        ContentEntry {
            kind: "file".to_string(),
            sha: "abc".to_string(),
            size: 0,
            content: content.map(str::to_string),
            encoding: encoding.map(str::to_string),
        }
    }

    #[test]
    fn test_decode_inline_wrapped_base64() {
        // "hello world\n" split across lines like the API does
        let e = entry(Some("aGVsbG8g\nd29ybGQK\n"), Some("base64"));
        assert_eq!(decode_inline(&e).unwrap(), Some(b"hello world\n".to_vec()));
    }

    #[test]
    fn test_decode_inline_without_content() {
        // Files above 1 MB come back with encoding "none" and no content
        let e = entry(Some(""), Some("none"));
        assert_eq!(decode_inline(&e).unwrap(), None);
        let e = entry(None, None);
        assert_eq!(decode_inline(&e).unwrap(), None);
    }

    #[test]
    fn test_decode_inline_empty_file() {
        // 0-byte files are base64 with an empty payload
        let e = entry(Some(""), Some("base64"));
        assert_eq!(decode_inline(&e).unwrap(), Some(Vec::new()));
    }

    #[test]
    fn test_decode_inline_rejects_garbage() {
        let e = entry(Some("@@not base64@@"), Some("base64"));
        assert!(matches!(decode_inline(&e), Err(ApiError::Decode(_))));
    }

    #[test]
    fn test_contents_url_encodes_segments() {
        let client = GitHubClient::with_base_url("t", "https://api.example.com/").unwrap();
        let repo = RepositoryHandle::new("octo", "vault");
        let url = client.contents_url(&repo, "docs/read me.md").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.com/repos/octo/vault/contents/docs/read%20me.md"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client =
            GitHubClient::with_base_url("t", "https://ghe.example.com/api/v3").unwrap();
        let url = client.endpoint(["user", "repos"]).unwrap();
        assert_eq!(url.as_str(), "https://ghe.example.com/api/v3/user/repos");
    }
}
