//! GitHub API client
//!
//! A thin read-only client over the REST and GraphQL APIs. Requests are
//! blocking; parallelism, where needed, comes from the caller's worker pool.

pub mod graphql;
pub mod rest;

use log::warn;
use reqwest::blocking::{Client as HttpClient, RequestBuilder};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use thiserror::Error;

const API_ROOT: &str = "https://api.github.com";
const TOKEN_ENV_VARS: [&str; 2] = ["GITHUB_API_TOKEN", "GITHUB_ACCESS_TOKEN"];
const TOKEN_GIT_CONFIG_KEY: &str = "user.accesstoken";

/// Result type for GitHub API operations
pub type GithubResult<T> = Result<T, GithubError>;

/// Error types for GitHub API operations
#[derive(Error, Debug)]
pub enum GithubError {
    /// Transport or TLS failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from the API
    #[error("GitHub API returned {status} for {url}")]
    Status { status: u16, url: String },

    /// GraphQL-level errors reported in the response body
    #[error("GitHub API error: {message}")]
    Api { message: String },

    /// The content API refuses blobs above its size limit
    #[error("{path}: too large; skipping")]
    BlobTooLarge { path: String },

    /// Response body did not match the expected shape
    #[error("Unexpected API response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Base64 blob content that does not decode
    #[error("Invalid blob content encoding: {0}")]
    BlobEncoding(#[from] base64::DecodeError),

    /// Operations that need authentication, without a token
    #[error("No GitHub token found: set GITHUB_API_TOKEN or `git config user.accesstoken`")]
    MissingToken,
}

/// Read-only GitHub API client
pub struct Client {
    http: HttpClient,
    token: Option<String>,
    api_root: String,
}

impl Client {
    /// Create a client with an explicit token (or none)
    pub fn new(token: Option<String>) -> GithubResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("coursekit/", env!("CARGO_PKG_VERSION"))),
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        let http = HttpClient::builder().default_headers(headers).build()?;
        Ok(Self {
            http,
            token,
            api_root: API_ROOT.to_string(),
        })
    }

    /// Create a client using the discovered token. API calls work without a
    /// token but are heavily rate-limited, so the absence is warned about.
    pub fn from_environment() -> GithubResult<Self> {
        let token = discover_token();
        if token.is_none() {
            warn!("No GitHub token is configured. API calls are rate-limited.");
        }
        Self::new(token)
    }

    /// The configured token, or an error for operations that require one
    pub fn require_token(&self) -> GithubResult<&str> {
        self.token.as_deref().ok_or(GithubError::MissingToken)
    }

    /// Override the API root (used by tests)
    pub fn with_api_root(mut self, api_root: &str) -> Self {
        self.api_root = api_root.trim_end_matches('/').to_string();
        self
    }

    pub(crate) fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.api_root, path.trim_start_matches('/'))
    }

    pub(crate) fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.header(AUTHORIZATION, format!("Bearer {}", token)),
            None => request,
        }
    }

    pub(crate) fn http(&self) -> &HttpClient {
        &self.http
    }
}

/// Token discovery: environment variables first, then git configuration.
pub fn discover_token() -> Option<String> {
    for var in TOKEN_ENV_VARS {
        if let Ok(token) = std::env::var(var) {
            let token = token.trim().to_string();
            if !token.is_empty() {
                return Some(token);
            }
        }
    }
    git_config_token()
}

fn git_config_token() -> Option<String> {
    let config = git2::Config::open_default().ok()?;
    let token = config.get_string(TOKEN_GIT_CONFIG_KEY).ok()?;
    let token = token.trim().to_string();
    (!token.is_empty()).then_some(token)
}
