//! Hosting provider integrations
//!
//! One [Provider] trait covers what the pull request and release publishing
//! commands need; [new] picks the implementation named by `provider.type`.
//! All requests are blocking with a single [REQUEST_TIMEOUT] and no retries.

pub mod github;
pub mod gitlab;

pub use github::GitHub;
pub use gitlab::GitLab;

use crate::config::{Config, ProviderConfig};
use crate::error::{GitflowError, Result};
use reqwest::blocking::{Client, Response};
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// Timeout applied to every provider request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

const USER_AGENT: &str = concat!("gitflow/", env!("CARGO_PKG_VERSION"));

/// Supported hosting providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    GitHub,
    GitLab,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::GitHub => "github",
            ProviderKind::GitLab => "gitlab",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = GitflowError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "github" => Ok(ProviderKind::GitHub),
            "gitlab" => Ok(ProviderKind::GitLab),
            "" => Err(GitflowError::config("provider is not configured")),
            other => Err(GitflowError::config(format!(
                "unsupported provider type: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection settings resolved from configuration and the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    /// Empty means the public API of the provider.
    pub base_url: String,
    pub token: String,
    pub owner: String,
    pub repo: String,
}

impl ProviderSettings {
    /// Resolve settings, reading the token from the process environment.
    pub fn from_config(cfg: &ProviderConfig) -> Result<Self> {
        Self::from_config_with(cfg, |name| std::env::var(name).ok())
    }

    /// Resolve settings with `lookup` standing in for the environment.
    pub fn from_config_with<F>(cfg: &ProviderConfig, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let kind: ProviderKind = cfg.kind.parse()?;

        let token = if cfg.token_env.is_empty() {
            None
        } else {
            lookup(&cfg.token_env).filter(|t| !t.trim().is_empty())
        };
        let token = token.ok_or_else(|| {
            GitflowError::config(format!(
                "provider token missing, set env var {}",
                cfg.token_env
            ))
        })?;

        if cfg.owner.trim().is_empty() {
            return Err(GitflowError::config("provider owner is required"));
        }
        if cfg.repo.trim().is_empty() {
            return Err(GitflowError::config("provider repo is required"));
        }

        Ok(ProviderSettings {
            kind,
            base_url: cfg.base_url.trim().to_string(),
            token,
            owner: cfg.owner.trim().to_string(),
            repo: cfg.repo.trim().to_string(),
        })
    }
}

/// A pull request (GitHub) or merge request (GitLab).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub description: String,
    pub state: String,
    pub author: String,
    pub head_branch: String,
    pub base_branch: String,
    pub url: String,
    pub draft: bool,
    pub reviewers: Vec<String>,
    pub labels: Vec<String>,
}

/// A published release.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Release {
    pub tag: String,
    pub name: String,
    pub url: String,
}

/// Outcome of asking a provider to create a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseCreation {
    Created(Release),
    /// A release for the tag is already published
    AlreadyExists,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreatePrOptions {
    pub title: String,
    pub description: String,
    pub head_branch: String,
    pub base_branch: String,
    pub draft: bool,
    pub reviewers: Vec<String>,
    pub labels: Vec<String>,
}

/// Pull request state filter for listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PrState {
    #[default]
    Open,
    Closed,
    All,
}

impl PrState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrState::Open => "open",
            PrState::Closed => "closed",
            PrState::All => "all",
        }
    }
}

impl FromStr for PrState {
    type Err = GitflowError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "" | "open" => Ok(PrState::Open),
            "closed" => Ok(PrState::Closed),
            "all" => Ok(PrState::All),
            other => Err(GitflowError::config(format!(
                "unsupported pull request state: {}",
                other
            ))),
        }
    }
}

/// Operations a hosting provider supports, bound to one configured project.
pub trait Provider {
    fn kind(&self) -> ProviderKind;

    /// Check that the token can read the configured project.
    fn validate_auth(&self) -> Result<()>;

    fn get_default_branch(&self) -> Result<String>;

    fn create_pr(&self, options: &CreatePrOptions) -> Result<PullRequest>;

    fn get_pr(&self, number: u64) -> Result<PullRequest>;

    fn list_prs(&self, state: PrState) -> Result<Vec<PullRequest>>;

    fn create_release(&self, tag: &str, name: &str, body: &str) -> Result<ReleaseCreation>;

    /// Replace name and notes of the release published for `tag`.
    fn update_release(&self, tag: &str, name: &str, body: &str) -> Result<Release>;
}

/// Build the provider configured in `config.provider`.
pub fn new(config: &Config) -> Result<Box<dyn Provider>> {
    from_settings(ProviderSettings::from_config(&config.provider)?)
}

/// Build a provider from resolved settings.
pub fn from_settings(settings: ProviderSettings) -> Result<Box<dyn Provider>> {
    match settings.kind {
        ProviderKind::GitHub => Ok(Box::new(GitHub::new(settings)?)),
        ProviderKind::GitLab => Ok(Box::new(GitLab::new(settings)?)),
    }
}

/// Non-success response from a provider API.
#[derive(Debug)]
pub(crate) struct ApiFailure {
    pub status: StatusCode,
    pub message: String,
}

/// JSON-over-HTTP plumbing shared by the provider clients.
pub(crate) struct ApiClient {
    http: Client,
    base_url: String,
    name: &'static str,
}

impl ApiClient {
    pub(crate) fn new(base_url: &str, name: &'static str, headers: HeaderMap) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;
        Ok(ApiClient {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            name,
        })
    }

    /// Send a request; transport errors are `Err`, API errors are `Ok(Err(_))`.
    pub(crate) fn call<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<std::result::Result<Response, ApiFailure>> {
        let url = format!("{}{}", self.base_url, path);
        debug!(provider = self.name, %method, %url, "provider request");

        let mut request = self.http.request(method, &url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send()?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            let text = response.text().unwrap_or_default();
            let message = if text.trim().is_empty() {
                status.to_string()
            } else {
                text.trim().to_string()
            };
            return Ok(Err(ApiFailure { status, message }));
        }
        Ok(Ok(response))
    }

    pub(crate) fn failure(&self, failure: ApiFailure) -> GitflowError {
        GitflowError::provider(format!(
            "{} api error ({}): {}",
            self.name,
            failure.status.as_u16(),
            failure.message
        ))
    }

    /// Send a request and decode the JSON response.
    pub(crate) fn json<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        match self.call(method, path, body)? {
            Ok(response) => Ok(response.json()?),
            Err(failure) => Err(self.failure(failure)),
        }
    }

    pub(crate) fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.json::<(), T>(Method::GET, path, None)
    }

    /// Send a request whose response body is not needed.
    pub(crate) fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<()> {
        match self.call(method, path, body)? {
            Ok(_) => Ok(()),
            Err(failure) => Err(self.failure(failure)),
        }
    }
}

/// Percent-encode one URL path segment (`group/project` -> `group%2Fproject`).
pub(crate) fn encode_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}
