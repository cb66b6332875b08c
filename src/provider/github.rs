use super::{
    encode_segment, ApiClient, CreatePrOptions, PrState, Provider, ProviderKind,
    ProviderSettings, PullRequest, Release, ReleaseCreation,
};
use crate::error::{GitflowError, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::json;

const DEFAULT_BASE_URL: &str = "https://api.github.com";

#[derive(Deserialize)]
struct GhRef {
    #[serde(rename = "ref")]
    name: String,
}

#[derive(Deserialize)]
struct GhUser {
    login: String,
}

#[derive(Deserialize)]
struct GhLabel {
    name: String,
}

#[derive(Deserialize)]
struct GhPull {
    number: u64,
    title: String,
    #[serde(default)]
    body: Option<String>,
    state: String,
    html_url: String,
    #[serde(default)]
    draft: bool,
    #[serde(default)]
    user: Option<GhUser>,
    head: GhRef,
    base: GhRef,
    #[serde(default)]
    labels: Vec<GhLabel>,
    #[serde(default)]
    requested_reviewers: Vec<GhUser>,
}

impl From<GhPull> for PullRequest {
    fn from(pr: GhPull) -> Self {
        PullRequest {
            number: pr.number,
            title: pr.title,
            description: pr.body.unwrap_or_default(),
            state: pr.state,
            author: pr.user.map(|u| u.login).unwrap_or_default(),
            head_branch: pr.head.name,
            base_branch: pr.base.name,
            url: pr.html_url,
            draft: pr.draft,
            reviewers: pr.requested_reviewers.into_iter().map(|u| u.login).collect(),
            labels: pr.labels.into_iter().map(|l| l.name).collect(),
        }
    }
}

#[derive(Deserialize)]
struct GhRelease {
    #[serde(default)]
    id: u64,
    tag_name: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    html_url: String,
}

impl From<GhRelease> for Release {
    fn from(release: GhRelease) -> Self {
        Release {
            tag: release.tag_name,
            name: release.name.unwrap_or_default(),
            url: release.html_url,
        }
    }
}

/// GitHub REST v3 client for one repository.
pub struct GitHub {
    api: ApiClient,
    repo_path: String,
}

impl GitHub {
    pub fn new(settings: ProviderSettings) -> Result<Self> {
        let base_url = if settings.base_url.is_empty() {
            DEFAULT_BASE_URL
        } else {
            settings.base_url.as_str()
        };

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", settings.token))
            .map_err(|_| GitflowError::config("provider token contains invalid characters"))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));

        Ok(GitHub {
            api: ApiClient::new(base_url, "github", headers)?,
            repo_path: format!(
                "/repos/{}/{}",
                encode_segment(&settings.owner),
                encode_segment(&settings.repo)
            ),
        })
    }

    fn path(&self, suffix: &str) -> String {
        format!("{}{}", self.repo_path, suffix)
    }
}

impl Provider for GitHub {
    fn kind(&self) -> ProviderKind {
        ProviderKind::GitHub
    }

    fn validate_auth(&self) -> Result<()> {
        self.api.get::<serde_json::Value>(&self.path("")).map(|_| ())
    }

    fn get_default_branch(&self) -> Result<String> {
        #[derive(Deserialize)]
        struct Repo {
            #[serde(default)]
            default_branch: String,
        }

        let repo: Repo = self.api.get(&self.path(""))?;
        if repo.default_branch.trim().is_empty() {
            return Err(GitflowError::provider("default branch missing in response"));
        }
        Ok(repo.default_branch)
    }

    fn create_pr(&self, options: &CreatePrOptions) -> Result<PullRequest> {
        let body = json!({
            "title": options.title,
            "head": options.head_branch,
            "base": options.base_branch,
            "body": options.description,
            "draft": options.draft,
        });
        let created: GhPull = self
            .api
            .json(Method::POST, &self.path("/pulls"), Some(&body))?;
        let mut pr = PullRequest::from(created);

        if !options.reviewers.is_empty() {
            let body = json!({ "reviewers": options.reviewers });
            self.api.send(
                Method::POST,
                &self.path(&format!("/pulls/{}/requested_reviewers", pr.number)),
                Some(&body),
            )?;
            pr.reviewers = options.reviewers.clone();
        }

        if !options.labels.is_empty() {
            let body = json!({ "labels": options.labels });
            self.api.send(
                Method::POST,
                &self.path(&format!("/issues/{}/labels", pr.number)),
                Some(&body),
            )?;
            pr.labels = options.labels.clone();
        }

        Ok(pr)
    }

    fn get_pr(&self, number: u64) -> Result<PullRequest> {
        let pr: GhPull = self.api.get(&self.path(&format!("/pulls/{}", number)))?;
        Ok(pr.into())
    }

    fn list_prs(&self, state: PrState) -> Result<Vec<PullRequest>> {
        let prs: Vec<GhPull> = self
            .api
            .get(&self.path(&format!("/pulls?state={}", state.as_str())))?;
        Ok(prs.into_iter().map(PullRequest::from).collect())
    }

    fn create_release(&self, tag: &str, name: &str, body: &str) -> Result<ReleaseCreation> {
        let payload = json!({ "tag_name": tag, "name": name, "body": body });
        match self
            .api
            .call(Method::POST, &self.path("/releases"), Some(&payload))?
        {
            Ok(response) => {
                let release: GhRelease = response.json()?;
                Ok(ReleaseCreation::Created(release.into()))
            }
            Err(failure)
                if failure.status == StatusCode::UNPROCESSABLE_ENTITY
                    && failure.message.contains("already_exists") =>
            {
                Ok(ReleaseCreation::AlreadyExists)
            }
            Err(failure) => Err(self.api.failure(failure)),
        }
    }

    fn update_release(&self, tag: &str, name: &str, body: &str) -> Result<Release> {
        let existing: GhRelease = self
            .api
            .get(&self.path(&format!("/releases/tags/{}", encode_segment(tag))))?;
        if existing.id == 0 {
            return Err(GitflowError::provider(format!(
                "release not found for tag {}",
                tag
            )));
        }

        let payload = json!({ "tag_name": tag, "name": name, "body": body });
        let updated: GhRelease = self.api.json(
            Method::PATCH,
            &self.path(&format!("/releases/{}", existing.id)),
            Some(&payload),
        )?;
        Ok(updated.into())
    }
}
