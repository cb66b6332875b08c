use super::{
    encode_segment, ApiClient, CreatePrOptions, PrState, Provider, ProviderKind,
    ProviderSettings, PullRequest, Release, ReleaseCreation,
};
use crate::error::{GitflowError, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::json;

const DEFAULT_BASE_URL: &str = "https://gitlab.com/api/v4";

#[derive(Deserialize)]
struct GlUser {
    #[serde(default)]
    id: u64,
    #[serde(default)]
    username: String,
}

#[derive(Deserialize)]
struct GlMergeRequest {
    iid: u64,
    title: String,
    #[serde(default)]
    description: Option<String>,
    state: String,
    web_url: String,
    #[serde(default)]
    draft: bool,
    #[serde(default)]
    work_in_progress: bool,
    #[serde(default)]
    author: Option<GlUser>,
    source_branch: String,
    target_branch: String,
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default)]
    reviewers: Vec<GlUser>,
}

impl From<GlMergeRequest> for PullRequest {
    fn from(mr: GlMergeRequest) -> Self {
        PullRequest {
            number: mr.iid,
            title: mr.title,
            description: mr.description.unwrap_or_default(),
            state: mr.state,
            author: mr.author.map(|a| a.username).unwrap_or_default(),
            head_branch: mr.source_branch,
            base_branch: mr.target_branch,
            url: mr.web_url,
            draft: mr.draft || mr.work_in_progress,
            reviewers: mr.reviewers.into_iter().map(|r| r.username).collect(),
            labels: mr.labels,
        }
    }
}

#[derive(Deserialize, Default)]
struct GlLinks {
    #[serde(rename = "self", default)]
    self_url: String,
}

#[derive(Deserialize)]
struct GlRelease {
    tag_name: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "_links", default)]
    links: GlLinks,
}

impl From<GlRelease> for Release {
    fn from(release: GlRelease) -> Self {
        Release {
            tag: release.tag_name,
            name: release.name.unwrap_or_default(),
            url: release.links.self_url,
        }
    }
}

/// GitLab REST v4 client for one project.
pub struct GitLab {
    api: ApiClient,
    project_path: String,
}

impl GitLab {
    pub fn new(settings: ProviderSettings) -> Result<Self> {
        let base_url = if settings.base_url.is_empty() {
            DEFAULT_BASE_URL
        } else {
            settings.base_url.as_str()
        };

        let mut token = HeaderValue::from_str(&settings.token)
            .map_err(|_| GitflowError::config("provider token contains invalid characters"))?;
        token.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert("PRIVATE-TOKEN", token);

        let project = format!("{}/{}", settings.owner, settings.repo);
        Ok(GitLab {
            api: ApiClient::new(base_url, "gitlab", headers)?,
            project_path: format!("/projects/{}", encode_segment(&project)),
        })
    }

    fn path(&self, suffix: &str) -> String {
        format!("{}{}", self.project_path, suffix)
    }

    /// Numeric user ids for reviewer usernames.
    fn reviewer_ids(&self, usernames: &[String]) -> Result<Vec<u64>> {
        usernames
            .iter()
            .map(|username| {
                let users: Vec<GlUser> = self
                    .api
                    .get(&format!("/users?username={}", encode_segment(username)))?;
                users
                    .first()
                    .map(|u| u.id)
                    .ok_or_else(|| GitflowError::provider(format!("unknown gitlab user {}", username)))
            })
            .collect()
    }
}

fn mr_state(state: PrState) -> &'static str {
    match state {
        PrState::Open => "opened",
        PrState::Closed => "closed",
        PrState::All => "all",
    }
}

impl Provider for GitLab {
    fn kind(&self) -> ProviderKind {
        ProviderKind::GitLab
    }

    fn validate_auth(&self) -> Result<()> {
        self.api.get::<serde_json::Value>(&self.path("")).map(|_| ())
    }

    fn get_default_branch(&self) -> Result<String> {
        #[derive(Deserialize)]
        struct Project {
            #[serde(default)]
            default_branch: Option<String>,
        }

        let project: Project = self.api.get(&self.path(""))?;
        project
            .default_branch
            .filter(|b| !b.trim().is_empty())
            .ok_or_else(|| GitflowError::provider("default branch missing in response"))
    }

    fn create_pr(&self, options: &CreatePrOptions) -> Result<PullRequest> {
        let title = if options.draft {
            format!("Draft: {}", options.title)
        } else {
            options.title.clone()
        };
        let body = json!({
            "source_branch": options.head_branch,
            "target_branch": options.base_branch,
            "title": title,
            "description": options.description,
            "labels": options.labels.join(","),
            "reviewer_ids": self.reviewer_ids(&options.reviewers)?,
        });

        let created: GlMergeRequest =
            self.api
                .json(Method::POST, &self.path("/merge_requests"), Some(&body))?;
        Ok(created.into())
    }

    fn get_pr(&self, number: u64) -> Result<PullRequest> {
        let mr: GlMergeRequest = self
            .api
            .get(&self.path(&format!("/merge_requests/{}", number)))?;
        Ok(mr.into())
    }

    fn list_prs(&self, state: PrState) -> Result<Vec<PullRequest>> {
        let mrs: Vec<GlMergeRequest> = self
            .api
            .get(&self.path(&format!("/merge_requests?state={}", mr_state(state))))?;
        Ok(mrs.into_iter().map(PullRequest::from).collect())
    }

    fn create_release(&self, tag: &str, name: &str, body: &str) -> Result<ReleaseCreation> {
        let payload = json!({ "tag_name": tag, "name": name, "description": body });
        match self
            .api
            .call(Method::POST, &self.path("/releases"), Some(&payload))?
        {
            Ok(response) => {
                let release: GlRelease = response.json()?;
                Ok(ReleaseCreation::Created(release.into()))
            }
            Err(failure)
                if failure.status == StatusCode::CONFLICT
                    || failure.message.contains("already exists") =>
            {
                Ok(ReleaseCreation::AlreadyExists)
            }
            Err(failure) => Err(self.api.failure(failure)),
        }
    }

    fn update_release(&self, tag: &str, name: &str, body: &str) -> Result<Release> {
        let payload = json!({ "name": name, "description": body });
        let updated: GlRelease = self.api.json(
            Method::PUT,
            &self.path(&format!("/releases/{}", encode_segment(tag))),
            Some(&payload),
        )?;
        Ok(updated.into())
    }
}
