use crate::config::Config;
use crate::domain::title_from_branch;
use crate::error::{GitflowError, Result};
use crate::git::Repository;
use crate::provider::{CreatePrOptions, PrState, Provider, PullRequest};
use crate::workflow::{ensure_clean, ensure_remote, remote_or_default};
use tracing::info;

/// Command-line values for `pr create`; unset fields fall back to `workflows.pr`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrCreateOptions {
    /// Empty means `origin`.
    pub remote: String,
    /// Empty means a title derived from the branch name.
    pub title: String,
    pub description: String,
    /// Empty means the configured base branch.
    pub base_branch: String,
    pub draft: Option<bool>,
    pub reviewers: Option<Vec<String>>,
    pub labels: Option<Vec<String>>,
}

/// Open a pull request for the current branch, pushing it first if it has no
/// upstream.
pub fn create_pr(
    repo: &dyn Repository,
    cfg: &Config,
    provider: &dyn Provider,
    opts: &PrCreateOptions,
) -> Result<PullRequest> {
    ensure_clean(repo)?;

    let base_branch = match opts.base_branch.trim() {
        "" => cfg.base_branch(),
        base => base.to_string(),
    };
    let current = repo.current_branch()?;
    if current == base_branch {
        return Err(GitflowError::precondition(format!(
            "current branch is base branch {}",
            base_branch
        )));
    }

    let remote = remote_or_default(&opts.remote);
    ensure_remote(repo, remote)?;
    if !repo.has_upstream()? {
        repo.push_set_upstream(remote, &current)?;
    }

    let title = match opts.title.trim() {
        "" => title_from_branch(&current, &cfg.branches),
        title => title.to_string(),
    };
    let pr_cfg = &cfg.workflows.pr;
    let request = CreatePrOptions {
        title,
        description: opts.description.clone(),
        head_branch: current,
        base_branch,
        draft: opts.draft.unwrap_or(pr_cfg.draft),
        reviewers: opts
            .reviewers
            .clone()
            .unwrap_or_else(|| pr_cfg.default_reviewers.clone()),
        labels: opts.labels.clone().unwrap_or_else(|| pr_cfg.labels.clone()),
    };

    let pr = provider.create_pr(&request)?;
    info!(number = pr.number, url = %pr.url, "pull request created");
    Ok(pr)
}

pub fn view_pr(provider: &dyn Provider, number: u64) -> Result<PullRequest> {
    provider.get_pr(number)
}

pub fn list_prs(provider: &dyn Provider, state: PrState) -> Result<Vec<PullRequest>> {
    provider.list_prs(state)
}
