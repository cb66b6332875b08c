use crate::config::Config;
use crate::domain::BranchKind;
use crate::error::{GitflowError, Result};
use crate::git::Repository;
use crate::workflow::{ensure_clean, ensure_remote, remote_or_default};
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartOptions {
    pub kind: BranchKind,
    /// Free text; slugified into the branch name.
    pub name: String,
    /// Empty means `origin`.
    pub remote: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartResult {
    pub base_branch: String,
    pub new_branch: String,
    pub pushed: bool,
}

/// Create a work branch from the freshly pulled base branch.
pub fn start(repo: &dyn Repository, cfg: &Config, opts: &StartOptions) -> Result<StartResult> {
    if opts.name.trim().is_empty() {
        return Err(GitflowError::precondition("branch name is required"));
    }
    let remote = remote_or_default(&opts.remote);

    ensure_clean(repo)?;
    let base_branch = cfg.base_branch();
    ensure_remote(repo, remote)?;

    let start_cfg = &cfg.workflows.start;
    if start_cfg.fetch_first {
        repo.fetch(remote)?;
    }
    repo.pull(remote, &base_branch)?;

    let new_branch = opts.kind.branch_name(&cfg.branches, &opts.name);
    repo.checkout_new(&new_branch)?;
    info!(branch = %new_branch, base = %base_branch, "created work branch");

    let pushed = if start_cfg.auto_push {
        repo.push_set_upstream(remote, &new_branch)?;
        true
    } else {
        false
    };

    Ok(StartResult {
        base_branch,
        new_branch,
        pushed,
    })
}
