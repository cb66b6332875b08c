//! Version-control adapter
//!
//! The workflows only talk to git through the [Repository] trait, so they can
//! run against a real working copy or an in-memory double.
//!
//! - [repository::Git2Repository]: reads through `git2`, network and
//!   history-rewriting operations through the `git` binary
//! - [mock::MockRepository]: scripted state with a call log, for tests
//!
//! ```rust
//! # use gitflow::git::Repository;
//! # fn example<R: Repository>(repo: &R) -> gitflow::Result<()> {
//! if repo.is_dirty()? {
//!     println!("commit or stash first");
//! }
//! let tags = repo.list_tags()?;
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod repository;

pub use mock::MockRepository;
pub use repository::Git2Repository;

use crate::error::Result;

/// One commit reachable from the target reference but not from the base.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommitRecord {
    pub hash: String,
    pub subject: String,
    pub body: String,
    /// Committer date as `YYYY-MM-DD`.
    pub date: String,
}

/// One local branch, measured against a base branch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BranchSummary {
    pub name: String,
    pub is_current: bool,
    pub age_days: i64,
    /// Commits on this branch that the base does not have.
    pub ahead: usize,
    /// Commits on the base that this branch does not have.
    pub behind: usize,
    pub last_commit_subject: String,
    pub author: String,
}

/// Git operations used by the workflows.
///
/// Every call either succeeds or fails with an adapter error; callers never
/// see raw process output.
pub trait Repository {
    /// Name of the checked-out branch.
    fn current_branch(&self) -> Result<String>;

    /// True when the working tree has staged, unstaged or untracked changes.
    fn is_dirty(&self) -> Result<bool>;

    fn fetch(&self, remote: &str) -> Result<()>;

    fn checkout(&self, branch: &str) -> Result<()>;

    /// Create `branch` at HEAD and switch to it.
    fn checkout_new(&self, branch: &str) -> Result<()>;

    fn pull(&self, remote: &str, branch: &str) -> Result<()>;

    /// Replay the current branch onto `target`. Conflicts are errors.
    fn rebase(&self, target: &str) -> Result<()>;

    /// Merge `target` into the current branch. Conflicts are errors.
    fn merge(&self, target: &str) -> Result<()>;

    /// Push `branch`; `force` uses `--force-with-lease`.
    fn push(&self, remote: &str, branch: &str, force: bool) -> Result<()>;

    fn push_set_upstream(&self, remote: &str, branch: &str) -> Result<()>;

    fn has_remote(&self, remote: &str) -> Result<bool>;

    /// Every local branch with age and ahead/behind counts relative to `base`.
    fn list_local_branches(&self, base: &str) -> Result<Vec<BranchSummary>>;

    /// Local branches whose tip is reachable from `base`.
    fn merged_branches(&self, base: &str) -> Result<Vec<String>>;

    /// Whole days since the last commit on `name`.
    fn branch_age_days(&self, name: &str) -> Result<i64>;

    /// Delete a local branch. Without `force`, unmerged work makes this fail.
    fn delete_branch(&self, name: &str, force: bool) -> Result<()>;

    fn delete_remote_branch(&self, remote: &str, name: &str) -> Result<()>;

    fn list_tags(&self) -> Result<Vec<String>>;

    /// Commits in `from..to`, newest first. `from = None` walks the whole history.
    fn commits_between(&self, from: Option<&str>, to: &str) -> Result<Vec<CommitRecord>>;

    /// Create an annotated tag at HEAD; fails if the tag already exists.
    fn create_annotated_tag(&self, tag: &str, message: &str) -> Result<()>;

    /// Stage every change in the working tree.
    fn add_all(&self) -> Result<()>;

    fn has_staged_changes(&self) -> Result<bool>;

    fn commit(&self, message: &str) -> Result<()>;

    /// True when the current branch tracks a remote branch.
    fn has_upstream(&self) -> Result<bool>;
}
