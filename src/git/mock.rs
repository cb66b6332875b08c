use crate::error::{GitflowError, Result};
use crate::git::{BranchSummary, CommitRecord, Repository};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

/// In-memory repository for testing workflows without a working copy.
///
/// Mutating calls are recorded in git's own command syntax (`"push -u origin x"`)
/// and can be made to fail with [`MockRepository::fail_on`].
pub struct MockRepository {
    current: RefCell<String>,
    dirty: Cell<bool>,
    staged: Cell<bool>,
    upstream: Cell<bool>,
    remotes: Vec<String>,
    branches: RefCell<Vec<BranchSummary>>,
    merged: HashSet<String>,
    age_failures: HashSet<String>,
    tags: RefCell<Vec<String>>,
    commits: Vec<CommitRecord>,
    failures: HashMap<String, String>,
    calls: RefCell<Vec<String>>,
}

impl MockRepository {
    /// Create a clean repository on `main` with an `origin` remote
    pub fn new() -> Self {
        MockRepository {
            current: RefCell::new("main".to_string()),
            dirty: Cell::new(false),
            staged: Cell::new(false),
            upstream: Cell::new(false),
            remotes: vec!["origin".to_string()],
            branches: RefCell::new(vec![BranchSummary {
                name: "main".to_string(),
                ..BranchSummary::default()
            }]),
            merged: HashSet::new(),
            age_failures: HashSet::new(),
            tags: RefCell::new(Vec::new()),
            commits: Vec::new(),
            failures: HashMap::new(),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn set_current_branch(&mut self, branch: impl Into<String>) {
        let branch = branch.into();
        if !self.branches.borrow().iter().any(|b| b.name == branch) {
            self.add_branch(branch.clone(), 0);
        }
        *self.current.borrow_mut() = branch;
    }

    pub fn set_dirty(&mut self, dirty: bool) {
        self.dirty.set(dirty);
    }

    pub fn set_staged(&mut self, staged: bool) {
        self.staged.set(staged);
    }

    pub fn set_upstream(&mut self, upstream: bool) {
        self.upstream.set(upstream);
    }

    pub fn clear_remotes(&mut self) {
        self.remotes.clear();
    }

    /// Add a local branch whose last commit is `age_days` old
    pub fn add_branch(&mut self, name: impl Into<String>, age_days: i64) {
        self.add_branch_summary(BranchSummary {
            name: name.into(),
            age_days,
            ..BranchSummary::default()
        });
    }

    pub fn add_branch_summary(&mut self, summary: BranchSummary) {
        let mut branches = self.branches.borrow_mut();
        branches.retain(|b| b.name != summary.name);
        branches.push(summary);
    }

    /// Report `name` as merged into the base branch
    pub fn mark_merged(&mut self, name: impl Into<String>) {
        self.merged.insert(name.into());
    }

    /// Make `branch_age_days` fail for `name`
    pub fn fail_age_lookup(&mut self, name: impl Into<String>) {
        self.age_failures.insert(name.into());
    }

    pub fn add_tag(&mut self, name: impl Into<String>) {
        self.tags.borrow_mut().push(name.into());
    }

    /// Add a commit to the log; commits are returned in insertion order (newest first)
    pub fn add_commit(&mut self, subject: &str, body: &str, date: &str) {
        let hash = format!("{:040x}", self.commits.len() + 1);
        self.commits.push(CommitRecord {
            hash,
            subject: subject.to_string(),
            body: body.to_string(),
            date: date.to_string(),
        });
    }

    /// Fail every call whose recorded form starts with `prefix`
    pub fn fail_on(&mut self, prefix: impl Into<String>, message: impl Into<String>) {
        self.failures.insert(prefix.into(), message.into());
    }

    /// Mutating calls made so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn branch_names(&self) -> Vec<String> {
        self.branches.borrow().iter().map(|b| b.name.clone()).collect()
    }

    fn record(&self, call: String) -> Result<()> {
        let failure = self
            .failures
            .iter()
            .find(|(prefix, _)| call.starts_with(prefix.as_str()))
            .map(|(_, message)| message.clone());
        self.calls.borrow_mut().push(call.clone());
        match failure {
            Some(message) => Err(GitflowError::command(call, message)),
            None => Ok(()),
        }
    }

    fn has_branch(&self, name: &str) -> bool {
        self.branches.borrow().iter().any(|b| b.name == name)
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl Repository for MockRepository {
    fn current_branch(&self) -> Result<String> {
        Ok(self.current.borrow().clone())
    }

    fn is_dirty(&self) -> Result<bool> {
        Ok(self.dirty.get())
    }

    fn fetch(&self, remote: &str) -> Result<()> {
        self.record(format!("fetch {}", remote))
    }

    fn checkout(&self, branch: &str) -> Result<()> {
        self.record(format!("checkout {}", branch))?;
        if !self.has_branch(branch) {
            return Err(GitflowError::precondition(format!(
                "branch '{}' not found",
                branch
            )));
        }
        *self.current.borrow_mut() = branch.to_string();
        Ok(())
    }

    fn checkout_new(&self, branch: &str) -> Result<()> {
        self.record(format!("checkout -b {}", branch))?;
        if self.has_branch(branch) {
            return Err(GitflowError::command(
                format!("checkout -b {}", branch),
                format!("a branch named '{}' already exists", branch),
            ));
        }
        self.branches.borrow_mut().push(BranchSummary {
            name: branch.to_string(),
            ..BranchSummary::default()
        });
        *self.current.borrow_mut() = branch.to_string();
        Ok(())
    }

    fn pull(&self, remote: &str, branch: &str) -> Result<()> {
        self.record(format!("pull {} {}", remote, branch))
    }

    fn rebase(&self, target: &str) -> Result<()> {
        self.record(format!("rebase {}", target))
    }

    fn merge(&self, target: &str) -> Result<()> {
        self.record(format!("merge {}", target))
    }

    fn push(&self, remote: &str, branch: &str, force: bool) -> Result<()> {
        if force {
            self.record(format!("push --force-with-lease {} {}", remote, branch))
        } else {
            self.record(format!("push {} {}", remote, branch))
        }
    }

    fn push_set_upstream(&self, remote: &str, branch: &str) -> Result<()> {
        self.record(format!("push -u {} {}", remote, branch))?;
        self.upstream.set(true);
        Ok(())
    }

    fn has_remote(&self, remote: &str) -> Result<bool> {
        Ok(self.remotes.iter().any(|r| r == remote))
    }

    fn list_local_branches(&self, _base: &str) -> Result<Vec<BranchSummary>> {
        let current = self.current.borrow();
        let mut branches: Vec<BranchSummary> = self
            .branches
            .borrow()
            .iter()
            .cloned()
            .map(|mut b| {
                b.is_current = b.name == *current;
                b
            })
            .collect();
        branches.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(branches)
    }

    fn merged_branches(&self, base: &str) -> Result<Vec<String>> {
        let mut merged: Vec<String> = self.merged.iter().cloned().collect();
        if self.has_branch(base) && !merged.iter().any(|m| m == base) {
            merged.push(base.to_string());
        }
        merged.sort();
        Ok(merged)
    }

    fn branch_age_days(&self, name: &str) -> Result<i64> {
        if self.age_failures.contains(name) {
            return Err(GitflowError::command(
                format!("log -1 {}", name),
                "bad revision",
            ));
        }
        self.branches
            .borrow()
            .iter()
            .find(|b| b.name == name)
            .map(|b| b.age_days)
            .ok_or_else(|| GitflowError::precondition(format!("branch '{}' not found", name)))
    }

    fn delete_branch(&self, name: &str, force: bool) -> Result<()> {
        let flag = if force { "-D" } else { "-d" };
        self.record(format!("branch {} {}", flag, name))?;
        self.branches.borrow_mut().retain(|b| b.name != name);
        Ok(())
    }

    fn delete_remote_branch(&self, remote: &str, name: &str) -> Result<()> {
        self.record(format!("push {} --delete {}", remote, name))
    }

    fn list_tags(&self) -> Result<Vec<String>> {
        Ok(self.tags.borrow().clone())
    }

    fn commits_between(&self, _from: Option<&str>, _to: &str) -> Result<Vec<CommitRecord>> {
        Ok(self.commits.clone())
    }

    fn create_annotated_tag(&self, tag: &str, _message: &str) -> Result<()> {
        if self.tags.borrow().iter().any(|t| t == tag) {
            return Err(GitflowError::precondition(format!(
                "tag {} already exists",
                tag
            )));
        }
        self.record(format!("tag -a {}", tag))?;
        self.tags.borrow_mut().push(tag.to_string());
        Ok(())
    }

    fn add_all(&self) -> Result<()> {
        self.record("add -A".to_string())?;
        if self.dirty.get() {
            self.staged.set(true);
        }
        Ok(())
    }

    fn has_staged_changes(&self) -> Result<bool> {
        Ok(self.staged.get())
    }

    fn commit(&self, message: &str) -> Result<()> {
        self.record(format!("commit -m {}", message))?;
        self.staged.set(false);
        self.dirty.set(false);
        Ok(())
    }

    fn has_upstream(&self) -> Result<bool> {
        Ok(self.upstream.get())
    }
}
