use crate::error::{GitflowError, Result};
use crate::git::{BranchSummary, CommitRecord};
use chrono::{FixedOffset, TimeZone, Utc};
use git2::build::CheckoutBuilder;
use git2::{BranchType, ErrorCode, Oid, Repository as Git2Repo, Sort, Status, StatusOptions};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

const SECONDS_PER_DAY: i64 = 86_400;

/// Working copy backed by `git2`, with the `git` binary for operations that
/// need the user's credentials, hooks or merge machinery.
pub struct Git2Repository {
    repo: Git2Repo,
    workdir: PathBuf,
}

impl Git2Repository {
    /// Open the repository containing `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let repo = Git2Repo::discover(path).map_err(|e| {
            GitflowError::precondition(format!(
                "not a git repository at {}: {}",
                path.display(),
                e.message()
            ))
        })?;
        let workdir = repo
            .workdir()
            .map(Path::to_path_buf)
            .ok_or_else(|| GitflowError::precondition("bare repositories are not supported"))?;

        Ok(Git2Repository { repo, workdir })
    }

    /// Root of the working tree.
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Run `git <args>` in the working tree and return trimmed stdout.
    fn run_git(&self, args: &[&str]) -> Result<String> {
        debug!(?args, "running git");
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
            let message = if !stderr.is_empty() {
                stderr
            } else if !stdout.is_empty() {
                stdout
            } else {
                output.status.to_string()
            };
            return Err(GitflowError::command(args.join(" "), message));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn branch_tip(&self, name: &str) -> Result<git2::Commit<'_>> {
        let branch = self.repo.find_branch(name, BranchType::Local).map_err(|e| {
            GitflowError::precondition(format!("branch '{}' not found: {}", name, e.message()))
        })?;
        Ok(branch.get().peel_to_commit()?)
    }

    fn resolve_commit(&self, spec: &str) -> Result<Oid> {
        Ok(self.repo.revparse_single(spec)?.peel_to_commit()?.id())
    }

    fn statuses_match(&self, mask: Status) -> Result<bool> {
        let mut options = StatusOptions::new();
        options
            .include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);
        let statuses = self.repo.statuses(Some(&mut options))?;
        Ok(statuses.iter().any(|entry| entry.status().intersects(mask)))
    }
}

fn age_days_since(seconds: i64) -> i64 {
    let elapsed = Utc::now().timestamp() - seconds;
    if elapsed < 0 {
        0
    } else {
        elapsed / SECONDS_PER_DAY
    }
}

/// Committer date in the committer's own timezone, like `git log --format=%cs`.
fn commit_date(time: git2::Time) -> String {
    FixedOffset::east_opt(time.offset_minutes() * 60)
        .and_then(|tz| tz.timestamp_opt(time.seconds(), 0).single())
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

impl super::Repository for Git2Repository {
    fn current_branch(&self) -> Result<String> {
        match self.repo.head() {
            Ok(head) if head.is_branch() => Ok(head.shorthand().unwrap_or("HEAD").to_string()),
            Ok(_) => Ok("HEAD".to_string()),
            Err(e) if e.code() == ErrorCode::UnbornBranch => {
                let head = self.repo.find_reference("HEAD")?;
                let target = head.symbolic_target().unwrap_or("HEAD");
                Ok(target.trim_start_matches("refs/heads/").to_string())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn is_dirty(&self) -> Result<bool> {
        self.statuses_match(!(Status::CURRENT | Status::IGNORED))
    }

    fn fetch(&self, remote: &str) -> Result<()> {
        self.run_git(&["fetch", remote]).map(|_| ())
    }

    fn checkout(&self, branch: &str) -> Result<()> {
        let refname = format!("refs/heads/{}", branch);
        match self.repo.revparse_single(&refname) {
            Ok(target) => {
                self.repo
                    .checkout_tree(&target, Some(CheckoutBuilder::new().safe()))?;
                self.repo.set_head(&refname)?;
            }
            // No local branch: let git create it from a matching remote branch.
            Err(e) if matches!(e.code(), ErrorCode::NotFound | ErrorCode::InvalidSpec) => {
                self.run_git(&["checkout", "-q", branch])?;
            }
            Err(e) => return Err(e.into()),
        }
        debug!(branch, "checked out");
        Ok(())
    }

    fn checkout_new(&self, branch: &str) -> Result<()> {
        let head = self.repo.head()?.peel_to_commit()?;
        self.repo.branch(branch, &head, false)?;
        self.repo.set_head(&format!("refs/heads/{}", branch))?;
        debug!(branch, "created branch");
        Ok(())
    }

    fn pull(&self, remote: &str, branch: &str) -> Result<()> {
        self.run_git(&["pull", remote, branch]).map(|_| ())
    }

    fn rebase(&self, target: &str) -> Result<()> {
        self.run_git(&["rebase", target]).map(|_| ())
    }

    fn merge(&self, target: &str) -> Result<()> {
        self.run_git(&["merge", "--no-edit", target]).map(|_| ())
    }

    fn push(&self, remote: &str, branch: &str, force: bool) -> Result<()> {
        let mut args = vec!["push"];
        if force {
            args.push("--force-with-lease");
        }
        args.extend([remote, branch]);
        self.run_git(&args).map(|_| ())
    }

    fn push_set_upstream(&self, remote: &str, branch: &str) -> Result<()> {
        self.run_git(&["push", "-u", remote, branch]).map(|_| ())
    }

    fn has_remote(&self, remote: &str) -> Result<bool> {
        match self.repo.find_remote(remote) {
            Ok(_) => Ok(true),
            Err(e) if matches!(e.code(), ErrorCode::NotFound | ErrorCode::InvalidSpec) => {
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn list_local_branches(&self, base: &str) -> Result<Vec<BranchSummary>> {
        let current = self.current_branch()?;
        let base_oid = self.branch_tip(base).ok().map(|c| c.id());

        let mut summaries = Vec::new();
        for entry in self.repo.branches(Some(BranchType::Local))? {
            let (branch, _) = entry?;
            let name = match branch.name()? {
                Some(name) => name.to_string(),
                None => continue,
            };
            let tip = branch.get().peel_to_commit()?;

            let (ahead, behind) = match base_oid {
                Some(base_oid) if name != base => self
                    .repo
                    .graph_ahead_behind(tip.id(), base_oid)
                    .unwrap_or((0, 0)),
                _ => (0, 0),
            };

            summaries.push(BranchSummary {
                is_current: name == current,
                age_days: age_days_since(tip.time().seconds()),
                ahead,
                behind,
                last_commit_subject: tip.summary().unwrap_or_default().to_string(),
                author: tip.author().name().unwrap_or_default().to_string(),
                name,
            });
        }

        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(summaries)
    }

    fn merged_branches(&self, base: &str) -> Result<Vec<String>> {
        let base_oid = self.branch_tip(base)?.id();

        let mut merged = Vec::new();
        for entry in self.repo.branches(Some(BranchType::Local))? {
            let (branch, _) = entry?;
            let Some(name) = branch.name()?.map(str::to_string) else {
                continue;
            };
            let tip = branch.get().peel_to_commit()?.id();
            if tip == base_oid || self.repo.graph_descendant_of(base_oid, tip)? {
                merged.push(name);
            }
        }

        merged.sort();
        Ok(merged)
    }

    fn branch_age_days(&self, name: &str) -> Result<i64> {
        let tip = self.branch_tip(name)?;
        Ok(age_days_since(tip.time().seconds()))
    }

    fn delete_branch(&self, name: &str, force: bool) -> Result<()> {
        let flag = if force { "-D" } else { "-d" };
        self.run_git(&["branch", flag, name]).map(|_| ())
    }

    fn delete_remote_branch(&self, remote: &str, name: &str) -> Result<()> {
        self.run_git(&["push", remote, "--delete", name]).map(|_| ())
    }

    fn list_tags(&self) -> Result<Vec<String>> {
        let tags = self.repo.tag_names(None)?;
        let mut names: Vec<String> = tags.iter().flatten().map(str::to_string).collect();
        names.sort();
        Ok(names)
    }

    fn commits_between(&self, from: Option<&str>, to: &str) -> Result<Vec<CommitRecord>> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TIME)?;
        revwalk.push(self.resolve_commit(to)?)?;
        if let Some(from) = from.filter(|f| !f.is_empty()) {
            revwalk.hide(self.resolve_commit(from)?)?;
        }

        let mut commits = Vec::new();
        for oid in revwalk {
            let commit = self.repo.find_commit(oid?)?;
            commits.push(CommitRecord {
                hash: commit.id().to_string(),
                subject: commit.summary().unwrap_or_default().trim().to_string(),
                body: commit.body().unwrap_or_default().trim().to_string(),
                date: commit_date(commit.committer().when()),
            });
        }

        debug!(count = commits.len(), from, to, "collected commits");
        Ok(commits)
    }

    fn create_annotated_tag(&self, tag: &str, message: &str) -> Result<()> {
        match self.repo.find_reference(&format!("refs/tags/{}", tag)) {
            Ok(_) => {
                return Err(GitflowError::precondition(format!(
                    "tag {} already exists",
                    tag
                )))
            }
            Err(e) if e.code() == ErrorCode::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let target = self.repo.head()?.peel(git2::ObjectType::Commit)?;
        let tagger = self.repo.signature()?;
        self.repo.tag(tag, &target, &tagger, message, false)?;
        debug!(tag, "created annotated tag");
        Ok(())
    }

    fn add_all(&self) -> Result<()> {
        self.run_git(&["add", "-A"]).map(|_| ())
    }

    fn has_staged_changes(&self) -> Result<bool> {
        self.statuses_match(
            Status::INDEX_NEW
                | Status::INDEX_MODIFIED
                | Status::INDEX_DELETED
                | Status::INDEX_RENAMED
                | Status::INDEX_TYPECHANGE,
        )
    }

    fn commit(&self, message: &str) -> Result<()> {
        self.run_git(&["commit", "-m", message]).map(|_| ())
    }

    fn has_upstream(&self) -> Result<bool> {
        let current = self.current_branch()?;
        match self.repo.find_branch(&current, BranchType::Local) {
            Ok(branch) => Ok(branch.upstream().is_ok()),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
