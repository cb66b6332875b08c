//! Branch cleanup
//!
//! [plan] is the pure decision step: every local branch gets exactly one
//! [CleanupReason], and only `merged` and `stale` branches are deletable.
//! [prepare] gathers the inputs from a repository and [execute] carries out
//! the deletions. There is no rollback: once deletion starts, branches removed
//! before a failure stay removed.

use crate::config::Config;
use crate::error::Result;
use crate::git::{BranchSummary, Repository};
use crate::notice::Notice;
use crate::workflow::{ensure_clean, ensure_remote, remote_or_default};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, info, warn};

/// Why a branch is or is not deleted. Variant order is the display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CleanupReason {
    Protected,
    Current,
    Merged,
    NotMerged,
    Stale,
    Recent,
}

impl CleanupReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CleanupReason::Protected => "protected",
            CleanupReason::Current => "current",
            CleanupReason::Merged => "merged",
            CleanupReason::NotMerged => "not merged",
            CleanupReason::Stale => "stale",
            CleanupReason::Recent => "recent",
        }
    }

    pub fn is_deletable(&self) -> bool {
        matches!(self, CleanupReason::Merged | CleanupReason::Stale)
    }
}

impl fmt::Display for CleanupReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupCandidate {
    pub name: String,
    pub reason: CleanupReason,
    pub age_days: i64,
    pub ahead: usize,
    pub behind: usize,
    pub will_delete: bool,
}

/// Inputs of the cleanup decision besides the branches themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupPolicy {
    pub base_branch: String,
    pub current_branch: String,
    pub protected: Vec<String>,
    /// Zero or less disables the age test.
    pub age_threshold_days: i64,
    pub merged_only: bool,
}

impl CleanupPolicy {
    fn reason_for(&self, branch: &BranchSummary, merged: &HashSet<&str>) -> CleanupReason {
        let name = branch.name.as_str();
        if name == self.base_branch || self.protected.iter().any(|p| p == name) {
            CleanupReason::Protected
        } else if name == self.current_branch {
            CleanupReason::Current
        } else if merged.contains(name) {
            CleanupReason::Merged
        } else if self.merged_only {
            CleanupReason::NotMerged
        } else if self.age_threshold_days > 0 && branch.age_days >= self.age_threshold_days {
            CleanupReason::Stale
        } else {
            CleanupReason::Recent
        }
    }
}

/// Every local branch with its verdict, sorted by reason, then oldest first,
/// then name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupPlan {
    pub candidates: Vec<CleanupCandidate>,
}

impl CleanupPlan {
    /// Candidates marked for deletion, in plan order.
    pub fn deletable(&self) -> impl Iterator<Item = &CleanupCandidate> {
        self.candidates.iter().filter(|c| c.will_delete)
    }

    pub fn deletable_count(&self) -> usize {
        self.deletable().count()
    }

    /// Keep only the deletions named in `selection`.
    ///
    /// Names that are not deletable stay untouched, so a selection can never
    /// mark a protected or current branch for deletion.
    pub fn narrow(&mut self, selection: &[String]) {
        for candidate in self.candidates.iter_mut().filter(|c| c.will_delete) {
            if !selection.iter().any(|s| s == &candidate.name) {
                candidate.will_delete = false;
            }
        }
    }
}

/// Decide what happens to every branch in `branches`.
pub fn plan(branches: &[BranchSummary], merged: &[String], policy: &CleanupPolicy) -> CleanupPlan {
    let merged: HashSet<&str> = merged.iter().map(String::as_str).collect();

    let mut candidates: Vec<CleanupCandidate> = branches
        .iter()
        .map(|branch| {
            let reason = policy.reason_for(branch, &merged);
            CleanupCandidate {
                name: branch.name.clone(),
                reason,
                age_days: branch.age_days,
                ahead: branch.ahead,
                behind: branch.behind,
                will_delete: reason.is_deletable(),
            }
        })
        .collect();

    candidates.sort_by(|a, b| {
        a.reason
            .cmp(&b.reason)
            .then_with(|| b.age_days.cmp(&a.age_days))
            .then_with(|| a.name.cmp(&b.name))
    });

    CleanupPlan { candidates }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupOptions {
    /// Empty means `origin`.
    pub remote: String,
    /// Skip the confirmation prompt.
    pub yes: bool,
    /// Consider unmerged branches too (overrides `merged_only`).
    pub all: bool,
    pub age_threshold: Option<i64>,
    pub delete_remote: bool,
    pub merged_only: Option<bool>,
    /// Restrict deletion to these branches.
    pub selection: Option<Vec<String>>,
}

/// Plan computed against a live repository, ready for review.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanupReport {
    pub base_branch: String,
    pub current_branch: String,
    pub remote: String,
    pub delete_remote: bool,
    pub plan: CleanupPlan,
    pub notices: Vec<Notice>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupOutcome {
    pub deleted: Vec<String>,
    pub remote_deleted: Vec<String>,
}

/// Check preconditions and compute the cleanup plan. Nothing is deleted.
pub fn prepare(
    repo: &dyn Repository,
    cfg: &Config,
    opts: &CleanupOptions,
) -> Result<CleanupReport> {
    let remote = remote_or_default(&opts.remote).to_string();

    ensure_clean(repo)?;
    let current_branch = repo.current_branch()?;
    let base_branch = cfg.base_branch();
    ensure_remote(repo, &remote)?;

    let policy_cfg = &cfg.workflows.cleanup;
    let merged_only = if opts.all {
        false
    } else {
        opts.merged_only.unwrap_or(policy_cfg.merged_only)
    };
    let policy = CleanupPolicy {
        base_branch: base_branch.clone(),
        current_branch: current_branch.clone(),
        protected: policy_cfg.protected_branches.clone(),
        age_threshold_days: opts.age_threshold.unwrap_or(policy_cfg.age_threshold_days),
        merged_only,
    };

    let merged = repo.merged_branches(&base_branch)?;
    let mut branches = repo.list_local_branches(&base_branch)?;
    let mut notices = Vec::new();

    for branch in branches.iter_mut() {
        if branch.name == base_branch
            || branch.name == current_branch
            || policy.protected.contains(&branch.name)
        {
            continue;
        }
        match repo.branch_age_days(&branch.name) {
            Ok(days) => branch.age_days = days,
            Err(err) => {
                warn!(branch = %branch.name, error = %err, "branch age lookup failed");
                branch.age_days = 0;
                notices.push(Notice::AgeLookupFailed {
                    branch: branch.name.clone(),
                    reason: err.to_string(),
                });
            }
        }
    }

    let mut plan = plan(&branches, &merged, &policy);
    if let Some(selection) = &opts.selection {
        plan.narrow(selection);
    }
    debug!(
        base = %base_branch,
        deletable = plan.deletable_count(),
        "cleanup plan computed"
    );

    Ok(CleanupReport {
        base_branch,
        current_branch,
        remote,
        delete_remote: opts.delete_remote,
        plan,
        notices,
    })
}

/// Delete every branch the report marks for deletion.
///
/// Local deletion is never forced, so a branch git considers unmerged fails
/// the run. A remote branch is only removed after its local branch was.
/// The tree is checked again since it may have changed during confirmation.
pub fn execute(repo: &dyn Repository, report: &CleanupReport) -> Result<CleanupOutcome> {
    ensure_clean(repo)?;
    let mut outcome = CleanupOutcome::default();

    for candidate in report.plan.deletable() {
        repo.delete_branch(&candidate.name, false)?;
        info!(branch = %candidate.name, reason = %candidate.reason, "deleted local branch");
        outcome.deleted.push(candidate.name.clone());

        if report.delete_remote {
            repo.delete_remote_branch(&report.remote, &candidate.name)?;
            info!(branch = %candidate.name, remote = %report.remote, "deleted remote branch");
            outcome.remote_deleted.push(candidate.name.clone());
        }
    }

    Ok(outcome)
}

/// Prepare, ask `confirm` unless `opts.yes`, then execute.
///
/// Returns the report and `None` when nothing was deleted because the plan was
/// empty or the confirmation was declined.
pub fn cleanup<F>(
    repo: &dyn Repository,
    cfg: &Config,
    opts: &CleanupOptions,
    confirm: F,
) -> Result<(CleanupReport, Option<CleanupOutcome>)>
where
    F: FnOnce(&CleanupReport) -> Result<bool>,
{
    let report = prepare(repo, cfg, opts)?;
    if report.plan.deletable_count() == 0 {
        return Ok((report, None));
    }
    if !opts.yes && !confirm(&report)? {
        return Ok((report, None));
    }
    let outcome = execute(repo, &report)?;
    Ok((report, Some(outcome)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::MockRepository;

    fn branch(name: &str, age_days: i64) -> BranchSummary {
        BranchSummary {
            name: name.to_string(),
            age_days,
            ..BranchSummary::default()
        }
    }

    fn policy(merged_only: bool, threshold: i64) -> CleanupPolicy {
        CleanupPolicy {
            base_branch: "main".to_string(),
            current_branch: "feature/x".to_string(),
            protected: vec!["main".to_string(), "develop".to_string()],
            age_threshold_days: threshold,
            merged_only,
        }
    }

    fn reason_of(plan: &CleanupPlan, name: &str) -> CleanupReason {
        plan.candidates
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.reason)
            .unwrap()
    }

    #[test]
    fn test_protected_and_current_are_never_deletable() {
        let branches = vec![
            branch("main", 500),
            branch("develop", 400),
            branch("feature/x", 400),
        ];
        let merged = vec!["main".to_string(), "develop".to_string(), "feature/x".to_string()];
        for merged_only in [true, false] {
            let plan = plan(&branches, &merged, &policy(merged_only, 30));
            assert_eq!(reason_of(&plan, "develop"), CleanupReason::Protected);
            assert_eq!(reason_of(&plan, "main"), CleanupReason::Protected);
            assert_eq!(reason_of(&plan, "feature/x"), CleanupReason::Current);
            assert_eq!(plan.deletable_count(), 0);
        }
    }

    #[test]
    fn test_base_branch_is_protected_even_if_unlisted() {
        let mut p = policy(false, 30);
        p.base_branch = "trunk".to_string();
        let plan = plan(&[branch("trunk", 90)], &[], &p);
        assert_eq!(reason_of(&plan, "trunk"), CleanupReason::Protected);
    }

    #[test]
    fn test_merged_only_never_deletes_unmerged() {
        let branches = vec![branch("feature/old", 900), branch("feature/done", 1)];
        let merged = vec!["feature/done".to_string()];
        let plan = plan(&branches, &merged, &policy(true, 30));
        assert_eq!(reason_of(&plan, "feature/old"), CleanupReason::NotMerged);
        assert_eq!(reason_of(&plan, "feature/done"), CleanupReason::Merged);
        let names: Vec<&str> = plan.deletable().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["feature/done"]);
    }

    #[test]
    fn test_age_threshold_boundary() {
        let branches = vec![branch("feature/a", 29), branch("feature/b", 30)];
        let plan = plan(&branches, &[], &policy(false, 30));
        assert_eq!(reason_of(&plan, "feature/a"), CleanupReason::Recent);
        assert_eq!(reason_of(&plan, "feature/b"), CleanupReason::Stale);
    }

    #[test]
    fn test_non_positive_threshold_disables_age_test() {
        let branches = vec![branch("feature/ancient", 10_000)];
        for threshold in [0, -5] {
            let plan = plan(&branches, &[], &policy(false, threshold));
            assert_eq!(reason_of(&plan, "feature/ancient"), CleanupReason::Recent);
        }
    }

    #[test]
    fn test_plan_sorting() {
        let branches = vec![
            branch("feature/recent", 1),
            branch("feature/b-stale", 40),
            branch("feature/a-stale", 40),
            branch("feature/older-stale", 90),
            branch("feature/merged", 2),
            branch("main", 0),
        ];
        let merged = vec!["feature/merged".to_string()];
        let plan = plan(&branches, &merged, &policy(false, 30));
        let order: Vec<&str> = plan.candidates.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            order,
            vec![
                "main",
                "feature/merged",
                "feature/older-stale",
                "feature/a-stale",
                "feature/b-stale",
                "feature/recent",
            ]
        );
    }

    #[test]
    fn test_narrow_keeps_only_selected_deletions() {
        let branches = vec![branch("feature/a", 90), branch("feature/b", 90), branch("develop", 90)];
        let mut plan = plan(&branches, &[], &policy(false, 30));
        plan.narrow(&["feature/b".to_string(), "develop".to_string()]);
        let names: Vec<&str> = plan.deletable().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["feature/b"]);

        plan.narrow(&[]);
        assert_eq!(plan.deletable_count(), 0);
    }

    fn repo_with_branches() -> MockRepository {
        let mut repo = MockRepository::new();
        repo.add_branch("feature/merged", 3);
        repo.add_branch("feature/stale", 60);
        repo.add_branch("feature/fresh", 2);
        repo.add_branch("develop", 100);
        repo.mark_merged("feature/merged");
        repo
    }

    #[test]
    fn test_prepare_rejects_dirty_tree() {
        let mut repo = repo_with_branches();
        repo.set_dirty(true);
        let err = prepare(&repo, &Config::default(), &CleanupOptions::default()).unwrap_err();
        assert!(err.is_precondition());
        assert!(repo.calls().is_empty());
    }

    #[test]
    fn test_prepare_rejects_missing_remote() {
        let mut repo = repo_with_branches();
        repo.clear_remotes();
        let err = prepare(&repo, &Config::default(), &CleanupOptions::default()).unwrap_err();
        assert!(err.to_string().contains("remote origin not found"));
    }

    #[test]
    fn test_prepare_uses_config_and_overrides() {
        let repo = repo_with_branches();
        let cfg = Config::default();

        let report = prepare(&repo, &cfg, &CleanupOptions::default()).unwrap();
        let names: Vec<&str> = report.plan.deletable().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["feature/merged"]);
        assert_eq!(report.base_branch, "main");

        let opts = CleanupOptions {
            all: true,
            ..CleanupOptions::default()
        };
        let report = prepare(&repo, &cfg, &opts).unwrap();
        let names: Vec<&str> = report.plan.deletable().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["feature/merged", "feature/stale"]);
    }

    #[test]
    fn test_age_lookup_failure_is_a_notice() {
        let mut repo = repo_with_branches();
        repo.fail_age_lookup("feature/stale");
        let opts = CleanupOptions {
            all: true,
            ..CleanupOptions::default()
        };
        let report = prepare(&repo, &Config::default(), &opts).unwrap();
        let stale = report
            .plan
            .candidates
            .iter()
            .find(|c| c.name == "feature/stale")
            .unwrap();
        assert_eq!(stale.reason, CleanupReason::Recent);
        assert_eq!(stale.age_days, 0);
        assert!(matches!(
            &report.notices[..],
            [Notice::AgeLookupFailed { branch, .. }] if branch == "feature/stale"
        ));
    }

    #[test]
    fn test_execute_deletes_local_then_remote() {
        let repo = repo_with_branches();
        let opts = CleanupOptions {
            all: true,
            delete_remote: true,
            ..CleanupOptions::default()
        };
        let report = prepare(&repo, &Config::default(), &opts).unwrap();
        let outcome = execute(&repo, &report).unwrap();

        assert_eq!(outcome.deleted, vec!["feature/merged", "feature/stale"]);
        assert_eq!(outcome.remote_deleted, outcome.deleted);
        assert_eq!(
            repo.calls(),
            vec![
                "branch -d feature/merged",
                "push origin --delete feature/merged",
                "branch -d feature/stale",
                "push origin --delete feature/stale",
            ]
        );
        assert!(!repo.branch_names().contains(&"feature/merged".to_string()));
    }

    #[test]
    fn test_execute_stops_on_local_failure_without_remote_delete() {
        let mut repo = repo_with_branches();
        repo.fail_on("branch -d feature/stale", "not fully merged");
        let opts = CleanupOptions {
            all: true,
            delete_remote: true,
            ..CleanupOptions::default()
        };
        let report = prepare(&repo, &Config::default(), &opts).unwrap();
        let err = execute(&repo, &report).unwrap_err();

        assert!(err.to_string().contains("not fully merged"));
        assert_eq!(
            repo.calls(),
            vec![
                "branch -d feature/merged",
                "push origin --delete feature/merged",
                "branch -d feature/stale",
            ]
        );
    }

    #[test]
    fn test_execute_rechecks_clean_tree() {
        let mut repo = repo_with_branches();
        let report = prepare(&repo, &Config::default(), &CleanupOptions::default()).unwrap();
        assert_eq!(report.plan.deletable_count(), 1);

        repo.set_dirty(true);
        let err = execute(&repo, &report).unwrap_err();
        assert!(err.is_precondition());
        assert!(repo.calls().is_empty());
    }

    #[test]
    fn test_cleanup_declined_deletes_nothing() {
        let repo = repo_with_branches();
        let (report, outcome) =
            cleanup(&repo, &Config::default(), &CleanupOptions::default(), |_| Ok(false)).unwrap();
        assert_eq!(report.plan.deletable_count(), 1);
        assert!(outcome.is_none());
        assert!(repo.calls().is_empty());
    }

    #[test]
    fn test_cleanup_yes_skips_confirmation() {
        let repo = repo_with_branches();
        let opts = CleanupOptions {
            yes: true,
            ..CleanupOptions::default()
        };
        let (_, outcome) = cleanup(&repo, &Config::default(), &opts, |_| {
            panic!("confirmation must not be asked")
        })
        .unwrap();
        assert_eq!(outcome.unwrap().deleted, vec!["feature/merged"]);
    }

    #[test]
    fn test_empty_selection_means_nothing_to_delete() {
        let repo = repo_with_branches();
        let opts = CleanupOptions {
            yes: true,
            selection: Some(Vec::new()),
            ..CleanupOptions::default()
        };
        let (report, outcome) = cleanup(&repo, &Config::default(), &opts, |_| Ok(true)).unwrap();
        assert_eq!(report.plan.deletable_count(), 0);
        assert!(outcome.is_none());
    }
}
