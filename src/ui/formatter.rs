//! Pure formatting functions for UI output.
//!
//! Everything here returns plain strings; [super::Ui] adds color and prints.

use crate::git::BranchSummary;
use crate::provider::PullRequest;
use crate::workflow::cleanup::{CleanupCandidate, CleanupReport};
use crate::workflow::doctor::DoctorCheck;
use crate::workflow::release::ReleaseResult;

/// One row per local branch, aligned on the branch name.
pub fn branch_rows(branches: &[BranchSummary]) -> Vec<String> {
    let width = branches.iter().map(|b| b.name.len()).max().unwrap_or(0);
    branches
        .iter()
        .map(|b| {
            let marker = if b.is_current { '*' } else { ' ' };
            format!(
                "{} {:<width$}  {:>4}d  +{}/-{}  {}",
                marker,
                b.name,
                b.age_days,
                b.ahead,
                b.behind,
                b.last_commit_subject,
                width = width
            )
        })
        .collect()
}

/// Candidate line used in the cleanup plan and its confirmation prompt.
pub fn candidate_line(candidate: &CleanupCandidate, delete_remote: bool) -> String {
    let mut line = format!(
        " {} reason={} age={}d",
        candidate.name, candidate.reason, candidate.age_days
    );
    if delete_remote {
        line.push_str(" remote=yes");
    }
    line
}

/// Full cleanup table: every local branch with its classification.
pub fn cleanup_rows(report: &CleanupReport) -> Vec<String> {
    let width = report
        .plan
        .candidates
        .iter()
        .map(|c| c.name.len())
        .max()
        .unwrap_or(0);
    report
        .plan
        .candidates
        .iter()
        .map(|c| {
            let action = if c.will_delete { "delete" } else { "keep" };
            format!(
                "  {:<6} {:<width$}  {:<10} {:>4}d  +{}/-{}",
                action,
                c.name,
                c.reason.as_str(),
                c.age_days,
                c.ahead,
                c.behind,
                width = width
            )
        })
        .collect()
}

/// Text summary of a computed release: versions, commit count, changelog.
pub fn release_summary(release: &ReleaseResult) -> Vec<String> {
    let current = match &release.base_tag {
        Some(tag) => format!("{} ({})", release.base_version, tag),
        None => format!("{} (no release tag yet)", release.base_version),
    };
    let mut lines = vec![
        format!("Current version: {}", current),
        format!("Next version:    {} ({})", release.next_version, release.tag),
        format!("Commits:         {}", release.commit_count),
        String::new(),
    ];
    lines.extend(release.changelog.lines().map(str::to_string));
    lines
}

pub fn pull_request_line(pr: &PullRequest) -> String {
    let draft = if pr.draft { " [draft]" } else { "" };
    format!(
        "#{} {}{} ({} -> {}, {})",
        pr.number, pr.title, draft, pr.head_branch, pr.base_branch, pr.state
    )
}

/// Detailed view of one pull request.
pub fn pull_request_details(pr: &PullRequest) -> Vec<String> {
    let mut lines = vec![
        pull_request_line(pr),
        format!("  author:    {}", pr.author),
        format!("  url:       {}", pr.url),
    ];
    if !pr.reviewers.is_empty() {
        lines.push(format!("  reviewers: {}", pr.reviewers.join(", ")));
    }
    if !pr.labels.is_empty() {
        lines.push(format!("  labels:    {}", pr.labels.join(", ")));
    }
    if !pr.description.trim().is_empty() {
        lines.push(String::new());
        lines.extend(pr.description.lines().map(|l| format!("  {}", l)));
    }
    lines
}

pub fn doctor_line(check: &DoctorCheck) -> String {
    format!("[{}] {}: {}", check.level, check.name, check.message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::cleanup::{CleanupPlan, CleanupReason};
    use crate::workflow::doctor::CheckLevel;

    fn candidate(name: &str, reason: CleanupReason, age_days: i64) -> CleanupCandidate {
        CleanupCandidate {
            name: name.to_string(),
            reason,
            age_days,
            ahead: 0,
            behind: 2,
            will_delete: reason.is_deletable(),
        }
    }

    #[test]
    fn test_candidate_line() {
        let c = candidate("feature/old", CleanupReason::Stale, 45);
        assert_eq!(candidate_line(&c, false), " feature/old reason=stale age=45d");
        assert_eq!(
            candidate_line(&c, true),
            " feature/old reason=stale age=45d remote=yes"
        );
    }

    #[test]
    fn test_cleanup_rows_mark_action() {
        let report = CleanupReport {
            base_branch: "main".to_string(),
            current_branch: "main".to_string(),
            remote: "origin".to_string(),
            delete_remote: false,
            plan: CleanupPlan {
                candidates: vec![
                    candidate("main", CleanupReason::Protected, 0),
                    candidate("feature/done", CleanupReason::Merged, 3),
                ],
            },
            notices: Vec::new(),
        };
        let rows = cleanup_rows(&report);
        assert_eq!(rows.len(), 2);
        assert!(rows[0].starts_with("  keep   main"));
        assert!(rows[1].contains("delete feature/done"));
        assert!(rows[1].contains("merged"));
    }

    #[test]
    fn test_branch_rows_mark_current() {
        let branches = vec![
            BranchSummary {
                name: "main".to_string(),
                is_current: true,
                ..BranchSummary::default()
            },
            BranchSummary {
                name: "feature/x".to_string(),
                ahead: 3,
                last_commit_subject: "feat: x".to_string(),
                ..BranchSummary::default()
            },
        ];
        let rows = branch_rows(&branches);
        assert!(rows[0].starts_with("* main"));
        assert!(rows[1].starts_with("  feature/x"));
        assert!(rows[1].contains("+3/-0"));
        assert!(rows[1].ends_with("feat: x"));
    }

    #[test]
    fn test_pull_request_details() {
        let pr = PullRequest {
            number: 5,
            title: "Add login".to_string(),
            state: "open".to_string(),
            head_branch: "feature/login".to_string(),
            base_branch: "main".to_string(),
            draft: true,
            labels: vec!["ui".to_string()],
            description: "Adds a form".to_string(),
            ..PullRequest::default()
        };
        let lines = pull_request_details(&pr);
        assert_eq!(lines[0], "#5 Add login [draft] (feature/login -> main, open)");
        assert!(lines.contains(&"  labels:    ui".to_string()));
        assert_eq!(lines.last().unwrap(), "  Adds a form");
    }

    #[test]
    fn test_doctor_line() {
        let check = DoctorCheck {
            name: "Working tree",
            level: CheckLevel::Warn,
            message: "dirty".to_string(),
        };
        assert_eq!(doctor_line(&check), "[WARN] Working tree: dirty");
    }
}
