mod common;

use common::{commit_file, git, Remote};
use gitflow::config::Config;
use gitflow::git::Git2Repository;
use gitflow::workflow::cleanup::{cleanup, prepare, CleanupOptions, CleanupReason};

fn config() -> Config {
    let mut cfg = Config::default();
    cfg.validate().unwrap();
    cfg
}

/// `feature/done` is merged into main and pushed; `feature/wip` has its own commit.
fn remote_with_branches() -> Remote {
    let remote = Remote::new();
    let work = &remote.work;
    git(work, &["branch", "feature/done"]);
    git(work, &["push", "-q", "origin", "feature/done"]);
    git(work, &["checkout", "-q", "-b", "feature/wip"]);
    commit_file(work, "wip.txt", "feat: half done");
    git(work, &["checkout", "-q", "main"]);
    remote
}

fn local_branches(remote: &Remote) -> Vec<String> {
    git(&remote.work, &["for-each-ref", "--format=%(refname:short)", "refs/heads"])
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn test_plan_classifies_local_branches() {
    let remote = remote_with_branches();
    let repo = Git2Repository::open(&remote.work).unwrap();
    let report = prepare(&repo, &config(), &CleanupOptions::default()).unwrap();

    let reasons: Vec<(&str, CleanupReason)> = report
        .plan
        .candidates
        .iter()
        .map(|c| (c.name.as_str(), c.reason))
        .collect();
    assert_eq!(
        reasons,
        vec![
            ("main", CleanupReason::Protected),
            ("feature/done", CleanupReason::Merged),
            ("feature/wip", CleanupReason::NotMerged),
        ]
    );
    assert!(report.notices.is_empty());
}

#[test]
fn test_cleanup_deletes_merged_branch_locally_and_remotely() {
    let remote = remote_with_branches();
    let repo = Git2Repository::open(&remote.work).unwrap();
    let opts = CleanupOptions {
        yes: true,
        delete_remote: true,
        ..CleanupOptions::default()
    };

    let (_, outcome) = cleanup(&repo, &config(), &opts, |_| {
        panic!("--yes must not prompt")
    })
    .unwrap();
    let outcome = outcome.unwrap();

    assert_eq!(outcome.deleted, vec!["feature/done"]);
    assert_eq!(outcome.remote_deleted, vec!["feature/done"]);
    assert_eq!(local_branches(&remote), vec!["feature/wip", "main"]);
    assert_eq!(remote.origin_branches(), vec!["main"]);
}

#[test]
fn test_declined_confirmation_deletes_nothing() {
    let remote = remote_with_branches();
    let repo = Git2Repository::open(&remote.work).unwrap();

    let mut asked = false;
    let (report, outcome) = cleanup(&repo, &config(), &CleanupOptions::default(), |report| {
        asked = true;
        assert_eq!(report.plan.deletable_count(), 1);
        Ok(false)
    })
    .unwrap();

    assert!(asked);
    assert!(outcome.is_none());
    assert_eq!(report.plan.deletable_count(), 1);
    assert_eq!(local_branches(&remote).len(), 3);
}

#[test]
fn test_cleanup_refuses_dirty_tree() {
    let remote = remote_with_branches();
    std::fs::write(remote.work.join("scratch.txt"), "x").unwrap();
    let repo = Git2Repository::open(&remote.work).unwrap();

    let opts = CleanupOptions {
        yes: true,
        ..CleanupOptions::default()
    };
    let err = cleanup(&repo, &config(), &opts, |_| Ok(true)).unwrap_err();
    assert!(err.is_precondition());
    assert_eq!(local_branches(&remote).len(), 3);
}
