#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Run `git` in `dir`, panicking on failure; returns trimmed stdout.
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn configure(dir: &Path) {
    git(dir, &["config", "user.name", "Test User"]);
    git(dir, &["config", "user.email", "test@example.com"]);
    git(dir, &["config", "commit.gpgsign", "false"]);
    git(dir, &["config", "tag.gpgsign", "false"]);
    git(dir, &["config", "pull.rebase", "false"]);
}

/// Fresh repository on `main` with a committer identity.
pub fn init_repo() -> TempDir {
    let dir = TempDir::new().unwrap();
    init_at(dir.path());
    dir
}

fn init_at(dir: &Path) {
    git(dir, &["init", "-q"]);
    git(dir, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    configure(dir);
}

pub fn commit_file(dir: &Path, file: &str, message: &str) {
    fs::write(dir.join(file), message).unwrap();
    git(dir, &["add", file]);
    git(dir, &["commit", "-q", "-m", message]);
}

/// A bare `origin` with one commit on `main` and a working clone of it.
pub struct Remote {
    pub root: TempDir,
    pub origin: PathBuf,
    pub work: PathBuf,
}

impl Remote {
    pub fn new() -> Self {
        let root = TempDir::new().unwrap();
        let seed = root.path().join("seed");
        fs::create_dir(&seed).unwrap();
        init_at(&seed);
        commit_file(&seed, "README.md", "chore: init");

        let origin = root.path().join("origin.git");
        git(
            root.path(),
            &["clone", "-q", "--bare", "seed", "origin.git"],
        );
        let mut remote = Remote {
            work: PathBuf::new(),
            origin,
            root,
        };
        remote.work = remote.clone_as("work");
        remote
    }

    /// Another working clone of `origin`, for simulating other people's pushes.
    pub fn clone_as(&self, name: &str) -> PathBuf {
        git(
            self.root.path(),
            &["clone", "-q", self.origin.to_str().unwrap(), name],
        );
        let dir = self.root.path().join(name);
        configure(&dir);
        dir
    }

    /// Branch names present on `origin`.
    pub fn origin_branches(&self) -> Vec<String> {
        git(&self.origin, &["for-each-ref", "--format=%(refname:short)", "refs/heads"])
            .lines()
            .map(str::to_string)
            .collect()
    }
}
