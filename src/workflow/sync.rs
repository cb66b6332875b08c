//! Branch synchronization
//!
//! A sync walks a fixed path of states:
//!
//! ```text
//! Idle -> Verified -> BaseUpdated -> Integrated -> Pushed
//! ```
//!
//! Each transition is one method on [SyncEngine] and must be taken in order.
//! A failing step aborts the sync and leaves the working copy wherever that
//! step left it; nothing is undone.

use crate::config::{Config, SyncStrategy};
use crate::error::{GitflowError, Result};
use crate::git::Repository;
use crate::workflow::{ensure_clean, ensure_remote, remote_or_default};
use std::fmt;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SyncState {
    Idle,
    Verified,
    BaseUpdated,
    Integrated,
    Pushed,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncState::Idle => "idle",
            SyncState::Verified => "verified",
            SyncState::BaseUpdated => "base updated",
            SyncState::Integrated => "integrated",
            SyncState::Pushed => "pushed",
        };
        f.write_str(name)
    }
}

/// Command-line overrides for the `workflows.sync` settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Empty means `origin`.
    pub remote: String,
    pub strategy: Option<SyncStrategy>,
    pub auto_push: Option<bool>,
    pub force_push: Option<bool>,
}

/// Outcome of a sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPlan {
    pub base_branch: String,
    pub current_branch: String,
    pub strategy: SyncStrategy,
    pub pushed: bool,
    /// The push used `--force-with-lease`.
    pub force_pushed: bool,
}

/// Drives one sync through its states.
pub struct SyncEngine<'a> {
    repo: &'a dyn Repository,
    state: SyncState,
    remote: String,
    base_branch: String,
    current_branch: String,
    strategy: SyncStrategy,
    auto_push: bool,
    force_push: bool,
    pushed: bool,
    force_pushed: bool,
}

impl<'a> SyncEngine<'a> {
    /// Resolve settings; the engine starts in [SyncState::Idle].
    pub fn new(repo: &'a dyn Repository, cfg: &Config, opts: &SyncOptions) -> Self {
        let sync = &cfg.workflows.sync;
        SyncEngine {
            repo,
            state: SyncState::Idle,
            remote: remote_or_default(&opts.remote).to_string(),
            base_branch: cfg.base_branch(),
            current_branch: String::new(),
            strategy: opts.strategy.unwrap_or(sync.strategy),
            auto_push: opts.auto_push.unwrap_or(sync.auto_push),
            force_push: opts.force_push.unwrap_or(sync.force_push),
            pushed: false,
            force_pushed: false,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    fn advance(&mut self, to: SyncState) {
        debug!(from = %self.state, to = %to, "sync transition");
        self.state = to;
    }

    fn expect_state(&self, expected: SyncState, next: SyncState) -> Result<()> {
        if self.state != expected {
            return Err(GitflowError::precondition(format!(
                "sync cannot move to {} from {}",
                next, self.state
            )));
        }
        Ok(())
    }

    /// Idle -> Verified: clean tree, not on the base branch, remote exists.
    pub fn verify(&mut self) -> Result<()> {
        self.expect_state(SyncState::Idle, SyncState::Verified)?;

        ensure_clean(self.repo)?;
        let current = self.repo.current_branch()?;
        if current.trim() == self.base_branch.trim() {
            return Err(GitflowError::precondition(format!(
                "already on base branch {}",
                self.base_branch
            )));
        }
        ensure_remote(self.repo, &self.remote)?;

        self.current_branch = current;
        self.advance(SyncState::Verified);
        Ok(())
    }

    /// Verified -> BaseUpdated: fetch, pull the base branch, come back.
    pub fn update_base(&mut self) -> Result<()> {
        self.expect_state(SyncState::Verified, SyncState::BaseUpdated)?;

        self.repo.fetch(&self.remote)?;
        self.repo.checkout(&self.base_branch)?;
        self.repo.pull(&self.remote, &self.base_branch)?;
        self.repo.checkout(&self.current_branch)?;

        self.advance(SyncState::BaseUpdated);
        Ok(())
    }

    /// BaseUpdated -> Integrated: rebase onto or merge the base branch.
    pub fn integrate(&mut self) -> Result<()> {
        self.expect_state(SyncState::BaseUpdated, SyncState::Integrated)?;

        match self.strategy {
            SyncStrategy::Rebase => self.repo.rebase(&self.base_branch)?,
            SyncStrategy::Merge => self.repo.merge(&self.base_branch)?,
        }
        info!(
            branch = %self.current_branch,
            base = %self.base_branch,
            strategy = %self.strategy,
            "branch integrated"
        );

        self.advance(SyncState::Integrated);
        Ok(())
    }

    /// Integrated -> Pushed. Pushes only with auto push; forces only after a
    /// rebase with force push enabled.
    pub fn push(&mut self) -> Result<()> {
        self.expect_state(SyncState::Integrated, SyncState::Pushed)?;

        if self.auto_push {
            let force = self.strategy == SyncStrategy::Rebase && self.force_push;
            self.repo.push(&self.remote, &self.current_branch, force)?;
            self.pushed = true;
            self.force_pushed = force;
        }

        self.advance(SyncState::Pushed);
        Ok(())
    }

    /// Result of a completed sync.
    pub fn finish(self) -> Result<SyncPlan> {
        if self.state != SyncState::Pushed {
            return Err(GitflowError::precondition(format!(
                "sync stopped in state {}",
                self.state
            )));
        }
        Ok(SyncPlan {
            base_branch: self.base_branch,
            current_branch: self.current_branch,
            strategy: self.strategy,
            pushed: self.pushed,
            force_pushed: self.force_pushed,
        })
    }
}

/// Run every sync step.
pub fn sync(repo: &dyn Repository, cfg: &Config, opts: &SyncOptions) -> Result<SyncPlan> {
    let mut engine = SyncEngine::new(repo, cfg, opts);
    engine.verify()?;
    engine.update_base()?;
    engine.integrate()?;
    engine.push()?;
    engine.finish()
}
