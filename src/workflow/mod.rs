//! Command workflows
//!
//! Each submodule implements one command against the [Repository] trait (and,
//! for the hosting commands, the [Provider](crate::provider::Provider) trait).
//! Workflows never print or prompt; they return results for the `ui` layer.

pub mod branch_list;
pub mod cleanup;
pub mod commit;
pub mod doctor;
pub mod init;
pub mod pr;
pub mod release;
pub mod start;
pub mod status;
pub mod sync;

use crate::error::{GitflowError, Result};
use crate::git::Repository;

/// Remote used when a command is not given one.
pub const DEFAULT_REMOTE: &str = "origin";

/// `remote`, or [DEFAULT_REMOTE] when blank.
pub(crate) fn remote_or_default(remote: &str) -> &str {
    let remote = remote.trim();
    if remote.is_empty() {
        DEFAULT_REMOTE
    } else {
        remote
    }
}

pub(crate) fn ensure_clean(repo: &dyn Repository) -> Result<()> {
    if repo.is_dirty()? {
        return Err(GitflowError::precondition("working tree is not clean"));
    }
    Ok(())
}

pub(crate) fn ensure_remote(repo: &dyn Repository, remote: &str) -> Result<()> {
    if !repo.has_remote(remote)? {
        return Err(GitflowError::precondition(format!(
            "remote {} not found",
            remote
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::MockRepository;

    #[test]
    fn test_remote_or_default() {
        assert_eq!(remote_or_default(""), "origin");
        assert_eq!(remote_or_default("  "), "origin");
        assert_eq!(remote_or_default("upstream"), "upstream");
    }

    #[test]
    fn test_preconditions() {
        let mut repo = MockRepository::new();
        assert!(ensure_clean(&repo).is_ok());
        assert!(ensure_remote(&repo, "origin").is_ok());

        repo.set_dirty(true);
        let err = ensure_clean(&repo).unwrap_err();
        assert!(err.is_precondition());

        let err = ensure_remote(&repo, "upstream").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Precondition failed: remote upstream not found"
        );
    }
}
