use crate::config::{CommitConfig, Config};
use crate::error::{GitflowError, Result};
use crate::git::Repository;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitOptions {
    /// Stage every change first.
    pub all: bool,
    /// Summary line (or the whole message outside conventional mode).
    pub message: String,
    pub body: String,
    pub commit_type: String,
    pub scope: String,
    pub breaking: bool,
}

/// Build the commit message according to `commits` settings.
///
/// In conventional mode the header is `type(scope)!: summary`; the body, if
/// any, follows after a blank line.
pub fn build_message(commits: &CommitConfig, opts: &CommitOptions) -> Result<String> {
    let summary = opts.message.trim();
    let header = if commits.conventional {
        let commit_type = opts.commit_type.trim();
        if commit_type.is_empty() {
            return Err(GitflowError::config("type is required for conventional commits"));
        }
        if summary.is_empty() {
            return Err(GitflowError::config(
                "summary is required for conventional commits",
            ));
        }
        if !commits.types.iter().any(|t| t == commit_type) {
            return Err(GitflowError::config(format!(
                "commit type '{}' is not one of: {}",
                commit_type,
                commits.types.join(", ")
            )));
        }

        let scope = opts.scope.trim();
        if scope.is_empty() && commits.require_scope {
            return Err(GitflowError::config("scope is required"));
        }
        if !scope.is_empty() && !commits.scopes.is_empty() && !commits.scopes.iter().any(|s| s == scope) {
            return Err(GitflowError::config(format!(
                "commit scope '{}' is not one of: {}",
                scope,
                commits.scopes.join(", ")
            )));
        }

        let mut header = commit_type.to_string();
        if !scope.is_empty() {
            header.push_str(&format!("({})", scope));
        }
        if opts.breaking {
            header.push('!');
        }
        format!("{}: {}", header, summary)
    } else {
        if summary.is_empty() {
            return Err(GitflowError::config("message is required"));
        }
        summary.to_string()
    };

    let body = opts.body.trim();
    if body.is_empty() {
        Ok(header)
    } else {
        Ok(format!("{}\n\n{}", header, body))
    }
}

/// Commit the staged changes; returns the message used.
pub fn commit(repo: &dyn Repository, cfg: &Config, opts: &CommitOptions) -> Result<String> {
    if opts.all {
        repo.add_all()?;
    }
    if !repo.has_staged_changes()? {
        return Err(GitflowError::precondition("no staged changes to commit"));
    }

    let message = build_message(&cfg.commits, opts)?;
    repo.commit(&message)?;
    info!(subject = %message.lines().next().unwrap_or_default(), "created commit");
    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::MockRepository;

    fn conventional() -> CommitConfig {
        CommitConfig {
            conventional: true,
            ..CommitConfig::default()
        }
    }

    fn opts(commit_type: &str, scope: &str, message: &str) -> CommitOptions {
        CommitOptions {
            commit_type: commit_type.to_string(),
            scope: scope.to_string(),
            message: message.to_string(),
            ..CommitOptions::default()
        }
    }

    #[test]
    fn test_conventional_header() {
        let cfg = conventional();
        assert_eq!(build_message(&cfg, &opts("feat", "", "add login")).unwrap(), "feat: add login");
        assert_eq!(
            build_message(&cfg, &opts("fix", "api", "handle 404")).unwrap(),
            "fix(api): handle 404"
        );

        let mut breaking = opts("refactor", "core", "drop v1");
        breaking.breaking = true;
        breaking.body = "  Old clients must upgrade.  ".to_string();
        assert_eq!(
            build_message(&cfg, &breaking).unwrap(),
            "refactor(core)!: drop v1\n\nOld clients must upgrade."
        );
    }

    #[test]
    fn test_conventional_validation() {
        let mut cfg = conventional();
        assert!(build_message(&cfg, &opts("", "", "x")).unwrap_err().is_config());
        assert!(build_message(&cfg, &opts("feat", "", " ")).is_err());
        let err = build_message(&cfg, &opts("wip", "", "x")).unwrap_err();
        assert!(err.to_string().contains("'wip'"));

        cfg.require_scope = true;
        assert!(build_message(&cfg, &opts("feat", "", "x")).is_err());

        cfg.scopes = vec!["api".to_string(), "ui".to_string()];
        assert!(build_message(&cfg, &opts("feat", "db", "x")).is_err());
        assert!(build_message(&cfg, &opts("feat", "ui", "x")).is_ok());
    }

    #[test]
    fn test_plain_message() {
        let cfg = CommitConfig::default();
        let mut plain = opts("", "", " Update readme ");
        assert_eq!(build_message(&cfg, &plain).unwrap(), "Update readme");
        plain.body = "More words".to_string();
        assert_eq!(build_message(&cfg, &plain).unwrap(), "Update readme\n\nMore words");
        assert!(build_message(&cfg, &opts("", "", "")).is_err());
    }

    #[test]
    fn test_commit_requires_staged_changes() {
        let repo = MockRepository::new();
        let err = commit(&repo, &Config::default(), &opts("", "", "msg")).unwrap_err();
        assert!(err.is_precondition());
        assert!(repo.calls().is_empty());
    }

    #[test]
    fn test_commit_all_stages_first() {
        let mut repo = MockRepository::new();
        repo.set_dirty(true);
        let mut options = opts("", "", "Update readme");
        options.all = true;

        let message = commit(&repo, &Config::default(), &options).unwrap();
        assert_eq!(message, "Update readme");
        assert_eq!(repo.calls(), vec!["add -A", "commit -m Update readme"]);
        assert!(!repo.is_dirty().unwrap());
    }
}
