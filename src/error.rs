use thiserror::Error;

/// Exit code for computation, precondition and version-control failures.
pub const EXIT_COMPUTATION: u8 = 1;
/// Exit code for configuration problems.
pub const EXIT_CONFIG: u8 = 2;
/// Exit code for hosting provider failures.
pub const EXIT_PROVIDER: u8 = 3;

/// Unified error type for gitflow operations
#[derive(Error, Debug)]
pub enum GitflowError {
    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("git {command} failed: {message}")]
    Command { command: String, message: String },

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in gitflow
pub type Result<T> = std::result::Result<T, GitflowError>;

impl GitflowError {
    /// Create a precondition error with context
    pub fn precondition(msg: impl Into<String>) -> Self {
        GitflowError::Precondition(msg.into())
    }

    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        GitflowError::Config(msg.into())
    }

    /// Create a provider error with context
    pub fn provider(msg: impl Into<String>) -> Self {
        GitflowError::Provider(msg.into())
    }

    /// Create an error for a failed `git` subprocess
    pub fn command(command: impl Into<String>, message: impl Into<String>) -> Self {
        GitflowError::Command {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Process exit code for this error's category.
    pub fn exit_code(&self) -> u8 {
        match self {
            GitflowError::Config(_) => EXIT_CONFIG,
            GitflowError::Provider(_) | GitflowError::Http(_) => EXIT_PROVIDER,
            _ => EXIT_COMPUTATION,
        }
    }

    pub fn is_config(&self) -> bool {
        matches!(self, GitflowError::Config(_))
    }

    pub fn is_precondition(&self) -> bool {
        matches!(self, GitflowError::Precondition(_))
    }
}

impl From<toml::de::Error> for GitflowError {
    fn from(err: toml::de::Error) -> Self {
        GitflowError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for GitflowError {
    fn from(err: toml::ser::Error) -> Self {
        GitflowError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GitflowError::config("test config issue");
        assert_eq!(err.to_string(), "Configuration error: test config issue");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: GitflowError = io_err.into();
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_command_error_display() {
        let err = GitflowError::command("rebase main", "CONFLICT (content)");
        assert_eq!(err.to_string(), "git rebase main failed: CONFLICT (content)");
    }

    #[test]
    fn test_exit_codes_by_category() {
        assert_eq!(GitflowError::config("x").exit_code(), EXIT_CONFIG);
        assert_eq!(GitflowError::provider("x").exit_code(), EXIT_PROVIDER);
        assert_eq!(GitflowError::precondition("x").exit_code(), EXIT_COMPUTATION);
        assert_eq!(GitflowError::command("push", "x").exit_code(), EXIT_COMPUTATION);
    }

    #[test]
    fn test_toml_error_is_config() {
        let err: GitflowError = toml::from_str::<toml::Value>("= broken")
            .unwrap_err()
            .into();
        assert!(err.is_config());
    }

    #[test]
    fn test_error_messages_are_descriptive() {
        let error_pairs = vec![
            (GitflowError::config("x"), "Configuration error"),
            (GitflowError::precondition("x"), "Precondition failed"),
            (GitflowError::provider("x"), "Provider error"),
        ];

        for (err, expected_prefix) in error_pairs {
            let msg = err.to_string();
            assert!(
                msg.starts_with(expected_prefix),
                "Error message should start with '{}', but got '{}'",
                expected_prefix,
                msg
            );
        }
    }
}
