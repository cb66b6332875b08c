use std::fmt;

/// Non-fatal problems met while computing a result.
///
/// The offending item is skipped or defaulted and the operation carries on;
/// callers decide whether to show these to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// Tag carries the release prefix but is not `prefix + N.N.N`
    UnparsableTag { tag: String, prefix: String },
    /// Age of a branch could not be read; it was treated as brand new
    AgeLookupFailed { branch: String, reason: String },
    /// Nothing to release since the latest tag
    NoNewCommits { latest_tag: String },
    /// Commits that are neither conventional nor breaking
    UnclassifiedCommits { count: usize },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::UnparsableTag { tag, prefix } => {
                write!(
                    f,
                    "Skipping tag '{}': not a {}MAJOR.MINOR.PATCH version",
                    tag, prefix
                )
            }
            Notice::AgeLookupFailed { branch, reason } => {
                write!(f, "Cannot read age of branch '{}': {}", branch, reason)
            }
            Notice::NoNewCommits { latest_tag } => {
                write!(f, "No new commits since tag '{}'", latest_tag)
            }
            Notice::UnclassifiedCommits { count } => {
                let noun = if *count == 1 { "commit" } else { "commits" };
                write!(
                    f,
                    "{} {} without a conventional type left out of the changelog",
                    count, noun
                )
            }
        }
    }
}
