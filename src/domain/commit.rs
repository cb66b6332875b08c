use std::fmt;

/// Marker that flags a breaking change anywhere in a commit body.
pub const BREAKING_CHANGE_MARKER: &str = "BREAKING CHANGE";

/// Conventional-commit category derived from a commit subject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommitCategory {
    Breaking,
    Feature,
    Fix,
    Other,
    Unclassified,
}

impl CommitCategory {
    /// Category of a recognized type token; `None` for anything outside the closed set.
    pub fn from_type(token: &str) -> Option<Self> {
        match token {
            "feat" => Some(CommitCategory::Feature),
            "fix" | "perf" => Some(CommitCategory::Fix),
            "refactor" | "docs" | "test" | "chore" => Some(CommitCategory::Other),
            _ => None,
        }
    }
}

impl fmt::Display for CommitCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommitCategory::Breaking => "breaking",
            CommitCategory::Feature => "feature",
            CommitCategory::Fix => "fix",
            CommitCategory::Other => "other",
            CommitCategory::Unclassified => "unclassified",
        };
        f.write_str(name)
    }
}

/// Result of classifying one commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub category: CommitCategory,
    pub is_breaking: bool,
}

impl Classification {
    /// Unclassified, non-breaking commits belong in no changelog group.
    pub fn is_dropped(&self) -> bool {
        self.category == CommitCategory::Unclassified && !self.is_breaking
    }

    /// Changelog group this commit lands in; the breaking flag wins over the type.
    pub fn group(&self) -> Option<CommitCategory> {
        if self.is_breaking {
            Some(CommitCategory::Breaking)
        } else if self.category == CommitCategory::Unclassified {
            None
        } else {
            Some(self.category)
        }
    }
}

/// Classify a commit from its subject and body.
///
/// The subject is read as `type(scope)!: summary`. The type token is matched
/// case-sensitively against `feat`, `fix`, `perf`, `refactor`, `docs`, `test`
/// and `chore`. A `!` before the colon or a `BREAKING CHANGE` marker in the
/// body makes the commit breaking whatever its type.
pub fn classify(subject: &str, body: &str) -> Classification {
    let mut is_breaking = false;

    let category = match subject.split_once(':') {
        Some((head, _)) => {
            let mut token = head.trim();
            if let Some(stripped) = token.strip_suffix('!') {
                is_breaking = true;
                token = stripped;
            }
            if let Some(idx) = token.find('(') {
                token = &token[..idx];
            }
            CommitCategory::from_type(token.trim()).unwrap_or(CommitCategory::Unclassified)
        }
        None => CommitCategory::Unclassified,
    };

    if body.contains(BREAKING_CHANGE_MARKER) {
        is_breaking = true;
    }

    Classification {
        category,
        is_breaking,
    }
}
