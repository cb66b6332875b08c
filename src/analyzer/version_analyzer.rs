use crate::domain::{classify, CommitCategory, SemanticVersion, VersionBump};
use crate::git::CommitRecord;

/// Commit subjects partitioned by changelog section, in log order (newest first).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitGroups {
    pub breaking: Vec<String>,
    pub features: Vec<String>,
    pub fixes: Vec<String>,
    pub other: Vec<String>,
}

impl CommitGroups {
    /// Subjects for a changelog section key (`breaking`, `features`, `fixes`, `other`).
    pub fn section(&self, key: &str) -> Option<&[String]> {
        match key {
            "breaking" => Some(&self.breaking),
            "features" => Some(&self.features),
            "fixes" => Some(&self.fixes),
            "other" => Some(&self.other),
            _ => None,
        }
    }

    /// Number of grouped subjects.
    pub fn len(&self) -> usize {
        self.breaking.len() + self.features.len() + self.fixes.len() + self.other.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Classify every commit and append its subject to the matching group.
///
/// Breaking commits always go to `breaking`; unconventional, non-breaking
/// commits are dropped.
pub fn classify_commits(commits: &[CommitRecord]) -> CommitGroups {
    let mut groups = CommitGroups::default();

    for commit in commits {
        let target = match classify(&commit.subject, &commit.body).group() {
            Some(CommitCategory::Breaking) => &mut groups.breaking,
            Some(CommitCategory::Feature) => &mut groups.features,
            Some(CommitCategory::Fix) => &mut groups.fixes,
            Some(CommitCategory::Other) => &mut groups.other,
            Some(CommitCategory::Unclassified) | None => continue,
        };
        target.push(commit.subject.clone());
    }

    groups
}

/// Next version after `base` given the grouped commits.
///
/// Precedence: breaking > feature > fix > `default_bump`.
pub fn bump_version(
    base: SemanticVersion,
    groups: &CommitGroups,
    default_bump: VersionBump,
) -> SemanticVersion {
    base.bump(bump_for(groups).unwrap_or(default_bump))
}

fn bump_for(groups: &CommitGroups) -> Option<VersionBump> {
    if !groups.breaking.is_empty() {
        Some(VersionBump::Major)
    } else if !groups.features.is_empty() {
        Some(VersionBump::Minor)
    } else if !groups.fixes.is_empty() {
        Some(VersionBump::Patch)
    } else {
        None
    }
}

/// Outcome of analyzing the commits of one release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    pub groups: CommitGroups,
    pub next_version: SemanticVersion,
    /// Commits that landed in no group.
    pub dropped: usize,
}

/// Analyzes commits to determine the next release version
pub struct VersionAnalyzer {
    default_bump: VersionBump,
}

impl VersionAnalyzer {
    /// Create an analyzer that falls back to `default_bump` when no commit
    /// implies a bump of its own
    pub fn new(default_bump: VersionBump) -> Self {
        VersionAnalyzer { default_bump }
    }

    /// Group `commits` and compute the version that follows `base`
    pub fn analyze(&self, base: SemanticVersion, commits: &[CommitRecord]) -> Analysis {
        let groups = classify_commits(commits);
        let next_version = bump_version(base, &groups, self.default_bump);
        Analysis {
            dropped: commits.len() - groups.len(),
            groups,
            next_version,
        }
    }
}
