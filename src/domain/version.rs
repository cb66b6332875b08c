use crate::error::{GitflowError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Semantic version representation
///
/// Ordering is lexicographic on (major, minor, patch), which is what the
/// derived `Ord` gives us because of the field order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SemanticVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl SemanticVersion {
    /// Create a new version
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        SemanticVersion {
            major,
            minor,
            patch,
        }
    }

    /// The implicit baseline of a repository without release tags.
    pub fn zero() -> Self {
        SemanticVersion::default()
    }

    /// Parse a bare `N.N.N` version.
    ///
    /// Exactly three dot-separated non-negative integers are accepted; anything
    /// else (two components, pre-release suffixes, signs) is rejected.
    pub fn parse(input: &str) -> Option<Self> {
        let mut parts = input.split('.');
        let major = parse_component(parts.next()?)?;
        let minor = parse_component(parts.next()?)?;
        let patch = parse_component(parts.next()?)?;
        if parts.next().is_some() {
            return None;
        }
        Some(SemanticVersion::new(major, minor, patch))
    }

    /// Parse an operator-supplied version override.
    ///
    /// Goes through `semver` so the error message is precise, then rejects
    /// pre-release and build metadata since tags only carry `N.N.N`.
    pub fn parse_override(input: &str) -> Result<Self> {
        let parsed = semver::Version::parse(input.trim()).map_err(|e| {
            GitflowError::config(format!("invalid version override '{}': {}", input, e))
        })?;
        if !parsed.pre.is_empty() || !parsed.build.is_empty() {
            return Err(GitflowError::config(format!(
                "invalid version override '{}': expected MAJOR.MINOR.PATCH",
                input
            )));
        }
        Ok(SemanticVersion::new(parsed.major, parsed.minor, parsed.patch))
    }

    /// Bump version according to bump type
    pub fn bump(&self, bump_type: VersionBump) -> Self {
        match bump_type {
            VersionBump::Major => SemanticVersion {
                major: self.major + 1,
                minor: 0,
                patch: 0,
            },
            VersionBump::Minor => SemanticVersion {
                major: self.major,
                minor: self.minor + 1,
                patch: 0,
            },
            VersionBump::Patch => SemanticVersion {
                major: self.major,
                minor: self.minor,
                patch: self.patch + 1,
            },
        }
    }
}

fn parse_component(part: &str) -> Option<u64> {
    if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    part.parse::<u64>().ok()
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Version bump type decision
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionBump {
    Major,
    Minor,
    #[default]
    Patch,
}

impl VersionBump {
    pub fn as_str(&self) -> &'static str {
        match self {
            VersionBump::Major => "major",
            VersionBump::Minor => "minor",
            VersionBump::Patch => "patch",
        }
    }
}

impl FromStr for VersionBump {
    type Err = GitflowError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "major" => Ok(VersionBump::Major),
            "minor" => Ok(VersionBump::Minor),
            "patch" | "" => Ok(VersionBump::Patch),
            other => Err(GitflowError::config(format!(
                "unsupported release default bump: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for VersionBump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
