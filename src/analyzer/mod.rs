//! Commit grouping and version bump computation

pub mod version_analyzer;

pub use version_analyzer::{bump_version, classify_commits, Analysis, CommitGroups, VersionAnalyzer};
