//! Domain logic - pure business rules independent of git operations

pub mod branch;
pub mod commit;
pub mod tag;
pub mod version;

pub use branch::{slugify, title_from_branch, BranchKind};
pub use commit::{classify, Classification, CommitCategory};
pub use tag::{format_tag, parse_version_tag, resolve_latest, LatestVersion};
pub use version::{SemanticVersion, VersionBump};
