use crate::domain::version::SemanticVersion;

/// Latest released version found among the repository tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LatestVersion {
    pub version: SemanticVersion,
    /// The tag the version came from; `None` when no tag matched and the
    /// version is the implicit 0.0.0 baseline.
    pub tag: Option<String>,
    /// Tags that carried the prefix but were not `prefix + N.N.N`.
    pub skipped: Vec<String>,
}

/// Extract the version of a release tag (e.g., prefix "v", "v1.2.3" -> 1.2.3).
///
/// Returns `None` when the tag does not start with `prefix` or the remainder
/// is not exactly three numeric components.
pub fn parse_version_tag(tag: &str, prefix: &str) -> Option<SemanticVersion> {
    tag.strip_prefix(prefix).and_then(SemanticVersion::parse)
}

/// Format a release tag from prefix and version.
pub fn format_tag(prefix: &str, version: &SemanticVersion) -> String {
    format!("{}{}", prefix, version)
}

/// Find the highest release version among `tags`.
pub fn resolve_latest<S: AsRef<str>>(tags: &[S], prefix: &str) -> LatestVersion {
    let mut latest = LatestVersion::default();

    for tag in tags.iter().map(AsRef::as_ref) {
        if !tag.starts_with(prefix) {
            continue;
        }
        match parse_version_tag(tag, prefix) {
            Some(version) => {
                if latest.tag.is_none() || version > latest.version {
                    latest.version = version;
                    latest.tag = Some(tag.to_string());
                }
            }
            None => latest.skipped.push(tag.to_string()),
        }
    }

    latest
}
