//! Markdown changelog rendering

use crate::analyzer::CommitGroups;
use crate::domain::{format_tag, SemanticVersion};
use crate::git::CommitRecord;

/// Heading for a changelog section key; `None` for unknown keys.
pub fn section_title(key: &str) -> Option<&'static str> {
    match key {
        "breaking" => Some("Breaking Changes"),
        "features" => Some("Features"),
        "fixes" => Some("Fixes"),
        "other" => Some("Other"),
        _ => None,
    }
}

/// Render one release as a Markdown block.
///
/// ```text
/// ## v0.2.0 - 2024-05-01
///
/// ### Features
/// - feat: add login
/// ```
///
/// Sections follow `section_order`; empty or unknown sections are omitted,
/// and an empty `date` drops the ` - date` suffix.
pub fn render(
    version: &SemanticVersion,
    prefix: &str,
    date: &str,
    groups: &CommitGroups,
    section_order: &[String],
) -> String {
    let mut out = format!("## {}", format_tag(prefix, version));
    if !date.is_empty() {
        out.push_str(" - ");
        out.push_str(date);
    }
    out.push('\n');

    let default_order = crate::config::default_changelog_sections();
    let order = if section_order.is_empty() {
        default_order.as_slice()
    } else {
        section_order
    };

    for key in order {
        let (Some(title), Some(entries)) = (section_title(key), groups.section(key)) else {
            continue;
        };
        if entries.is_empty() {
            continue;
        }
        out.push_str("\n### ");
        out.push_str(title);
        out.push('\n');
        for entry in entries {
            out.push_str("- ");
            out.push_str(entry);
            out.push('\n');
        }
    }

    out.trim().to_string()
}

/// Release date: the newest commit's date, or `today` when there are no commits.
pub fn release_date(commits: &[CommitRecord], today: &str) -> String {
    commits
        .first()
        .map(|c| c.date.clone())
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| today.to_string())
}
