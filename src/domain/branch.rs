use crate::config::BranchConfig;
use regex::Regex;
use std::sync::OnceLock;

/// Kind of work branch created by `start`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BranchKind {
    #[default]
    Feature,
    Bugfix,
    Hotfix,
}

impl BranchKind {
    /// Branch name prefix for this kind, falling back to the built-in prefix
    /// when the configured one is empty.
    pub fn prefix(&self, branches: &BranchConfig) -> String {
        let (configured, fallback) = match self {
            BranchKind::Feature => (&branches.feature_prefix, "feature/"),
            BranchKind::Bugfix => (&branches.bugfix_prefix, "bugfix/"),
            BranchKind::Hotfix => (&branches.hotfix_prefix, "hotfix/"),
        };
        if configured.is_empty() {
            fallback.to_string()
        } else {
            configured.clone()
        }
    }

    /// Full branch name: prefix followed by the slug of `name`.
    pub fn branch_name(&self, branches: &BranchConfig, name: &str) -> String {
        format!("{}{}", self.prefix(branches), slugify(name))
    }
}

fn non_slug() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("static slug pattern is valid"))
}

/// Turn free text into a branch-safe slug (`"Add Login_Page!"` -> `"add-login-page"`).
///
/// An input with no usable characters becomes `"work"`.
pub fn slugify(input: &str) -> String {
    let lowered = input.trim().to_lowercase().replace('_', " ");
    let slug = non_slug().replace_all(&lowered, "-");
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "work".to_string()
    } else {
        slug.to_string()
    }
}

/// Pull request title derived from a work branch name
/// (`"feature/add-login"` -> `"Add Login"`).
pub fn title_from_branch(branch: &str, branches: &BranchConfig) -> String {
    let mut name = branch;
    for kind in [BranchKind::Feature, BranchKind::Bugfix, BranchKind::Hotfix] {
        let prefix = kind.prefix(branches);
        if let Some(rest) = name.strip_prefix(prefix.as_str()) {
            name = rest;
            break;
        }
    }

    let words: Vec<String> = name
        .split(|c| c == '-' || c == '_' || c == ' ')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect();

    if words.is_empty() {
        "Update".to_string()
    } else {
        words.join(" ")
    }
}
