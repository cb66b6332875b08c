use crate::config::Config;
use crate::error::Result;
use crate::git::{BranchSummary, Repository};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchList {
    pub base: String,
    pub branches: Vec<BranchSummary>,
}

/// Local branches measured against `base`, or the configured base branch.
pub fn list_branches(repo: &dyn Repository, cfg: &Config, base: Option<&str>) -> Result<BranchList> {
    let base = base
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| cfg.base_branch());
    let branches = repo.list_local_branches(&base)?;
    Ok(BranchList { base, branches })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::MockRepository;

    #[test]
    fn test_list_uses_configured_base() {
        let mut repo = MockRepository::new();
        repo.add_branch("feature/a", 4);
        let list = list_branches(&repo, &Config::default(), None).unwrap();
        assert_eq!(list.base, "main");
        let names: Vec<&str> = list.branches.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["feature/a", "main"]);
        assert!(list.branches[1].is_current);
    }

    #[test]
    fn test_list_with_explicit_base() {
        let repo = MockRepository::new();
        let list = list_branches(&repo, &Config::default(), Some(" develop ")).unwrap();
        assert_eq!(list.base, "develop");
        let list = list_branches(&repo, &Config::default(), Some("")).unwrap();
        assert_eq!(list.base, "main");
    }
}
