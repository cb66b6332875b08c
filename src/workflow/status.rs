use crate::error::Result;
use crate::git::Repository;

/// Branch and working tree state of a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub branch: String,
    pub dirty: bool,
}

pub fn status(repo: &dyn Repository) -> Result<Status> {
    Ok(Status {
        branch: repo.current_branch()?,
        dirty: repo.is_dirty()?,
    })
}
