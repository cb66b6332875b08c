use crate::config::{write_config, Config, CONFIG_FILE_NAME};
use crate::error::{GitflowError, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// Write `cfg` to `.gitflow.toml` in `dir`; an existing file is only
/// replaced with `force`.
pub fn init(dir: &Path, cfg: &Config, force: bool) -> Result<PathBuf> {
    let path = dir.join(CONFIG_FILE_NAME);
    if path.exists() && !force {
        return Err(GitflowError::precondition(format!(
            "{} already exists, use --force to overwrite",
            CONFIG_FILE_NAME
        )));
    }
    write_config(&path, cfg)?;
    info!(path = %path.display(), "wrote configuration");
    Ok(path)
}
