use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;

const JIMHOME_DIR: &str = ".jim";

/// The default jimhome: `~/.jim`
#[tracing::instrument(skip(runtime))]
pub fn default_jimhome<R: Runtime>(runtime: &R) -> Result<PathBuf> {
    let home_dir = runtime
        .home_dir()
        .context("Could not find home directory")?;
    Ok(home_dir.join(JIMHOME_DIR))
}

/// Expand a leading `~` (as in `JIMHOME=~/.jim`) to the home directory.
pub fn expand_home<R: Runtime>(runtime: &R, path: &Path) -> Result<PathBuf> {
    match path.strip_prefix("~") {
        Ok(rest) => {
            let home_dir = runtime
                .home_dir()
                .context("Could not find home directory")?;
            Ok(home_dir.join(rest))
        }
        Err(_) => Ok(path.to_path_buf()),
    }
}
