use anyhow::Result;
use log::debug;

use crate::{package::Index, runtime::Runtime};

use super::config::Config;

/// Remove installed versions of a package, asking before each one unless
/// `yes` is set.
#[tracing::instrument(skip(runtime, config))]
pub fn remove<R: Runtime>(
    runtime: R,
    name: &str,
    version: Option<&str>,
    yes: bool,
    config: Config,
) -> Result<()> {
    let store = config.store(&runtime);
    let index = Index::new(&runtime, vec![store.lib_dir()]);

    let paths = index.find_all(name, version)?;
    debug!("Found {} match(es) for {}", paths.len(), name);
    if paths.is_empty() {
        match version {
            Some(version) => println!("No installed files found for {} {}.", name, version),
            None => println!("No installed files found for {}.", name),
        }
        return Ok(());
    }

    let mut removed = 0;
    for path in paths {
        if !yes && !runtime.confirm(&format!("Remove {}?", path.display()))? {
            debug!("Keeping {:?}", path);
            continue;
        }
        store.delete(&path)?;
        removed += 1;
    }

    println!("Removed {} files.", removed);
    Ok(())
}
