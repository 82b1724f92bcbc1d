use anyhow::Result;
use log::{debug, info};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::{package::Index, runtime::Runtime};

use super::config::Config;

/// List packages installed in the store.
#[tracing::instrument(skip(runtime, config))]
pub fn list<R: Runtime>(runtime: R, search: Option<&str>, config: Config) -> Result<()> {
    let roots = vec![config.store(&runtime).lib_dir()];
    print_index(&runtime, roots, search, "installed", "Installed")
}

/// List packages available to a bundle: the store plus the current directory.
#[tracing::instrument(skip(runtime, config))]
pub fn available<R: Runtime>(runtime: R, search: Option<&str>, config: Config) -> Result<()> {
    let roots = vec![config.store(&runtime).lib_dir(), runtime.current_dir()?];
    print_index(&runtime, roots, search, "all available", "Available")
}

fn print_index<R: Runtime>(
    runtime: &R,
    roots: Vec<PathBuf>,
    search: Option<&str>,
    kind: &str,
    heading: &str,
) -> Result<()> {
    let index = Index::new(runtime, roots);
    let dirs: Vec<String> = index
        .directories()
        .iter()
        .map(|d| d.display().to_string())
        .collect();
    info!("Getting list of {} files in {}", kind, dirs.join(", "));
    if let Some(search) = search {
        info!("Searching for '{}'", search);
    }

    let listing = index.list(search)?;
    if listing.is_empty() {
        println!("No packages installed.");
        return Ok(());
    }
    debug!("Found {} package(s)", listing.len());

    info!("{}:", heading);
    for line in format_listing(&listing) {
        println!("{}", line);
    }
    Ok(())
}

/// `name (newest, older, ...)`, one line per package.
fn format_listing(listing: &BTreeMap<String, Vec<(String, PathBuf)>>) -> Vec<String> {
    listing
        .iter()
        .map(|(name, versions)| {
            let versions: Vec<&str> = versions.iter().map(|(v, _)| v.as_str()).collect();
            format!("{} ({})", name, versions.join(", "))
        })
        .collect()
}
