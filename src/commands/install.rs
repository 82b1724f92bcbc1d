use anyhow::{Result, bail};
use log::{debug, warn};

use crate::{
    archive::ArchiveExtractor,
    download::Downloader,
    install::{InstallOptions, Installer},
    runtime::Runtime,
};

use super::{config::Config, services::build_installer};

/// Install a library from a URL or local path into the store.
#[tracing::instrument(skip(runtime, config))]
pub async fn install<R: Runtime>(
    runtime: R,
    source: &str,
    name: Option<String>,
    version: Option<String>,
    config: Config,
) -> Result<()> {
    let options = InstallOptions {
        name,
        version,
        force: config.force,
    };
    let installer = build_installer(runtime, &config)?;
    run(&installer, source, &options).await
}

#[tracing::instrument(skip(installer, options))]
pub async fn run<R: Runtime, D: Downloader, E: ArchiveExtractor>(
    installer: &Installer<R, D, E>,
    source: &str,
    options: &InstallOptions,
) -> Result<()> {
    debug!("Installing {} with {:?}", source, options);
    let report = installer.install(source, options).await?;

    let Some(paths) = report.paths() else {
        let target = report
            .conflicts
            .first()
            .map(|c| c.target.display().to_string())
            .unwrap_or_default();
        bail!(
            "{} is already installed with different content at {}. Use --force to overwrite.",
            source,
            target
        );
    };

    if !report.conflicts.is_empty() {
        warn!(
            "{} of the scripts in {} were not installed",
            report.conflicts.len(),
            source
        );
    }
    for path in paths {
        println!("Installed {}", path.display());
    }
    Ok(())
}
