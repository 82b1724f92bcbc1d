//! Installing libraries into the local store.

use anyhow::{Result, bail};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

use crate::{
    archive::ArchiveExtractor,
    download::Downloader,
    fetch::{extract, fetch},
    package::{NameVersionResolver, Resolved, Store, normalize_version},
    runtime::Runtime,
};

/// Caller overrides for an install.
#[derive(Debug, Clone, Default)]
pub struct InstallOptions {
    pub name: Option<String>,
    pub version: Option<String>,
    /// Replace an installed package whose content differs.
    pub force: bool,
}

/// A candidate that was not installed because different content already
/// occupies its target.
#[derive(Debug, Clone, PartialEq)]
pub struct Conflict {
    pub source: PathBuf,
    pub target: PathBuf,
}

#[derive(Debug, Default)]
pub struct InstallReport {
    /// Package directories written or found already up to date.
    pub installed: Vec<PathBuf>,
    pub conflicts: Vec<Conflict>,
    single: bool,
}

impl InstallReport {
    /// The installed package directories, or `None` when a single-file
    /// install was refused because of a conflict.
    pub fn paths(&self) -> Option<&[PathBuf]> {
        if self.single && !self.conflicts.is_empty() {
            None
        } else {
            Some(&self.installed)
        }
    }
}

pub struct Installer<R: Runtime, D: Downloader, E: ArchiveExtractor> {
    pub runtime: R,
    pub downloader: D,
    pub extractor: E,
    jimhome: PathBuf,
}

impl<R: Runtime, D: Downloader, E: ArchiveExtractor> Installer<R, D, E> {
    pub fn new(runtime: R, downloader: D, extractor: E, jimhome: PathBuf) -> Self {
        Self {
            runtime,
            downloader,
            extractor,
            jimhome,
        }
    }

    pub fn store(&self) -> Store<'_, R> {
        Store::new(&self.runtime, self.jimhome.clone())
    }

    /// Install every script found in `source` (a URL, file, archive or
    /// directory).
    ///
    /// Candidates whose target already holds identical content count as
    /// installed. Candidates whose target differs are reported as conflicts
    /// unless `options.force` is set; their siblings are still installed.
    #[tracing::instrument(skip(self))]
    pub async fn install(&self, source: &str, options: &InstallOptions) -> Result<InstallReport> {
        if let Some(version) = &options.version
            && normalize_version(version).is_none()
        {
            bail!("Invalid version '{}': a version must start with a digit", version);
        }

        let fetched = fetch(&self.runtime, &self.downloader, source).await?;
        let extracted = extract(&self.runtime, &self.extractor, &fetched)?;

        if extracted.scripts.is_empty() {
            bail!("No script files found in {}", source);
        }

        let resolver = NameVersionResolver::new(&self.runtime);
        let package_version = if self.runtime.is_dir(&extracted.root) {
            let archive = (extracted.root != fetched.path()).then(|| fetched.path());
            resolver.package_version(&extracted.root, archive)
        } else {
            None
        };
        debug!("Package version of {}: {:?}", source, package_version);

        let single = extracted.scripts.len() == 1;
        if !single && (options.name.is_some() || options.version.is_some()) {
            warn!(
                "{} contains {} scripts; ignoring the explicit name and version",
                source,
                extracted.scripts.len()
            );
        }

        let store = self.store();
        store.ensure_lib_dir()?;

        let mut report = InstallReport {
            single,
            ..Default::default()
        };

        for script in &extracted.scripts {
            let resolved = if single {
                resolver.resolve(
                    script,
                    options.name.as_deref(),
                    options.version.as_deref(),
                    package_version.as_deref(),
                )
            } else {
                resolver.resolve_member(script, package_version.as_deref())
            };

            match self.place(&store, &resolver, script, &resolved, options.force)? {
                Placement::Installed(dir) => report.installed.push(dir),
                Placement::Conflict(target) => report.conflicts.push(Conflict {
                    source: script.clone(),
                    target,
                }),
            }
        }

        Ok(report)
    }

    fn place(
        &self,
        store: &Store<'_, R>,
        resolver: &NameVersionResolver<'_, R>,
        script: &Path,
        resolved: &Resolved,
        force: bool,
    ) -> Result<Placement> {
        let Resolved { name, version } = resolved;
        let package_dir = store.package_dir(name, version);
        let target = store.script_path(name, version);
        let content = self.runtime.read(script)?;

        if self.runtime.exists(&target) {
            if self.runtime.read(&target)? == content {
                info!("{}-{} is already installed", name, version);
                return Ok(Placement::Installed(package_dir));
            }
            if !force {
                warn!(
                    "{}-{} is already installed with different content, use --force to replace it",
                    name, version
                );
                return Ok(Placement::Conflict(package_dir));
            }
            info!("Replacing {}-{}", name, version);
        }

        self.runtime.create_dir_all(&package_dir)?;
        self.runtime.write(&target, &content)?;

        let existing = store.load_meta(name, version).unwrap_or_else(|e| {
            debug!("Ignoring unreadable metadata of {}-{}: {:#}", name, version, e);
            None
        });
        let mut meta = existing
            .or_else(|| resolver.metadata(script))
            .unwrap_or_default();
        meta.set_name_version(name, version);
        store.save_meta(name, version, &meta)?;

        info!("Installed {}-{} to {}", name, version, package_dir.display());
        Ok(Placement::Installed(package_dir))
    }
}

enum Placement {
    Installed(PathBuf),
    Conflict(PathBuf),
}
