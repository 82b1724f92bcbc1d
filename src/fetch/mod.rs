//! Retrieval of install sources and expansion into candidate script files.
//!
//! A source is either an `http(s)` URL, downloaded into a temporary working
//! directory, or a local path used in place. [`extract`] then turns the
//! fetched source into the list of script files worth installing.

use anyhow::{Context, Result};
use log::debug;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tempfile::TempDir;

use crate::archive::ArchiveExtractor;
use crate::download::Downloader;
use crate::error::JimError;
use crate::package::strip_known_extension;
use crate::runtime::Runtime;

/// Names (files or directories) that never make it into the store.
static IGNORED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(^|[^a-z])(tests?|specs?|__macosx)([^a-z]|$)")
        .expect("ignore pattern is valid")
});

const SCRIPT_EXTENSION: &str = "js";
const FALLBACK_FILE_NAME: &str = "download";

/// A source available on the local filesystem.
///
/// Holds the temporary working directory of a download, if any, so the
/// downloaded file lives exactly as long as this value.
#[derive(Debug)]
pub struct FetchedSource {
    path: PathBuf,
    workdir: Option<TempDir>,
}

impl FetchedSource {
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            workdir: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_downloaded(&self) -> bool {
        self.workdir.is_some()
    }
}

/// The script files found in a fetched source.
#[derive(Debug)]
pub struct Extracted {
    /// The directory the candidates were collected from, or the file itself.
    pub root: PathBuf,
    pub scripts: Vec<PathBuf>,
    _workdir: Option<TempDir>,
}

pub fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// File name a URL is saved under: its last non-empty path segment.
pub fn url_file_name(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut segments| segments.rfind(|s| !s.is_empty()).map(str::to_string))
        })
        .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string())
}

/// True when any component of `path` is excluded by the ignore policy.
pub fn is_ignored(path: &Path) -> bool {
    path.components()
        .any(|c| IGNORED.is_match(&c.as_os_str().to_string_lossy()))
}

fn is_script(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(SCRIPT_EXTENSION))
}

fn working_dir() -> Result<TempDir> {
    tempfile::Builder::new()
        .prefix("jim-")
        .tempdir()
        .context("Failed to create temporary working directory")
}

/// Make `source` available locally.
#[tracing::instrument(skip(runtime, downloader))]
pub async fn fetch<R: Runtime, D: Downloader + ?Sized>(
    runtime: &R,
    downloader: &D,
    source: &str,
) -> Result<FetchedSource> {
    if is_url(source) {
        let workdir = working_dir()?;
        let dest = workdir.path().join(url_file_name(source));
        downloader.download(source, &dest).await?;
        return Ok(FetchedSource {
            path: dest,
            workdir: Some(workdir),
        });
    }

    let path = PathBuf::from(source);
    if !runtime.exists(&path) {
        return Err(JimError::fetch(source, "No such file or directory").into());
    }
    Ok(FetchedSource::local(path))
}

/// List the candidate script files of a fetched source.
///
/// A plain file is its own sole candidate. Archives are expanded into a
/// temporary directory first; directories are scanned recursively. Ignored
/// paths are skipped and the result is sorted.
#[tracing::instrument(skip(runtime, extractor, fetched))]
pub fn extract<R: Runtime, E: ArchiveExtractor>(
    runtime: &R,
    extractor: &E,
    fetched: &FetchedSource,
) -> Result<Extracted> {
    let path = fetched.path();

    if runtime.is_dir(path) {
        let scripts = scan_scripts(runtime, path)?;
        return Ok(Extracted {
            root: path.to_path_buf(),
            scripts,
            _workdir: None,
        });
    }

    if extractor.can_handle(path) {
        let workdir = working_dir()?;
        // Expand under the archive's stem so the content root keeps a
        // meaningful name when nothing is flattened
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extract_to = workdir.path().join(strip_known_extension(&file_name));
        runtime.create_dir_all(&extract_to)?;

        let root = extractor
            .extract(runtime, path, &extract_to)
            .with_context(|| format!("Failed to expand archive {:?}", path))?;
        let scripts = scan_scripts(runtime, &root)?;
        return Ok(Extracted {
            root,
            scripts,
            _workdir: Some(workdir),
        });
    }

    Ok(Extracted {
        root: path.to_path_buf(),
        scripts: vec![path.to_path_buf()],
        _workdir: None,
    })
}

/// Recursively collect script files under `root`, honoring the ignore policy
/// for every path component below `root`.
pub fn scan_scripts<R: Runtime>(runtime: &R, root: &Path) -> Result<Vec<PathBuf>> {
    let mut scripts = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        for entry in runtime.read_dir(&dir)? {
            let relative = entry.strip_prefix(root).unwrap_or(&entry);
            if is_ignored(relative) {
                debug!("Ignoring {:?}", entry);
                continue;
            }
            if runtime.is_dir(&entry) {
                pending.push(entry);
            } else if is_script(&entry) {
                scripts.push(entry);
            }
        }
    }

    scripts.sort();
    Ok(scripts)
}
