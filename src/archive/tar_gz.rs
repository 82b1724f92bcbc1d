use crate::runtime::Runtime;
use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use log::debug;
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use tar::Archive;

use super::{ArchiveExtractor, content_root};

/// Extractor for tarballs, gzipped (.tar.gz, .tgz) or plain (.tar)
pub struct TarGzExtractor;

impl TarGzExtractor {
    fn is_gzipped(archive_path: &Path) -> bool {
        let name = archive_path.to_string_lossy().to_lowercase();
        name.ends_with(".tar.gz") || name.ends_with(".tgz")
    }
}

/// Entries with absolute paths or `..` components would land outside the
/// extraction directory.
fn is_safe(path: &Path) -> bool {
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

impl ArchiveExtractor for TarGzExtractor {
    fn can_handle(&self, archive_path: &Path) -> bool {
        let name = archive_path.to_string_lossy().to_lowercase();
        Self::is_gzipped(archive_path) || name.ends_with(".tar")
    }

    fn extract<R: Runtime>(
        &self,
        runtime: &R,
        archive_path: &Path,
        extract_to: &Path,
    ) -> Result<PathBuf> {
        debug!("Extracting tarball {:?} to {:?}", archive_path, extract_to);

        let file = runtime
            .open(archive_path)
            .with_context(|| format!("Failed to open archive at {:?}", archive_path))?;
        let reader: Box<dyn Read> = if Self::is_gzipped(archive_path) {
            Box::new(GzDecoder::new(file))
        } else {
            Box::new(file)
        };
        let mut archive = Archive::new(reader);

        for entry in archive
            .entries()
            .with_context(|| format!("Failed to read tarball {:?}", archive_path))?
        {
            let mut entry = entry.context("Failed to read tar entry")?;
            let entry_path = entry.path().context("Invalid path in tar entry")?.into_owned();

            if !is_safe(&entry_path) {
                debug!("Skipping entry with unsafe path {:?}", entry_path);
                continue;
            }
            let full_path = extract_to.join(&entry_path);
            let entry_type = entry.header().entry_type();

            if entry_type.is_dir() {
                runtime.create_dir_all(&full_path)?;
                continue;
            }
            if !entry_type.is_file() {
                debug!("Skipping non-regular entry {:?}", entry_path);
                continue;
            }

            if let Some(parent) = full_path.parent() {
                runtime.create_dir_all(parent)?;
            }
            let mut dest_file = runtime.create_file(&full_path)?;
            std::io::copy(&mut entry, &mut dest_file)
                .with_context(|| format!("Failed to extract file {:?}", full_path))?;
        }

        content_root(runtime, extract_to)
    }
}
