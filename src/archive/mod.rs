mod tar_gz;
mod zip;

use crate::runtime::Runtime;
use anyhow::{Result, anyhow};
use log::debug;
use std::path::{Path, PathBuf};

pub use tar_gz::TarGzExtractor;
pub use zip::ZipExtractor;

/// Trait for format-specific archive extractors
pub trait ArchiveExtractor: Send + Sync {
    /// Check if this extractor can handle the given archive format
    fn can_handle(&self, archive_path: &Path) -> bool;

    /// Expand the archive into `extract_to` and return the directory holding
    /// its content (see [`content_root`]).
    fn extract<R: Runtime>(
        &self,
        runtime: &R,
        archive_path: &Path,
        extract_to: &Path,
    ) -> Result<PathBuf>;
}

/// Dispatcher that selects the appropriate extractor based on archive format.
pub struct ArchiveExtractorImpl {
    tar_gz: TarGzExtractor,
    zip: ZipExtractor,
}

impl Default for ArchiveExtractorImpl {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveExtractorImpl {
    pub fn new() -> Self {
        Self {
            tar_gz: TarGzExtractor,
            zip: ZipExtractor,
        }
    }
}

impl ArchiveExtractor for ArchiveExtractorImpl {
    fn can_handle(&self, archive_path: &Path) -> bool {
        self.tar_gz.can_handle(archive_path) || self.zip.can_handle(archive_path)
    }

    #[tracing::instrument(skip(self, runtime))]
    fn extract<R: Runtime>(
        &self,
        runtime: &R,
        archive_path: &Path,
        extract_to: &Path,
    ) -> Result<PathBuf> {
        if self.tar_gz.can_handle(archive_path) {
            return self.tar_gz.extract(runtime, archive_path, extract_to);
        }
        if self.zip.can_handle(archive_path) {
            return self.zip.extract(runtime, archive_path, extract_to);
        }
        Err(anyhow!(
            "Unsupported archive format: {}",
            archive_path.display()
        ))
    }
}

/// Archives often wrap everything in one top-level directory
/// (`jquery.metadata-2.0/...`). When that is the case the content root is
/// that directory, otherwise it is `extract_to` itself.
pub(crate) fn content_root<R: Runtime>(runtime: &R, extract_to: &Path) -> Result<PathBuf> {
    let entries = runtime.read_dir(extract_to)?;
    match entries.as_slice() {
        [] => Err(anyhow!("Archive appears to be empty.")),
        [single] if runtime.is_dir(single) => {
            debug!("Archive has a single top-level directory {:?}", single);
            Ok(single.clone())
        }
        _ => Ok(extract_to.to_path_buf()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{MockRuntime, RealRuntime};
    use anyhow::Result;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use mockall::predicate::eq;
    use std::fs::{self, File};
    use tar::Builder;
    use tempfile::tempdir;

    fn create_test_tar_gz(path: &Path, files: &[(&str, &str)]) -> Result<()> {
        let file = File::create(path)?;
        let enc = GzEncoder::new(file, Compression::default());
        let mut tar = Builder::new(enc);

        for (name, content) in files {
            let mut header = tar::Header::new_gnu();
            header.set_path(name)?;
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            tar.append(&header, content.as_bytes())?;
        }

        tar.into_inner()?.finish()?;
        Ok(())
    }

    fn create_test_zip(path: &Path, files: &[(&str, &str)]) -> Result<()> {
        use ::zip::CompressionMethod;
        use ::zip::ZipWriter;
        use ::zip::write::FileOptions;
        use std::io::Write;

        let file = File::create(path)?;
        let mut zip = ZipWriter::new(file);
        let options: FileOptions<()> =
            FileOptions::default().compression_method(CompressionMethod::Deflated);

        for (name, content) in files {
            zip.start_file(*name, options)?;
            zip.write_all(content.as_bytes())?;
        }

        zip.finish()?;
        Ok(())
    }

    #[test]
    fn test_extractor_impl_can_handle() {
        let extractor = ArchiveExtractorImpl::new();
        assert!(extractor.can_handle(Path::new("sammy-0.5.0.tar.gz")));
        assert!(extractor.can_handle(Path::new("sammy-0.5.0.tgz")));
        assert!(extractor.can_handle(Path::new("jquery.metadata-2.0.zip")));
        assert!(!extractor.can_handle(Path::new("jquery-1.4.1.js")));
    }

    #[test]
    fn test_extractor_impl_dispatches_to_tar_gz() -> Result<()> {
        let dir = tempdir()?;
        let archive_path = dir.path().join("sammy-0.5.0.tar.gz");
        let extract_path = dir.path().join("extracted");
        fs::create_dir(&extract_path)?;

        create_test_tar_gz(&archive_path, &[("sammy-0.5.0/lib/sammy.js", "Sammy")])?;

        let root = ArchiveExtractorImpl::new().extract(&RealRuntime, &archive_path, &extract_path)?;

        assert_eq!(root, extract_path.join("sammy-0.5.0"));
        assert_eq!(fs::read_to_string(root.join("lib/sammy.js"))?, "Sammy");
        Ok(())
    }

    #[test]
    fn test_extractor_impl_dispatches_to_zip() -> Result<()> {
        let dir = tempdir()?;
        let archive_path = dir.path().join("jquery.metadata-2.0.zip");
        let extract_path = dir.path().join("extracted");
        fs::create_dir(&extract_path)?;

        create_test_zip(
            &archive_path,
            &[("jquery.metadata.js", "meta"), ("test/test.js", "test")],
        )?;

        let root = ArchiveExtractorImpl::new().extract(&RealRuntime, &archive_path, &extract_path)?;

        assert_eq!(root, extract_path);
        assert_eq!(fs::read_to_string(root.join("jquery.metadata.js"))?, "meta");
        Ok(())
    }

    #[test]
    fn test_extractor_impl_unsupported_format() {
        let result = ArchiveExtractorImpl::new().extract(
            &RealRuntime,
            Path::new("/tmp/file.rar"),
            Path::new("/tmp/out"),
        );
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Unsupported archive format")
        );
    }

    #[test]
    fn test_content_root_empty_is_error() {
        let mut runtime = MockRuntime::new();
        let dest = PathBuf::from("/tmp/extract");

        runtime
            .expect_read_dir()
            .with(eq(dest.clone()))
            .returning(|_| Ok(vec![]));

        let err = content_root(&runtime, &dest).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_content_root_single_file_stays_at_top() {
        let mut runtime = MockRuntime::new();
        let dest = PathBuf::from("/tmp/extract");
        let only = dest.join("jquery.js");

        runtime
            .expect_read_dir()
            .with(eq(dest.clone()))
            .returning(|p| Ok(vec![p.join("jquery.js")]));
        runtime
            .expect_is_dir()
            .with(eq(only))
            .returning(|_| false);

        assert_eq!(content_root(&runtime, &dest).unwrap(), dest);
    }
}
