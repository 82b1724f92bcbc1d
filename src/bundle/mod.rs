//! Turning a project's requirements into output: one concatenated bundle, a
//! minified bundle, or copies of the scripts in a vendor directory.
//!
//! Nothing is cached between calls; every operation resolves the manifest
//! against the index again.

mod manifest;
mod minify;

pub use manifest::{JIMFILE, Manifest, ManifestOptions, Requirement, TEMPLATE};
pub use minify::{JsMinifier, Minifier};

use anyhow::{Context, Result, bail};
use log::{debug, info};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::JimError;
use crate::package::Index;
use crate::runtime::Runtime;

/// A requirement and the script it resolved to.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFile {
    pub requirement: Requirement,
    pub path: PathBuf,
}

const SEPARATOR: &str = "\n";

pub struct Bundler<'a, R: Runtime, M: Minifier = JsMinifier> {
    runtime: &'a R,
    index: &'a Index<'a, R>,
    minifier: M,
}

impl<'a, R: Runtime> Bundler<'a, R, JsMinifier> {
    pub fn new(runtime: &'a R, index: &'a Index<'a, R>) -> Self {
        Self::with_minifier(runtime, index, JsMinifier)
    }
}

impl<'a, R: Runtime, M: Minifier> Bundler<'a, R, M> {
    pub fn with_minifier(runtime: &'a R, index: &'a Index<'a, R>, minifier: M) -> Self {
        Self {
            runtime,
            index,
            minifier,
        }
    }

    /// Resolve every requirement, in order. Fails with
    /// [`JimError::Resolution`] naming all requirements that matched nothing.
    #[tracing::instrument(skip(self, manifest))]
    pub fn resolve(&self, manifest: &Manifest) -> Result<Vec<ResolvedFile>> {
        let mut resolved = Vec::with_capacity(manifest.requirements.len());
        let mut unresolved = Vec::new();

        for requirement in &manifest.requirements {
            match self.resolve_one(requirement, &manifest.base_dir)? {
                Some(path) => {
                    debug!("{} -> {:?}", requirement, path);
                    resolved.push(ResolvedFile {
                        requirement: requirement.clone(),
                        path,
                    });
                }
                None => unresolved.push(requirement.to_string()),
            }
        }

        if !unresolved.is_empty() {
            return Err(JimError::Resolution { unresolved }.into());
        }
        Ok(resolved)
    }

    fn resolve_one(&self, requirement: &Requirement, base_dir: &Path) -> Result<Option<PathBuf>> {
        match requirement {
            Requirement::Package { name, version } => {
                match self.index.find(name, version.as_deref())? {
                    Some(entry) => self.index.script_file(&entry),
                    None => Ok(None),
                }
            }
            Requirement::File(path) => {
                let path = base_dir.join(path);
                Ok(self.runtime.exists(&path).then_some(path))
            }
        }
    }

    fn render(&self, manifest: &Manifest, compress: bool) -> Result<String> {
        let mut parts = Vec::new();
        for file in self.resolve(manifest)? {
            let content = self
                .runtime
                .read_to_string(&file.path)
                .with_context(|| format!("Failed to read {:?}", file.path))?;
            if compress {
                parts.push(
                    self.minifier
                        .minify(&content)
                        .with_context(|| format!("Failed to compress {:?}", file.path))?,
                );
            } else {
                parts.push(content);
            }
        }
        Ok(parts.join(SEPARATOR))
    }

    /// The contents of all resolved scripts, joined by newlines.
    pub fn bundle(&self, manifest: &Manifest) -> Result<String> {
        self.render(manifest, false)
    }

    /// Like [`Bundler::bundle`], with each script minified first.
    pub fn compress(&self, manifest: &Manifest) -> Result<String> {
        self.render(manifest, true)
    }

    pub fn bundle_to<W: Write>(&self, manifest: &Manifest, writer: &mut W) -> Result<u64> {
        write_all(writer, &self.bundle(manifest)?)
    }

    pub fn compress_to<W: Write>(&self, manifest: &Manifest, writer: &mut W) -> Result<u64> {
        write_all(writer, &self.compress(manifest)?)
    }

    pub fn bundle_to_path(&self, manifest: &Manifest, path: &Path) -> Result<u64> {
        let content = self.bundle(manifest)?;
        self.write_output(path, &content)
    }

    pub fn compress_to_path(&self, manifest: &Manifest, path: &Path) -> Result<u64> {
        let content = self.compress(manifest)?;
        self.write_output(path, &content)
    }

    fn write_output(&self, path: &Path, content: &str) -> Result<u64> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !self.runtime.exists(parent)
        {
            self.runtime.create_dir_all(parent)?;
        }
        self.runtime.write(path, content.as_bytes())?;
        info!("Wrote {}", path.display());
        Ok(content.len() as u64)
    }

    /// Copy every resolved script into `dir` as `<requirement name>.js`.
    ///
    /// Two requirements sharing a name would land on the same file, so that
    /// is an error. Unless `force` is set, nothing is copied when any
    /// destination already exists; the error names the first one.
    #[tracing::instrument(skip(self, manifest))]
    pub fn vendor(&self, manifest: &Manifest, dir: &Path, force: bool) -> Result<Vec<PathBuf>> {
        let mut plan: Vec<(PathBuf, PathBuf)> = Vec::new();
        let mut claimed: HashMap<PathBuf, Requirement> = HashMap::new();

        for file in self.resolve(manifest)? {
            let dest = dir.join(format!("{}.js", file.requirement.name()));
            if let Some(first) = claimed.get(&dest) {
                bail!(
                    "Cannot vendor both '{}' and '{}' to {}",
                    first,
                    file.requirement,
                    dest.display()
                );
            }
            claimed.insert(dest.clone(), file.requirement);
            plan.push((file.path, dest));
        }

        if !force
            && let Some((_, clash)) = plan.iter().find(|(_, dest)| self.runtime.exists(dest))
        {
            return Err(JimError::FileExists(clash.clone()).into());
        }

        self.runtime.create_dir_all(dir)?;
        let mut written = Vec::with_capacity(plan.len());
        for (source, dest) in plan {
            self.runtime
                .copy(&source, &dest)
                .with_context(|| format!("Failed to vendor {:?}", source))?;
            info!("Vendored {} to {}", source.display(), dest.display());
            written.push(dest);
        }
        Ok(written)
    }
}

fn write_all<W: Write>(writer: &mut W, content: &str) -> Result<u64> {
    writer
        .write_all(content.as_bytes())
        .context("Failed to write bundle")?;
    writer.flush().context("Failed to flush bundle")?;
    Ok(content.len() as u64)
}
