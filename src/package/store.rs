//! The local package store.
//!
//! Layout: `<jimhome>/lib/<name>-<version>/<name>.js` with a `package.json`
//! beside it. The store is the only writer of this tree.

use anyhow::{Context, Result};
use log::info;
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;

use super::Meta;

const LIB_DIR: &str = "lib";
const META_FILE: &str = "package.json";

/// Store for locally installed packages.
pub struct Store<'a, R: Runtime> {
    runtime: &'a R,
    jimhome: PathBuf,
}

impl<'a, R: Runtime> Store<'a, R> {
    pub fn new(runtime: &'a R, jimhome: PathBuf) -> Self {
        Self { runtime, jimhome }
    }

    /// Returns: `<jimhome>/lib`
    pub fn lib_dir(&self) -> PathBuf {
        self.jimhome.join(LIB_DIR)
    }

    /// Returns: `<jimhome>/lib/<name>-<version>`
    pub fn package_dir(&self, name: &str, version: &str) -> PathBuf {
        self.lib_dir().join(format!("{}-{}", name, version))
    }

    /// Returns: `<jimhome>/lib/<name>-<version>/<name>.js`
    pub fn script_path(&self, name: &str, version: &str) -> PathBuf {
        self.package_dir(name, version).join(format!("{}.js", name))
    }

    /// Returns: `<jimhome>/lib/<name>-<version>/package.json`
    pub fn meta_path(&self, name: &str, version: &str) -> PathBuf {
        self.package_dir(name, version).join(META_FILE)
    }

    /// Create `<jimhome>/lib` if needed.
    pub fn ensure_lib_dir(&self) -> Result<PathBuf> {
        let lib_dir = self.lib_dir();
        if !self.runtime.exists(&lib_dir) {
            self.runtime.create_dir_all(&lib_dir)?;
        }
        Ok(lib_dir)
    }

    /// Load package metadata, `None` if the package has no record.
    pub fn load_meta(&self, name: &str, version: &str) -> Result<Option<Meta>> {
        let meta_path = self.meta_path(name, version);
        if !self.runtime.exists(&meta_path) {
            return Ok(None);
        }
        Meta::load(self.runtime, &meta_path).map(Some)
    }

    pub fn save_meta(&self, name: &str, version: &str, meta: &Meta) -> Result<()> {
        let meta_path = self.meta_path(name, version);

        if let Some(parent) = meta_path.parent()
            && !self.runtime.exists(parent)
        {
            self.runtime.create_dir_all(parent)?;
        }

        meta.save(self.runtime, &meta_path)
    }

    /// Remove an installed entry, a package directory or a single script.
    #[tracing::instrument(skip(self))]
    pub fn delete(&self, path: &Path) -> Result<()> {
        if self.runtime.is_dir(path) {
            self.runtime
                .remove_dir_all(path)
                .with_context(|| format!("Failed to remove {:?}", path))?;
        } else if self.runtime.exists(path) {
            self.runtime
                .remove_file(path)
                .with_context(|| format!("Failed to remove {:?}", path))?;
        } else {
            return Ok(());
        }
        info!("Removed {}", path.display());
        Ok(())
    }
}
