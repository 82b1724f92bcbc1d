//! Discovery of packages by scanning directory names.
//!
//! An index is built over one or more roots. Every immediate child named
//! `<name>-<version>` is an entry: a package directory in the store, or a
//! `<name>-<version>.js` script in a project directory. Nothing is persisted;
//! a scan happens once per [`Index`] and is reused for its lifetime.

use anyhow::Result;
use log::debug;
use std::cell::OnceCell;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;

use super::VersionComparator;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub name: String,
    pub version: String,
    /// The package directory, or the script itself for file entries.
    pub path: PathBuf,
}

/// Split `<name>-<version>` on the last `-`. The version must start with a
/// digit.
pub fn parse_entry_name(entry_name: &str) -> Option<(&str, &str)> {
    let (name, version) = entry_name.rsplit_once('-')?;
    if name.is_empty() || !version.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    Some((name, version))
}

fn is_script(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "js")
}

pub struct Index<'a, R: Runtime> {
    runtime: &'a R,
    roots: Vec<PathBuf>,
    entries: OnceCell<Vec<IndexEntry>>,
}

impl<'a, R: Runtime> Index<'a, R> {
    pub fn new(runtime: &'a R, roots: Vec<PathBuf>) -> Self {
        Self {
            runtime,
            roots,
            entries: OnceCell::new(),
        }
    }

    /// The roots this index scans, in priority order.
    pub fn directories(&self) -> &[PathBuf] {
        &self.roots
    }

    fn entries(&self) -> Result<&[IndexEntry]> {
        if let Some(entries) = self.entries.get() {
            return Ok(entries);
        }
        let scanned = self.scan()?;
        Ok(self.entries.get_or_init(|| scanned))
    }

    #[tracing::instrument(skip(self))]
    fn scan(&self) -> Result<Vec<IndexEntry>> {
        let mut entries = Vec::new();
        let mut seen = HashSet::new();

        for root in &self.roots {
            if !self.runtime.is_dir(root) {
                debug!("Skipping missing index root {:?}", root);
                continue;
            }

            let mut children = self.runtime.read_dir(root)?;
            children.sort();

            for child in children {
                let Some(file_name) = child.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                let entry_name = if self.runtime.is_dir(&child) {
                    file_name
                } else if is_script(&child) {
                    file_name.strip_suffix(".js").unwrap_or(file_name)
                } else {
                    continue;
                };
                let Some((name, version)) = parse_entry_name(entry_name) else {
                    continue;
                };
                if !seen.insert((name.to_string(), version.to_string())) {
                    debug!("Ignoring duplicate {}-{} at {:?}", name, version, child);
                    continue;
                }
                entries.push(IndexEntry {
                    name: name.to_string(),
                    version: version.to_string(),
                    path: child.clone(),
                });
            }
        }

        debug!("Indexed {} entries", entries.len());
        Ok(entries)
    }

    /// All entries grouped by name, versions newest first. `search` keeps the
    /// names containing it, ignoring case.
    pub fn list(&self, search: Option<&str>) -> Result<BTreeMap<String, Vec<(String, PathBuf)>>> {
        let needle = search.map(str::to_lowercase);
        let mut grouped: BTreeMap<String, Vec<(String, PathBuf)>> = BTreeMap::new();

        for entry in self.entries()? {
            if let Some(needle) = &needle
                && !entry.name.to_lowercase().contains(needle.as_str())
            {
                continue;
            }
            grouped
                .entry(entry.name.clone())
                .or_default()
                .push((entry.version.clone(), entry.path.clone()));
        }

        for versions in grouped.values_mut() {
            VersionComparator::sort_descending(versions, |(version, _)| version.as_str());
        }
        Ok(grouped)
    }

    fn matching(&self, name: &str, version: Option<&str>) -> Result<Vec<&IndexEntry>> {
        let mut matches: Vec<&IndexEntry> = self
            .entries()?
            .iter()
            .filter(|e| e.name == name && version.is_none_or(|v| e.version == v))
            .collect();
        VersionComparator::sort_descending(&mut matches, |e| e.version.as_str());
        Ok(matches)
    }

    /// Paths of every entry named `name` (and at `version`, if given),
    /// newest first.
    pub fn find_all(&self, name: &str, version: Option<&str>) -> Result<Vec<PathBuf>> {
        Ok(self
            .matching(name, version)?
            .into_iter()
            .map(|e| e.path.clone())
            .collect())
    }

    /// The newest entry named `name` (and at `version`, if given).
    pub fn find(&self, name: &str, version: Option<&str>) -> Result<Option<IndexEntry>> {
        Ok(self.matching(name, version)?.first().map(|e| (*e).clone()))
    }

    /// The script to use for an entry: `<name>.js` in a package directory,
    /// else its first script, or the entry itself when it is a file.
    pub fn script_file(&self, entry: &IndexEntry) -> Result<Option<PathBuf>> {
        if !self.runtime.is_dir(&entry.path) {
            return Ok(Some(entry.path.clone()));
        }

        let preferred = entry.path.join(format!("{}.js", entry.name));
        if self.runtime.exists(&preferred) {
            return Ok(Some(preferred));
        }

        let mut scripts: Vec<PathBuf> = self
            .runtime
            .read_dir(&entry.path)?
            .into_iter()
            .filter(|p| is_script(p))
            .collect();
        scripts.sort();
        Ok(scripts.into_iter().next())
    }
}
