use anyhow::Result;
use log::debug;
use std::path::PathBuf;

use crate::bundle::JIMFILE;
use crate::package::Store;
use crate::runtime::Runtime;

use super::paths::{default_jimhome, expand_home};

/// Settings shared by every command, resolved from the global options.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub jimhome: PathBuf,
    pub jimfile: PathBuf,
    /// Overwrite existing files and installs.
    pub force: bool,
    /// Write bundles to stdout instead of files.
    pub stdout: bool,
}

impl Config {
    pub fn new<R: Runtime>(
        runtime: &R,
        jimhome: Option<PathBuf>,
        jimfile: Option<PathBuf>,
        force: bool,
        stdout: bool,
    ) -> Result<Self> {
        let jimhome = match jimhome {
            Some(path) => expand_home(runtime, &path)?,
            None => default_jimhome(runtime)?,
        };
        let jimfile = jimfile.unwrap_or_else(|| PathBuf::from(JIMFILE));
        debug!("Using jimhome {:?} and Jimfile {:?}", jimhome, jimfile);

        Ok(Self {
            jimhome,
            jimfile,
            force,
            stdout,
        })
    }

    pub fn store<'a, R: Runtime>(&self, runtime: &'a R) -> Store<'a, R> {
        Store::new(runtime, self.jimhome.clone())
    }
}
