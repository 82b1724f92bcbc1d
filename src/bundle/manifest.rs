//! The `Jimfile`: a project's ordered list of requirements.
//!
//! ```text
//! // bundle_path: public/javascripts/bundled.js
//! // compressed_path: public/javascripts/bundled.min.js
//! jquery 1.4.1
//! sammy
//! lib/app.js
//! ```
//!
//! One requirement per line, `name [version]` or a path to a script. Lines
//! starting with `//` or `#` are comments, except the `// key: value` option
//! lines shown above.

use anyhow::{Context, Result};
use log::debug;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::JimError;
use crate::runtime::Runtime;

pub const JIMFILE: &str = "Jimfile";

pub const TEMPLATE: &str = "\
// Jimfile: the scripts this project depends on, in bundle order.
// Each line is `name [version]` (latest installed version if omitted)
// or the path to a script relative to this file.
//
// bundle_path: public/javascripts/bundled.js
// compressed_path: public/javascripts/compressed.js
// vendor_dir: public/javascripts/vendor

jquery
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    Package {
        name: String,
        version: Option<String>,
    },
    /// A script included as is, relative to the manifest's directory.
    File(PathBuf),
}

impl Requirement {
    /// The name a vendored copy is saved under, without extension.
    pub fn name(&self) -> String {
        match self {
            Requirement::Package { name, .. } => name.clone(),
            Requirement::File(path) => path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Requirement::Package {
                name,
                version: Some(version),
            } => write!(f, "{} {}", name, version),
            Requirement::Package { name, version: None } => write!(f, "{}", name),
            Requirement::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Output locations declared in option comments, resolved against the
/// manifest's directory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManifestOptions {
    pub bundle_path: Option<PathBuf>,
    pub compressed_path: Option<PathBuf>,
    pub vendor_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    pub requirements: Vec<Requirement>,
    pub options: ManifestOptions,
    /// Directory file requirements and option paths are relative to.
    pub base_dir: PathBuf,
}

impl Manifest {
    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, path: &Path) -> Result<Self> {
        let content = runtime
            .read_to_string(path)
            .with_context(|| format!("Failed to read Jimfile at {:?}", path))?;
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self::parse(&content, &base_dir)
    }

    pub fn parse(content: &str, base_dir: &Path) -> Result<Self> {
        let mut manifest = Manifest {
            requirements: Vec::new(),
            options: ManifestOptions::default(),
            base_dir: base_dir.to_path_buf(),
        };

        for (index, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(comment) = line.strip_prefix("//") {
                manifest.apply_option(comment);
                continue;
            }
            if line.starts_with('#') {
                continue;
            }

            let requirement = parse_requirement(line).map_err(|message| JimError::Manifest {
                line: index + 1,
                message,
            })?;
            manifest.requirements.push(requirement);
        }

        debug!("Parsed {} requirements", manifest.requirements.len());
        Ok(manifest)
    }

    fn apply_option(&mut self, comment: &str) {
        let Some((key, value)) = comment.split_once(':') else {
            return;
        };
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        let path = Some(self.base_dir.join(value));
        match key.trim() {
            "bundle_path" => self.options.bundle_path = path,
            "compressed_path" => self.options.compressed_path = path,
            "vendor_dir" => self.options.vendor_dir = path,
            _ => {}
        }
    }
}

fn parse_requirement(line: &str) -> std::result::Result<Requirement, String> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    match tokens.as_slice() {
        [path] if path.contains('/') || path.ends_with(".js") => {
            Ok(Requirement::File(PathBuf::from(path)))
        }
        [name] => Ok(Requirement::Package {
            name: name.to_string(),
            version: None,
        }),
        [path, _] if path.contains('/') || path.ends_with(".js") => {
            Err(format!("a script path takes no version: {}", line))
        }
        [name, version] => Ok(Requirement::Package {
            name: name.to_string(),
            version: Some(version.to_string()),
        }),
        _ => Err(format!("expected `name [version]`, got {}", line)),
    }
}
