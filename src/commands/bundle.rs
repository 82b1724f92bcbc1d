//! Commands that work from a project's Jimfile.

use anyhow::{Context, Result};
use log::{debug, info};
use std::io;
use std::path::{Path, PathBuf};

use crate::{
    bundle::{Bundler, Manifest},
    package::Index,
    runtime::Runtime,
};

use super::config::Config;

const VENDOR_DIR: &str = "vendor";

/// Where a bundle or compressed bundle goes.
#[derive(Debug, Clone, PartialEq)]
enum Output {
    Stdout,
    File(PathBuf),
}

fn load_manifest<R: Runtime>(runtime: &R, config: &Config) -> Result<Manifest> {
    Manifest::load(runtime, &config.jimfile)
        .with_context(|| format!("Failed to load {}", config.jimfile.display()))
}

/// The store first, then the current directory.
fn index_roots<R: Runtime>(runtime: &R, config: &Config) -> Result<Vec<PathBuf>> {
    Ok(vec![
        config.store(runtime).lib_dir(),
        runtime.current_dir()?,
    ])
}

fn bundle_output(dest: Option<PathBuf>, manifest: &Manifest, config: &Config) -> Output {
    if config.stdout {
        return Output::Stdout;
    }
    dest.or_else(|| manifest.options.bundle_path.clone())
        .map_or(Output::Stdout, Output::File)
}

fn compress_output(dest: Option<PathBuf>, manifest: &Manifest, config: &Config) -> Output {
    if config.stdout {
        return Output::Stdout;
    }
    dest.or_else(|| manifest.options.compressed_path.clone())
        .or_else(|| {
            manifest
                .options
                .bundle_path
                .as_deref()
                .map(|path| path.with_extension("min.js"))
        })
        .map_or(Output::Stdout, Output::File)
}

fn vendor_dir(dir: Option<PathBuf>, manifest: &Manifest) -> PathBuf {
    dir.or_else(|| manifest.options.vendor_dir.clone())
        .unwrap_or_else(|| manifest.base_dir.join(VENDOR_DIR))
}

fn report_written(path: &Path, bytes: u64) {
    debug!("Wrote {} bytes to {:?}", bytes, path);
    println!("Wrote {}kb", bytes.div_ceil(1024));
}

/// Concatenate the Jimfile's scripts.
#[tracing::instrument(skip(runtime, config))]
pub fn bundle<R: Runtime>(runtime: R, dest: Option<PathBuf>, config: Config) -> Result<()> {
    let manifest = load_manifest(&runtime, &config)?;
    let index = Index::new(&runtime, index_roots(&runtime, &config)?);
    let bundler = Bundler::new(&runtime, &index);

    match bundle_output(dest, &manifest, &config) {
        Output::Stdout => {
            bundler.bundle_to(&manifest, &mut io::stdout().lock())?;
        }
        Output::File(path) => {
            let bytes = bundler.bundle_to_path(&manifest, &path)?;
            report_written(&path, bytes);
        }
    }
    Ok(())
}

/// Concatenate and minify the Jimfile's scripts.
#[tracing::instrument(skip(runtime, config))]
pub fn compress<R: Runtime>(runtime: R, dest: Option<PathBuf>, config: Config) -> Result<()> {
    let manifest = load_manifest(&runtime, &config)?;
    let index = Index::new(&runtime, index_roots(&runtime, &config)?);
    let bundler = Bundler::new(&runtime, &index);

    match compress_output(dest, &manifest, &config) {
        Output::Stdout => {
            bundler.compress_to(&manifest, &mut io::stdout().lock())?;
        }
        Output::File(path) => {
            let bytes = bundler.compress_to_path(&manifest, &path)?;
            report_written(&path, bytes);
        }
    }
    Ok(())
}

/// Copy the Jimfile's scripts into a vendor directory.
#[tracing::instrument(skip(runtime, config))]
pub fn vendor<R: Runtime>(runtime: R, dir: Option<PathBuf>, config: Config) -> Result<()> {
    let manifest = load_manifest(&runtime, &config)?;
    let index = Index::new(&runtime, index_roots(&runtime, &config)?);
    let bundler = Bundler::new(&runtime, &index);

    let dir = vendor_dir(dir, &manifest);
    let written = bundler.vendor(&manifest, &dir, config.force)?;
    println!("Vendored {} files to {}", written.len(), dir.display());
    Ok(())
}

/// Show which file each requirement resolves to.
#[tracing::instrument(skip(runtime, config))]
pub fn resolve<R: Runtime>(runtime: R, config: Config) -> Result<()> {
    let manifest = load_manifest(&runtime, &config)?;
    let index = Index::new(&runtime, index_roots(&runtime, &config)?);
    let bundler = Bundler::new(&runtime, &index);

    info!("Files:");
    for file in bundler.resolve(&manifest)? {
        println!("{} | {}", file.requirement, file.path.display());
    }
    Ok(())
}

/// Vendor into `dir`, then bundle and compress to their configured paths.
#[tracing::instrument(skip(runtime, config))]
pub fn pack<R: Runtime + Clone>(runtime: R, dir: Option<PathBuf>, config: Config) -> Result<()> {
    info!("Packing the Jimfile for this project");
    vendor(runtime.clone(), dir, config.clone())?;
    bundle(runtime.clone(), None, config.clone())?;
    compress(runtime, None, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::JimError;
    use crate::runtime::RealRuntime;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    struct Project {
        jimhome: TempDir,
        project: TempDir,
    }

    impl Project {
        fn new(jimfile: &str) -> Self {
            let jimhome = tempdir().unwrap();
            let project = tempdir().unwrap();
            for (dir, content) in [
                ("jquery-1.3.2", "var jQuery = 1;"),
                ("jquery-1.4.1", "var jQuery = 2;"),
                ("sammy-0.5.0", "var Sammy = {};"),
            ] {
                let package = jimhome.path().join("lib").join(dir);
                fs::create_dir_all(&package).unwrap();
                let (name, _) = dir.rsplit_once('-').unwrap();
                fs::write(package.join(format!("{}.js", name)), content).unwrap();
            }
            fs::write(project.path().join("Jimfile"), jimfile).unwrap();
            Self { jimhome, project }
        }

        fn config(&self, force: bool) -> Config {
            Config {
                jimhome: self.jimhome.path().to_path_buf(),
                jimfile: self.project.path().join("Jimfile"),
                force,
                stdout: false,
            }
        }

        fn path(&self, rel: &str) -> PathBuf {
            self.project.path().join(rel)
        }
    }

    fn manifest(content: &str) -> Manifest {
        Manifest::parse(content, Path::new("/project")).unwrap()
    }

    fn config(stdout: bool) -> Config {
        Config {
            jimhome: PathBuf::from("/jim"),
            jimfile: PathBuf::from("/project/Jimfile"),
            force: false,
            stdout,
        }
    }

    #[test]
    fn test_bundle_output_precedence() {
        let with_path = manifest("// bundle_path: public/bundled.js\njquery\n");
        let without = manifest("jquery\n");

        assert_eq!(
            bundle_output(Some(PathBuf::from("out.js")), &with_path, &config(false)),
            Output::File(PathBuf::from("out.js"))
        );
        assert_eq!(
            bundle_output(None, &with_path, &config(false)),
            Output::File(PathBuf::from("/project/public/bundled.js"))
        );
        assert_eq!(bundle_output(None, &without, &config(false)), Output::Stdout);
        assert_eq!(
            bundle_output(Some(PathBuf::from("out.js")), &with_path, &config(true)),
            Output::Stdout
        );
    }

    #[test]
    fn test_compress_output_derives_from_bundle_path() {
        let derived = manifest("// bundle_path: public/bundled.js\njquery\n");
        let explicit = manifest(
            "// bundle_path: public/bundled.js\n// compressed_path: public/small.js\njquery\n",
        );

        assert_eq!(
            compress_output(None, &derived, &config(false)),
            Output::File(PathBuf::from("/project/public/bundled.min.js"))
        );
        assert_eq!(
            compress_output(None, &explicit, &config(false)),
            Output::File(PathBuf::from("/project/public/small.js"))
        );
        assert_eq!(
            compress_output(None, &manifest("jquery\n"), &config(false)),
            Output::Stdout
        );
    }

    #[test]
    fn test_vendor_dir_defaults_beside_jimfile() {
        assert_eq!(
            vendor_dir(None, &manifest("jquery\n")),
            PathBuf::from("/project/vendor")
        );
        assert_eq!(
            vendor_dir(None, &manifest("// vendor_dir: js/lib\njquery\n")),
            PathBuf::from("/project/js/lib")
        );
        assert_eq!(
            vendor_dir(Some(PathBuf::from("/tmp/v")), &manifest("jquery\n")),
            PathBuf::from("/tmp/v")
        );
    }

    #[test]
    fn test_bundle_writes_configured_path() {
        let project = Project::new("// bundle_path: public/bundled.js\njquery\nsammy 0.5.0\n");

        bundle(RealRuntime, None, project.config(false)).unwrap();

        assert_eq!(
            fs::read_to_string(project.path("public/bundled.js")).unwrap(),
            "var jQuery = 2;\nvar Sammy = {};"
        );
    }

    #[test]
    fn test_pack_vendors_bundles_and_compresses() {
        let project = Project::new(
            "// bundle_path: public/bundled.js\n// vendor_dir: public/vendor\njquery 1.3.2\n",
        );

        pack(RealRuntime, None, project.config(false)).unwrap();

        assert!(project.path("public/vendor/jquery.js").exists());
        assert!(project.path("public/bundled.js").exists());
        assert!(project.path("public/bundled.min.js").exists());
    }

    #[test]
    fn test_vendor_refuses_existing_without_force() {
        let project = Project::new("jquery\n");
        fs::create_dir_all(project.path("vendor")).unwrap();
        fs::write(project.path("vendor/jquery.js"), "mine").unwrap();

        let err = vendor(RealRuntime, None, project.config(false)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<JimError>(),
            Some(JimError::FileExists(_))
        ));
        assert_eq!(
            fs::read_to_string(project.path("vendor/jquery.js")).unwrap(),
            "mine"
        );

        vendor(RealRuntime, None, project.config(true)).unwrap();
        assert_eq!(
            fs::read_to_string(project.path("vendor/jquery.js")).unwrap(),
            "var jQuery = 2;"
        );
    }

    #[test]
    fn test_resolve_reports_unresolved() {
        let project = Project::new("jquery\nmissing 1.0\n");

        let err = resolve(RealRuntime, project.config(false)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<JimError>(),
            Some(JimError::Resolution { unresolved }) if *unresolved == ["missing 1.0"]
        ));
    }
}
