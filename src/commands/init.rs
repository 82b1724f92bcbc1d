use anyhow::Result;
use log::debug;
use std::path::PathBuf;

use crate::bundle::{JIMFILE, TEMPLATE};
use crate::error::JimError;
use crate::runtime::Runtime;

use super::config::Config;

/// Write a starter Jimfile into `dir`, or at the configured Jimfile path.
#[tracing::instrument(skip(runtime, config))]
pub fn init<R: Runtime>(runtime: R, dir: Option<PathBuf>, config: Config) -> Result<()> {
    let jimfile = match dir {
        Some(dir) => dir.join(JIMFILE),
        None => config.jimfile.clone(),
    };
    debug!("Initializing {:?} force={}", jimfile, config.force);

    if runtime.exists(&jimfile) && !config.force {
        return Err(JimError::FileExists(jimfile).into());
    }

    if let Some(parent) = jimfile.parent()
        && !parent.as_os_str().is_empty()
        && !runtime.exists(parent)
    {
        runtime.create_dir_all(parent)?;
    }
    runtime.write(&jimfile, TEMPLATE.as_bytes())?;

    println!("Wrote Jimfile to {}", jimfile.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use mockall::predicate::eq;

    fn config(force: bool) -> Config {
        Config {
            jimhome: PathBuf::from("/jim"),
            jimfile: PathBuf::from("/project/Jimfile"),
            force,
            stdout: false,
        }
    }

    #[test]
    fn test_init_writes_template() {
        let mut runtime = MockRuntime::new();
        let jimfile = PathBuf::from("/web/Jimfile");

        // --- Nothing there yet ---
        runtime
            .expect_exists()
            .with(eq(jimfile.clone()))
            .returning(|_| false);
        runtime
            .expect_exists()
            .with(eq(PathBuf::from("/web")))
            .returning(|_| true);

        // --- Template is written ---
        runtime
            .expect_write()
            .withf(|p, c| p == std::path::Path::new("/web/Jimfile") && c == TEMPLATE.as_bytes())
            .times(1)
            .returning(|_, _| Ok(()));

        init(runtime, Some(PathBuf::from("/web")), config(false)).unwrap();
    }

    #[test]
    fn test_init_refuses_existing() {
        let mut runtime = MockRuntime::new();

        runtime
            .expect_exists()
            .with(eq(PathBuf::from("/project/Jimfile")))
            .returning(|_| true);
        runtime.expect_write().never();

        let err = init(runtime, None, config(false)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<JimError>(),
            Some(JimError::FileExists(path)) if path == &PathBuf::from("/project/Jimfile")
        ));
    }

    #[test]
    fn test_init_force_overwrites() {
        let mut runtime = MockRuntime::new();

        runtime.expect_exists().returning(|_| true);
        runtime
            .expect_write()
            .times(1)
            .returning(|_, _| Ok(()));

        init(runtime, None, config(true)).unwrap();
    }
}
