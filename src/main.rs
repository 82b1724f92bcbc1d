use anyhow::Result;
use clap::Parser;
use jim::commands::{self, Config};
use jim::runtime::RealRuntime;
use std::path::PathBuf;

/// jim - JavaScript library installer and bundler
///
/// Install libraries from URLs or local paths into a local store, then
/// bundle, compress or vendor the ones a project's Jimfile asks for.
///
/// Examples:
///   jim install http://code.jquery.com/jquery-1.4.1.js
///   jim install ~/Downloads/sammy-0.5.0.zip
///   jim bundle public/javascripts/bundled.js
#[derive(Parser, Debug)]
#[command(author, version = env!("JIM_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Store directory (default ~/.jim; also via JIMHOME)
    #[arg(long, env = "JIMHOME", value_name = "PATH", global = true)]
    jimhome: Option<PathBuf>,

    /// Jimfile to load (default ./Jimfile)
    #[arg(short = 'j', long, value_name = "PATH", global = true)]
    jimfile: Option<PathBuf>,

    /// Overwrite existing files and installs
    #[arg(short, long, global = true)]
    force: bool,

    /// Log debug output
    #[arg(short, long, global = true)]
    debug: bool,

    /// Write bundles to stdout
    #[arg(short = 'o', long, global = true)]
    stdout: bool,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Write a template Jimfile into DIR
    Init {
        #[arg(value_name = "DIR")]
        dir: Option<PathBuf>,
    },

    /// Install a library from a URL or a local file, archive or directory
    Install {
        #[arg(value_name = "URL")]
        url: String,
        /// Name to install under, for single-file sources
        name: Option<String>,
        /// Version to install under, for single-file sources
        version: Option<String>,
    },

    /// Concatenate the Jimfile's scripts into DEST
    Bundle {
        #[arg(value_name = "DEST")]
        dest: Option<PathBuf>,
    },

    /// Concatenate and minify the Jimfile's scripts into DEST
    Compress {
        #[arg(value_name = "DEST")]
        dest: Option<PathBuf>,
    },

    /// Copy the Jimfile's scripts into DIR
    Vendor {
        #[arg(value_name = "DIR")]
        dir: Option<PathBuf>,
    },

    /// List installed libraries
    #[command(alias = "installed")]
    List { search: Option<String> },

    /// List installed libraries and scripts in the current directory
    Available { search: Option<String> },

    /// Remove installed versions of a library
    #[command(alias = "uninstall")]
    Remove {
        name: String,
        version: Option<String>,
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Show the file each Jimfile requirement resolves to
    Resolve,

    /// Vendor into DIR, then bundle and compress
    Pack {
        #[arg(value_name = "DIR")]
        dir: Option<PathBuf>,
    },
}

impl Cli {
    fn log_filter(&self) -> &'static str {
        if self.debug {
            "debug"
        } else if self.stdout {
            "error"
        } else {
            "info"
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_filter()))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let runtime = RealRuntime;
    let config = Config::new(
        &runtime,
        cli.jimhome,
        cli.jimfile,
        cli.force,
        cli.stdout,
    )?;

    match cli.command {
        Commands::Init { dir } => commands::init(runtime, dir, config)?,
        Commands::Install { url, name, version } => {
            commands::install(runtime, &url, name, version, config).await?
        }
        Commands::Bundle { dest } => commands::bundle(runtime, dest, config)?,
        Commands::Compress { dest } => commands::compress(runtime, dest, config)?,
        Commands::Vendor { dir } => commands::vendor(runtime, dir, config)?,
        Commands::List { search } => commands::list(runtime, search.as_deref(), config)?,
        Commands::Available { search } => {
            commands::available(runtime, search.as_deref(), config)?
        }
        Commands::Remove { name, version, yes } => {
            commands::remove(runtime, &name, version.as_deref(), yes, config)?
        }
        Commands::Resolve => commands::resolve(runtime, config)?,
        Commands::Pack { dir } => commands::pack(runtime, dir, config)?,
    }
    Ok(())
}
