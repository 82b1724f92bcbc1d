//! Command handlers behind the `jim` binary.
//!
//! Each handler takes the runtime by value plus the resolved [`Config`] and
//! prints its results; the library modules do the work.

mod bundle;
pub mod config;
mod init;
mod install;
mod list;
mod paths;
mod remove;
pub mod services;

pub use bundle::{bundle, compress, pack, resolve, vendor};
pub use config::Config;
pub use init::init;
pub use install::install;
pub use list::{available, list};
pub use paths::{default_jimhome, expand_home};
pub use remove::remove;
