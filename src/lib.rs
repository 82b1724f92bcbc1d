pub mod archive;
pub mod bundle;
pub mod commands;
pub mod download;
pub mod error;
pub mod fetch;
pub mod http;
pub mod install;
pub mod package;
pub mod runtime;

pub use error::JimError;
