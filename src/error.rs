//! Failures callers are expected to tell apart.
//!
//! These travel inside `anyhow::Error`; use `downcast_ref::<JimError>()` to
//! recover the kind.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JimError {
    /// The source could not be retrieved (unreachable URL, bad HTTP status,
    /// or a local path that does not exist).
    #[error("Could not fetch {source_ref}: {reason}")]
    Fetch { source_ref: String, reason: String },

    /// One or more requirements matched nothing in the index.
    #[error("Could not resolve {}", .unresolved.join(", "))]
    Resolution { unresolved: Vec<String> },

    /// A write was refused because the destination is already there.
    #[error("{} already exists", .0.display())]
    FileExists(PathBuf),

    #[error("Invalid Jimfile line {line}: {message}")]
    Manifest { line: usize, message: String },
}

impl JimError {
    pub fn fetch(source_ref: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Fetch {
            source_ref: source_ref.into(),
            reason: reason.into(),
        }
    }
}
