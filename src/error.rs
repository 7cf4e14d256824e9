//! Library error type.
//!
//! The transform itself never fails on well-formed input; errors come from the
//! edges: parsing a file, reading or writing it, and the type-checker backend.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// The source could not be parsed; the file is left untouched.
    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write cache {}: {message}", path.display())]
    Cache { path: PathBuf, message: String },

    /// The diagnostics backend failed to produce a result.
    #[error("type checker failed: {0}")]
    Checker(String),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
