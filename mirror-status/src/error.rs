use std::path::PathBuf;

use thiserror::Error;

/// Errors from loading mirror state files.
#[derive(Debug, Error)]
pub enum StatusError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
}
