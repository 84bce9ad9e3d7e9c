use std::path::PathBuf;

use thiserror::Error;

/// Errors from the few places that touch the filesystem
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not determine config directory")]
    ConfigDir,
}

pub type Result<T> = std::result::Result<T, Error>;
