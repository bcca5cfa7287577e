//! The host-side error type: wraps `astre_math::AstreError` with the I/O
//! and text-format failures that only exist at the boundary.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed points description: {0}")]
    Parse(String),

    #[error(transparent)]
    Astre(#[from] astre_math::AstreError),
}

pub type Result<T> = std::result::Result<T, CliError>;
