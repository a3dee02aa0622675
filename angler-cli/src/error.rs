//! CLI-level errors: argument shapes the engine itself doesn't know about.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("expected key=value, got {0:?}")]
    NotKeyValue(String),

    #[error("interrupted")]
    Interrupted,

    #[error(transparent)]
    Manifest(#[from] angler_core::error::ManifestError),
}
