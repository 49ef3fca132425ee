// Wallet Vault - Staging error types

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StagingError {
    #[error("No usable staging directory (tried {})", .0.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", "))]
    NoUsableDirectory(Vec<PathBuf>),

    #[error("Failed to create staged file in {dir}: {source}")]
    Create {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Staging area closed: the process is shutting down")]
    Closed,

    #[error("Failed to remove {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Staged file I/O error: {0}")]
    Io(#[from] std::io::Error),
}
