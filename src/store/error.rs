// Wallet Vault - Secret store error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Secret store entry not found: {0}")]
    NotFound(String),

    #[error("Secret store unavailable: {0}")]
    Unavailable(String),

    #[error("`pass {command}` failed for {path} ({status}): {stderr}")]
    Command {
        command: &'static str,
        path: String,
        status: String,
        stderr: String,
    },

    /// `pass` accepted the entry but not all of the content reached it.
    #[error("Entry {path} was written incompletely: {source}")]
    PartialWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
