// Wallet Vault - Wallet service error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Wallet service unavailable: {0}")]
    Unavailable(String),

    #[error("Wallet '{0}' is not loaded")]
    NotLoaded(String),

    #[error("Wallet '{0}' already exists or is already loaded")]
    AlreadyLoaded(String),

    #[error("{method} failed{}: {message}", .code.map(|c| format!(" (RPC error {c})")).unwrap_or_default())]
    Rpc {
        method: &'static str,
        code: Option<i64>,
        message: String,
    },

    #[error("Wallet service rejected {rejected} of {total} descriptors: {reason}")]
    ImportRejected {
        rejected: usize,
        total: usize,
        reason: String,
    },

    #[error("Unexpected {method} response: {source}")]
    Response {
        method: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
