// Wallet Vault - Top-level error types
//
// Aggregates errors from the staging, envelope, store and wallet modules into
// the failure kinds the transfer protocol reports at the application boundary.

use std::fmt;

use thiserror::Error;

use crate::config::ConfigError;
use crate::envelope::EnvelopeError;
use crate::staging::StagingError;
use crate::store::StoreError;
use crate::wallet::WalletError;

/// Where a conflicting or missing wallet was looked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    SecretStore,
    WalletService,
    Filesystem,
    /// Neither the secret store nor the wallet service.
    Anywhere,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Location::SecretStore => "in the secret store",
            Location::WalletService => "in the wallet service",
            Location::Filesystem => "on the filesystem",
            Location::Anywhere => "in the secret store or the wallet service",
        })
    }
}

/// Top-level error type for all Wallet Vault operations.
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("Invalid wallet name {0:?}: use letters, digits, '_', '-' or '.'")]
    InvalidName(String),

    #[error("'{name}' already exists {location}")]
    AlreadyExists { name: String, location: Location },

    #[error("'{name}' not found {location}")]
    NotFound { name: String, location: Location },

    #[error("Malformed backup: {0}")]
    MalformedEnvelope(String),

    #[error("Wallet service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Verification failed: {0}")]
    VerificationFailed(String),

    #[error("Partial failure: {0}")]
    PartialFailure(String),

    #[error("Store error: {0}")]
    Store(StoreError),

    #[error("Wallet error: {0}")]
    Wallet(WalletError),

    #[error("Staging error: {0}")]
    Staging(#[from] StagingError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<WalletError> for VaultError {
    fn from(e: WalletError) -> Self {
        match e {
            WalletError::Unavailable(reason) => VaultError::ServiceUnavailable(reason),
            WalletError::NotLoaded(name) => VaultError::NotFound {
                name,
                location: Location::WalletService,
            },
            WalletError::AlreadyLoaded(name) => VaultError::AlreadyExists {
                name,
                location: Location::WalletService,
            },
            other => VaultError::Wallet(other),
        }
    }
}

impl From<StoreError> for VaultError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(path) => VaultError::NotFound {
                name: path,
                location: Location::SecretStore,
            },
            other => VaultError::Store(other),
        }
    }
}

impl From<EnvelopeError> for VaultError {
    fn from(e: EnvelopeError) -> Self {
        VaultError::MalformedEnvelope(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, VaultError>;
