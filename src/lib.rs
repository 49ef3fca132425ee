// Wallet Vault - Library root
//
// Re-exports the staging, envelope, store, wallet, vault, config and CLI
// modules.

pub mod cli;
pub mod config;
pub mod envelope;
pub mod error;
pub mod staging;
pub mod store;
pub mod vault;
pub mod wallet;

pub use error::{Location, Result, VaultError};
