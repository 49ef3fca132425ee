// Wallet Vault - Store Module
//
// Encrypted persistent storage for backup envelopes. The `BackupStore` trait
// is the only view the transfer protocol has of the secret store; `PassStore`
// backs it with pass(1), which encrypts every entry with GnuPG.

mod error;
mod pass;
mod repository;

pub use error::StoreError;
pub use pass::PassStore;
pub use repository::BackupStore;

#[cfg(test)]
pub use repository::mock;
