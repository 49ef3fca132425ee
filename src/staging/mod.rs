// Wallet Vault - Staging Module
//
// Short-lived, owner-only files that hold plaintext envelopes while they move
// between the wallet service and the secret store. Every staged file is
// tracked in a shared registry and is overwritten before it is unlinked.

mod area;
mod erase;
mod error;

pub use area::{create_owner_only, StagedFile, StagingArea};
pub use erase::{EraseOutcome, Eraser};
pub use error::StagingError;
