// Wallet Vault - Vault Module
//
// The transfer protocol: create, backup, restore, import, export, destroy
// and list, each a verified composition of the wallet service, the secret
// store and the staging area.

mod name;
mod report;
mod transfer;

pub use name::{validate_wallet_name, MAX_NAME_LEN};
pub use report::{
    BackupReport, Confirm, DestroyReport, ExportReport, Inventory, LoadedWallet, RestoreReport,
    StepOutcome,
};
pub use transfer::Vault;
