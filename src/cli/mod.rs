// Wallet Vault - CLI Module
//
// Command-line interface using clap derive macros.
// Subcommands: create, backup, restore, import, export, destroy, list.

mod commands;
mod prompt;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::execute;
pub use prompt::StdinConfirm;

/// Shown by `--help`.
const CONCURRENCY_NOTE: &str = "\
Invocations are not coordinated with each other. Running two commands on the
same wallet name at once (for example two backups, or a backup during a
destroy) can leave the stored backup from either run, or none.";

/// Wallet Vault - verified backups of Bitcoin Core descriptor wallets in pass(1).
#[derive(Parser, Debug)]
#[command(name = "wallet-vault")]
#[command(version, about, after_long_help = CONCURRENCY_NOTE)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new descriptor wallet and store a verified backup of it.
    Create {
        /// Name of the wallet to create.
        name: String,
    },

    /// Back up a loaded wallet, replacing any earlier backup.
    Backup {
        /// Name of the loaded wallet.
        name: String,
    },

    /// Load a stored backup into a new wallet.
    Restore {
        /// Name of the stored backup.
        name: String,

        /// Name for the restored wallet (defaults to the backup's name).
        new_name: Option<String>,
    },

    /// Store a backup file exported earlier.
    Import {
        /// Name to store the backup under.
        name: String,

        /// Path of the JSON backup file.
        file: PathBuf,
    },

    /// Write a stored backup to a new plaintext file (owner-only).
    Export {
        /// Name of the stored backup.
        name: String,

        /// Path of the file to create. Must not exist.
        file: PathBuf,
    },

    /// Unload a wallet and delete its backup.
    Destroy {
        /// Name of the wallet.
        name: String,

        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },

    /// List stored backups and loaded wallets.
    List,
}
