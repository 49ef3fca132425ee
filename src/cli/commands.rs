// Wallet Vault - CLI Command Handlers
//
// Each function handles one CLI subcommand. They build the production
// adapters (pass and bitcoin-cli) from the configuration, run one vault
// operation and print its report. Handlers are blocking; main runs them on
// a worker thread so signals can still be serviced.

use std::fmt::Write as _;
use std::io;

use crate::config::VaultConfig;
use crate::error::VaultError;
use crate::staging::StagingArea;
use crate::store::PassStore;
use crate::vault::{BackupReport, DestroyReport, Inventory, StepOutcome, Vault};
use crate::wallet::BitcoinCli;

use super::{Commands, StdinConfirm};

type ProductionVault = Vault<PassStore, BitcoinCli>;

/// Execute the parsed CLI command.
pub fn execute(
    command: Commands,
    config: &VaultConfig,
    staging: StagingArea,
) -> Result<(), VaultError> {
    let vault = open_vault(config, staging);

    match command {
        Commands::Create { name } => cmd_create(&vault, &name),
        Commands::Backup { name } => cmd_backup(&vault, &name),
        Commands::Restore { name, new_name } => cmd_restore(&vault, &name, new_name.as_deref()),
        Commands::Import { name, file } => {
            let report = vault.import(&name, &file)?;
            println!("✓ Imported {} as '{}'", file.display(), name);
            print!("{}", render_backup(&report));
            Ok(())
        }
        Commands::Export { name, file } => {
            let report = vault.export(&name, &file)?;
            println!("✓ Backup of '{}' exported", report.wallet);
            println!("  File:        {}", report.path.display());
            println!("  Descriptors: {}", report.descriptors);
            println!();
            println!("The file holds private keys in plaintext. Erase it with `shred -u` when done.");
            Ok(())
        }
        Commands::Destroy { name, yes } => {
            let report = if yes {
                vault.destroy(&name, &mut |_: &str| -> io::Result<bool> { Ok(true) })?
            } else {
                vault.destroy(&name, &mut StdinConfirm)?
            };
            print!("{}", render_destroy(&report));
            Ok(())
        }
        Commands::List => {
            let inventory = vault.list()?;
            print!("{}", render_inventory(&inventory, &config.prefix));
            Ok(())
        }
    }
}

fn open_vault(config: &VaultConfig, staging: StagingArea) -> ProductionVault {
    let store = PassStore::new(&config.pass, &config.password_store_dir);
    let wallet = BitcoinCli::new(&config.bitcoin_cli, config.bitcoin_cli_args.clone());
    Vault::new(store, wallet, staging, config.prefix.clone())
}

// ─── Create / Backup / Restore ───────────────────────────────────────────────

fn cmd_create(vault: &ProductionVault, name: &str) -> Result<(), VaultError> {
    let report = vault.create(name)?;
    println!("✓ Wallet '{}' created", name);
    print!("{}", render_backup(&report));
    Ok(())
}

fn cmd_backup(vault: &ProductionVault, name: &str) -> Result<(), VaultError> {
    let report = vault.backup(name)?;
    println!("✓ Wallet '{}' backed up", name);
    print!("{}", render_backup(&report));
    Ok(())
}

fn cmd_restore(
    vault: &ProductionVault,
    name: &str,
    new_name: Option<&str>,
) -> Result<(), VaultError> {
    let report = vault.restore(name, new_name)?;
    println!("✓ Backup '{}' restored as wallet '{}'", report.source, report.target);
    println!("  Descriptors: {}", report.descriptors);
    println!();
    println!("bitcoind may keep rescanning in the background; balances can lag until it finishes.");
    Ok(())
}

// ─── Rendering ───────────────────────────────────────────────────────────────

fn format_timestamp(secs: i64) -> String {
    chrono::DateTime::from_timestamp(secs, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| secs.to_string())
}

fn render_backup(report: &BackupReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "  Entry:       {}", report.entry);
    let _ = writeln!(out, "  Descriptors: {}", report.descriptors);
    let _ = writeln!(out, "  Created:     {}", format_timestamp(report.created_at));
    let _ = writeln!(out, "  Verified:    read back and checked");
    out
}

fn render_step(out: &mut String, step: &StepOutcome, done: &str, failed: &str) {
    match step {
        StepOutcome::Skipped => {}
        StepOutcome::Done => {
            let _ = writeln!(out, "✓ {done}");
        }
        StepOutcome::Failed(reason) => {
            let _ = writeln!(out, "✗ {failed}: {reason}");
        }
    }
}

fn render_destroy(report: &DestroyReport) -> String {
    let mut out = String::new();
    if !report.confirmed {
        let _ = writeln!(out, "Aborted, nothing was changed.");
        return out;
    }

    render_step(
        &mut out,
        &report.unload,
        &format!("Wallet '{}' unloaded", report.wallet),
        &format!("Could not unload wallet '{}'", report.wallet),
    );
    render_step(
        &mut out,
        &report.delete,
        &format!("Backup of '{}' deleted", report.wallet),
        &format!("Could not delete the backup of '{}'", report.wallet),
    );
    if matches!(report.unload, StepOutcome::Done) {
        let _ = writeln!(out, "  The wallet files remain in bitcoind's wallet directory.");
    }
    out
}

fn render_inventory(inventory: &Inventory, prefix: &str) -> String {
    let mut out = String::new();

    if inventory.backups.is_empty() {
        let _ = writeln!(out, "No backups stored under {}/", prefix);
    } else {
        let _ = writeln!(out, "Stored backups under {}/ ({}):\n", prefix, inventory.backups.len());
        for name in &inventory.backups {
            let _ = writeln!(out, "  {}", name);
        }
    }
    let _ = writeln!(out);

    match &inventory.loaded {
        None => {
            let _ = writeln!(out, "Wallet service unreachable; loaded wallets not shown.");
        }
        Some(loaded) if loaded.is_empty() => {
            let _ = writeln!(out, "No wallets loaded.");
        }
        Some(loaded) => {
            let _ = writeln!(out, "Loaded wallets ({}):\n", loaded.len());
            for wallet in loaded {
                let _ = writeln!(
                    out,
                    "  {:20} │ {:9} │ {}",
                    wallet.name,
                    if wallet.backed_up { "backed up" } else { "NO BACKUP" },
                    wallet.balance.as_deref().unwrap_or("balance unavailable"),
                );
            }
        }
    }

    out
}
