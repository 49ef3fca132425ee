// Wallet Vault - Transfer protocol
//
// Every operation composes the wallet service, the transcoder, the staging
// area and the secret store. Anything committed to the store is read back
// and verified before the operation succeeds; a commit that fails
// verification is deleted, and a wallet created by a failed operation is
// unloaded again. Plaintext only ever sits in staged files, which are
// released before the operation returns.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use zeroize::Zeroizing;

use crate::envelope::{
    content_digest, to_import_shape, to_storage_shape, Envelope, MAX_ENVELOPE_BYTES,
    SCHEMA_VERSION,
};
use crate::error::{Location, Result, VaultError};
use crate::staging::{create_owner_only, StagingArea};
use crate::store::{BackupStore, StoreError};
use crate::wallet::{WalletService, WalletTemplate};

use super::name::validate_wallet_name;
use super::report::{
    BackupReport, Confirm, DestroyReport, ExportReport, Inventory, LoadedWallet, RestoreReport,
    StepOutcome,
};

pub struct Vault<S, W> {
    store: S,
    wallet: W,
    staging: StagingArea,
    prefix: String,
}

impl<S: BackupStore, W: WalletService> Vault<S, W> {
    pub fn new(store: S, wallet: W, staging: StagingArea, prefix: impl Into<String>) -> Self {
        Self {
            store,
            wallet,
            staging,
            prefix: prefix.into(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn wallet(&self) -> &W {
        &self.wallet
    }

    pub fn staging(&self) -> &StagingArea {
        &self.staging
    }

    /// Secret-store path of a wallet's backup.
    pub fn entry_path(&self, name: &str) -> String {
        format!("{}/{}", self.prefix, name)
    }

    // ─── CREATE ──────────────────────────────────────────────────────────────

    /// Create a new wallet and back it up. The wallet is unloaded again when
    /// no verified backup could be made.
    pub fn create(&self, name: &str) -> Result<BackupReport> {
        validate_wallet_name(name)?;

        if self.store.exists(&self.entry_path(name))? {
            return Err(already_exists(name, Location::SecretStore));
        }
        if self.wallet.list_wallet_names()?.contains(name) {
            return Err(already_exists(name, Location::WalletService));
        }

        self.wallet.create_wallet(name, WalletTemplate::Fresh)?;

        self.backup(name).inspect_err(|e| {
            tracing::warn!(wallet = %name, error = %e, "Backup of new wallet failed, unloading it");
            self.unload_logged(name);
        })
    }

    // ─── BACKUP ──────────────────────────────────────────────────────────────

    /// Export a loaded wallet and commit it, overwriting any earlier backup.
    ///
    /// A commit that fails verification is deleted, so a failed overwrite
    /// leaves no backup at all rather than an unverified one. Nothing locks
    /// the entry: concurrent operations on the same name race, and the last
    /// commit or delete wins.
    pub fn backup(&self, name: &str) -> Result<BackupReport> {
        validate_wallet_name(name)?;

        if !self.wallet.list_wallet_names()?.contains(name) {
            return Err(not_found(name, Location::WalletService));
        }

        let export = self.wallet.export_descriptors(name)?;
        let created_at = chrono::Utc::now().timestamp();
        let envelope = to_storage_shape(
            export.wallet_metadata,
            export.descriptor_set,
            SCHEMA_VERSION,
            name,
            created_at,
        );
        envelope.verify().map_err(|e| {
            VaultError::VerificationFailed(format!("export of '{name}' is not storable: {e}"))
        })?;

        let bytes = envelope.to_bytes()?;
        drop(envelope);

        let mut staged = self.staging.acquire()?;
        staged.write_all(&bytes)?;
        staged.sync()?;
        staged.rewind()?;

        let entry = self.entry_path(name);
        let descriptors = self.commit(&entry, &mut staged, content_digest(&bytes))?;
        staged.release();

        tracing::info!(wallet = %name, entry = %entry, descriptors, "Backup verified");
        Ok(BackupReport {
            wallet: name.to_string(),
            entry,
            descriptors,
            created_at,
        })
    }

    // ─── RESTORE ─────────────────────────────────────────────────────────────

    /// Load the backup of `source` into a new wallet named `target`
    /// (default: `source`). The wallet service may keep rescanning after
    /// this returns.
    pub fn restore(&self, source: &str, target: Option<&str>) -> Result<RestoreReport> {
        let target = target.unwrap_or(source);
        validate_wallet_name(source)?;
        validate_wallet_name(target)?;

        let entry = self.entry_path(source);
        if !self.store.exists(&entry)? {
            return Err(not_found(source, Location::SecretStore));
        }
        if self.wallet.list_wallet_names()?.contains(target) {
            return Err(already_exists(target, Location::WalletService));
        }

        let mut staged = self.staging.acquire()?;
        self.store.get(&entry, &mut staged)?;
        let records = {
            let bytes = staged.read_all()?;
            let envelope = Envelope::from_slice(&bytes)?;
            to_import_shape(&envelope.descriptor_set)?
        };

        self.wallet.create_wallet(target, WalletTemplate::Blank)?;

        if let Err(e) = self.wallet.import_descriptors(target, &records) {
            tracing::warn!(wallet = %target, error = %e, "Import failed, unloading wallet");
            self.unload_logged(target);
            return Err(e.into());
        }
        staged.release();

        tracing::info!(
            source = %source,
            target = %target,
            descriptors = records.len(),
            "Wallet restored"
        );
        Ok(RestoreReport {
            source: source.to_string(),
            target: target.to_string(),
            descriptors: records.len(),
        })
    }

    // ─── IMPORT ──────────────────────────────────────────────────────────────

    /// Store an envelope file as the backup of `name`. The file is stored
    /// byte for byte.
    pub fn import(&self, name: &str, file: &Path) -> Result<BackupReport> {
        validate_wallet_name(name)?;

        let bytes = read_plaintext(file)?;
        let envelope = Envelope::from_slice(&bytes)?;

        let entry = self.entry_path(name);
        if self.store.exists(&entry)? {
            return Err(already_exists(name, Location::SecretStore));
        }
        envelope.verify()?;

        if envelope.wallet_name != name {
            tracing::warn!(
                wallet = %name,
                envelope_wallet = %envelope.wallet_name,
                "Envelope was made for a different wallet name, storing it unchanged"
            );
        }
        let created_at = envelope.created_at;
        drop(envelope);

        let descriptors = self.commit(&entry, &mut bytes.as_slice(), content_digest(&bytes))?;

        tracing::info!(wallet = %name, entry = %entry, descriptors, "Import verified");
        Ok(BackupReport {
            wallet: name.to_string(),
            entry,
            descriptors,
            created_at,
        })
    }

    // ─── EXPORT ──────────────────────────────────────────────────────────────

    /// Write the stored backup of `name` to a new owner-only file.
    pub fn export(&self, name: &str, output: &Path) -> Result<ExportReport> {
        validate_wallet_name(name)?;

        if output.symlink_metadata().is_ok() {
            return Err(already_exists(&output.display().to_string(), Location::Filesystem));
        }
        let entry = self.entry_path(name);
        if !self.store.exists(&entry)? {
            return Err(not_found(name, Location::SecretStore));
        }

        let mut file = create_owner_only(output).map_err(|e| match e.kind() {
            io::ErrorKind::AlreadyExists => {
                already_exists(&output.display().to_string(), Location::Filesystem)
            }
            _ => VaultError::Io(e),
        })?;

        match self.write_export(&entry, &mut file) {
            Ok(descriptors) => {
                tracing::info!(wallet = %name, path = %output.display(), descriptors, "Backup exported");
                Ok(ExportReport {
                    wallet: name.to_string(),
                    path: output.to_path_buf(),
                    descriptors,
                })
            }
            Err(e) => {
                drop(file);
                tracing::warn!(path = %output.display(), error = %e, "Export failed, erasing output");
                self.staging.erase_unstaged(output);
                Err(e)
            }
        }
    }

    fn write_export(&self, entry: &str, file: &mut File) -> Result<usize> {
        self.store.get(entry, file)?;
        file.sync_all()?;

        file.seek(SeekFrom::Start(0))?;
        let mut bytes = Zeroizing::new(Vec::new());
        file.read_to_end(&mut bytes)?;

        let envelope = Envelope::parse_verified(&bytes)
            .map_err(|e| VaultError::VerificationFailed(format!("{entry}: {e}")))?;
        Ok(envelope.descriptor_count())
    }

    // ─── DESTROY ─────────────────────────────────────────────────────────────

    /// Unload the wallet and delete its backup after confirmation. Each step
    /// is best-effort; failures are reported in the result, not raised.
    pub fn destroy(&self, name: &str, confirm: &mut dyn Confirm) -> Result<DestroyReport> {
        validate_wallet_name(name)?;

        let entry = self.entry_path(name);
        let in_store = self.store.exists(&entry)?;
        let in_wallet = self.wallet.list_wallet_names()?.contains(name);

        if !in_store && !in_wallet {
            return Err(not_found(name, Location::Anywhere));
        }

        let prompt = match (in_wallet, in_store) {
            (true, true) => format!("Unload wallet '{name}' and permanently delete its backup {entry}?"),
            (true, false) => format!("Unload wallet '{name}'? It has no backup in the secret store."),
            _ => format!("Permanently delete the backup {entry}?"),
        };
        if !confirm.confirm(&prompt)? {
            tracing::info!(wallet = %name, "Destroy declined");
            return Ok(DestroyReport {
                wallet: name.to_string(),
                confirmed: false,
                unload: StepOutcome::Skipped,
                delete: StepOutcome::Skipped,
            });
        }

        let unload = if in_wallet {
            match self.wallet.unload_wallet(name) {
                Ok(()) => StepOutcome::Done,
                Err(e) => {
                    tracing::warn!(wallet = %name, error = %e, "Failed to unload wallet");
                    StepOutcome::Failed(e.to_string())
                }
            }
        } else {
            StepOutcome::Skipped
        };

        let delete = if in_store {
            match self.store.delete(&entry) {
                Ok(()) => StepOutcome::Done,
                Err(e) => {
                    tracing::error!(entry = %entry, error = %e, "Failed to delete backup");
                    StepOutcome::Failed(e.to_string())
                }
            }
        } else {
            StepOutcome::Skipped
        };

        tracing::info!(wallet = %name, ?unload, ?delete, "Destroy finished");
        Ok(DestroyReport {
            wallet: name.to_string(),
            confirmed: true,
            unload,
            delete,
        })
    }

    // ─── LIST ────────────────────────────────────────────────────────────────

    pub fn list(&self) -> Result<Inventory> {
        let backups = self.store.list(&self.prefix)?;

        let loaded = match self.wallet.list_wallet_names() {
            Ok(names) => Some(
                names
                    .into_iter()
                    .map(|name| LoadedWallet {
                        balance: self.wallet.get_balance(&name),
                        backed_up: backups.binary_search(&name).is_ok(),
                        name,
                    })
                    .collect(),
            ),
            Err(e) => {
                tracing::warn!(error = %e, "Wallet service unreachable, listing backups only");
                None
            }
        };

        Ok(Inventory { backups, loaded })
    }

    // ─── Commit and verify ───────────────────────────────────────────────────

    /// Put `contents` at `entry`, read it back and verify it. A commit that
    /// fails verification, or was only partly written, is deleted again.
    fn commit(&self, entry: &str, contents: &mut dyn Read, expected: [u8; 32]) -> Result<usize> {
        match self.store.put(entry, contents) {
            Ok(()) => {}
            Err(e @ StoreError::PartialWrite { .. }) => {
                return Err(self.discard_commit(entry, e.into()));
            }
            Err(e) => return Err(e.into()),
        }
        tracing::debug!(entry = %entry, "Committed, verifying read-back");

        self.verify_entry(entry, expected)
            .map_err(|cause| self.discard_commit(entry, cause))
    }

    fn verify_entry(&self, entry: &str, expected: [u8; 32]) -> Result<usize> {
        let mut readback = self.staging.acquire()?;
        self.store.get(entry, &mut readback)?;
        let bytes = readback.read_all()?;

        if content_digest(&bytes) != expected {
            return Err(VaultError::VerificationFailed(format!(
                "{entry} does not read back as written"
            )));
        }
        let envelope = Envelope::parse_verified(&bytes)
            .map_err(|e| VaultError::VerificationFailed(format!("{entry}: {e}")))?;
        Ok(envelope.descriptor_count())
    }

    fn discard_commit(&self, entry: &str, cause: VaultError) -> VaultError {
        tracing::warn!(entry = %entry, error = %cause, "Removing unverified entry");
        match self.store.delete(entry) {
            Ok(()) => cause,
            Err(e) => {
                tracing::error!(entry = %entry, error = %e, "Failed to remove unverified entry");
                VaultError::PartialFailure(format!(
                    "{cause}; the unverified entry could not be removed ({e}). Remove it with `pass rm {entry}`"
                ))
            }
        }
    }

    fn unload_logged(&self, name: &str) {
        if let Err(e) = self.wallet.unload_wallet(name) {
            tracing::warn!(wallet = %name, error = %e, "Failed to unload wallet");
        }
    }
}

fn already_exists(name: &str, location: Location) -> VaultError {
    VaultError::AlreadyExists {
        name: name.to_string(),
        location,
    }
}

fn not_found(name: &str, location: Location) -> VaultError {
    VaultError::NotFound {
        name: name.to_string(),
        location,
    }
}

/// Read a user-supplied plaintext file into a buffer wiped on drop. Reads
/// stop past `MAX_ENVELOPE_BYTES`, so devices and pipes cannot grow it
/// without bound.
fn read_plaintext(path: &Path) -> Result<Zeroizing<Vec<u8>>> {
    let file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => not_found(&path.display().to_string(), Location::Filesystem),
        _ => VaultError::Io(e),
    })?;
    let too_large = || {
        VaultError::MalformedEnvelope(format!(
            "{} is larger than {} bytes",
            path.display(),
            MAX_ENVELOPE_BYTES
        ))
    };

    let len = file.metadata()?.len();
    if len > MAX_ENVELOPE_BYTES as u64 {
        return Err(too_large());
    }

    let mut bytes = Zeroizing::new(Vec::with_capacity(len as usize + 1));
    file.take(MAX_ENVELOPE_BYTES as u64 + 1).read_to_end(&mut bytes)?;
    if bytes.len() > MAX_ENVELOPE_BYTES {
        return Err(too_large());
    }
    Ok(bytes)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
