// Wallet Vault - Backup store abstraction
//
// Entries are addressed as `prefix/name` and hold one opaque blob. Blobs
// are streamed through readers and writers so plaintext only ever lands in
// staged files, never in an intermediate buffer owned by the adapter.

use std::io::{Read, Write};

use super::StoreError;

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the encrypted secret store, enabling the pass(1)
/// backend and an in-memory mock for testing.
pub trait BackupStore {
    /// Check whether an entry exists without decrypting it.
    fn exists(&self, path: &str) -> Result<bool, StoreError>;

    /// Write (or overwrite) an entry with everything `contents` yields.
    /// `PartialWrite` means the entry now exists with truncated content.
    fn put(&self, path: &str, contents: &mut dyn Read) -> Result<(), StoreError>;

    /// Decrypt an entry into `sink`. Fails with `NotFound` if absent.
    fn get(&self, path: &str, sink: &mut dyn Write) -> Result<(), StoreError>;

    /// Remove an entry without confirmation.
    fn delete(&self, path: &str) -> Result<(), StoreError>;

    /// Names of the entries directly under `prefix`, sorted.
    fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}

// ─── In-Memory Mock for Testing ──────────────────────────────────────────────


// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::mock::{MemoryStore, StoreFaults};
    use super::*;

    #[test]
    fn test_put_get_round_trip() {
        let store = MemoryStore::new();
        store.put("bitcoind/alpha", &mut &b"blob"[..]).unwrap();

        let mut out = Vec::new();
        store.get("bitcoind/alpha", &mut out).unwrap();
        assert_eq!(out, b"blob");
        assert!(store.exists("bitcoind/alpha").unwrap());
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let store = MemoryStore::new();
        let mut out = Vec::new();
        assert!(matches!(
            store.get("bitcoind/ghost", &mut out),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_list_is_scoped_to_prefix() {
        let store = MemoryStore::new()
            .with_entry("bitcoind/alpha", b"a")
            .with_entry("bitcoind/beta", b"b")
            .with_entry("bitcoind/nested/gamma", b"c")
            .with_entry("other/delta", b"d");

        assert_eq!(store.list("bitcoind").unwrap(), vec!["alpha", "beta"]);
    }

    #[test]
    fn test_corrupt_on_put_persists_replacement() {
        let store = MemoryStore::new();
        store.set_faults(StoreFaults {
            corrupt_on_put: Some(b"garbage".to_vec()),
            ..Default::default()
        });

        store.put("bitcoind/alpha", &mut &b"good"[..]).unwrap();
        assert_eq!(store.entry("bitcoind/alpha").unwrap(), b"garbage");
    }
}
