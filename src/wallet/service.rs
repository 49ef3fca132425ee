// Wallet Vault - Wallet service abstraction

use std::collections::BTreeSet;

use crate::envelope::{DescriptorExport, ImportDescriptor};

use super::WalletError;

/// Key material a newly created wallet starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletTemplate {
    /// The service generates fresh descriptors.
    Fresh,
    /// No descriptors at all; filled later by an import.
    Blank,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Capability set of the wallet-holding service. Every call is blocking and
/// keyed by wallet name.
pub trait WalletService {
    /// Names of the wallets currently loaded.
    fn list_wallet_names(&self) -> Result<BTreeSet<String>, WalletError>;

    /// Create and load a private-key-capable descriptor wallet with no funds
    /// or history. Fails if a wallet with that name is already loaded.
    fn create_wallet(&self, name: &str, template: WalletTemplate) -> Result<(), WalletError>;

    /// Unload a wallet. Callers treat failure as non-fatal.
    fn unload_wallet(&self, name: &str) -> Result<(), WalletError>;

    /// Export wallet info and every descriptor, private keys included.
    fn export_descriptors(&self, name: &str) -> Result<DescriptorExport, WalletError>;

    /// Import descriptors in bulk. One rejected record fails the call.
    fn import_descriptors(&self, name: &str, records: &[ImportDescriptor])
        -> Result<(), WalletError>;

    /// Confirmed balance as decimal text, `None` when it cannot be queried.
    fn get_balance(&self, name: &str) -> Option<String>;
}

// ─── In-Memory Mock for Testing ──────────────────────────────────────────────

/// A mock wallet service holding descriptors in memory.
#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use crate::envelope::{
        DescriptorRange, DescriptorRecord, DescriptorSet, DescriptorTimestamp,
    };

    #[derive(Debug, Default, Clone)]
    pub struct WalletFaults {
        /// Every call fails as if the node were down.
        pub unavailable: bool,
        /// Only descriptor export fails as unreachable.
        pub export_unavailable: bool,
        /// Export succeeds but lists no descriptors.
        pub empty_export: bool,
        pub fail_create: bool,
        pub fail_import: bool,
        pub fail_unload: bool,
    }

    #[derive(Default)]
    struct MockState {
        wallets: BTreeMap<String, Vec<DescriptorRecord>>,
        faults: WalletFaults,
        created: Vec<String>,
        unloaded: Vec<String>,
    }

    #[derive(Default)]
    pub struct MockWallet {
        state: Mutex<MockState>,
    }

    pub fn sample_descriptors(name: &str) -> Vec<DescriptorRecord> {
        vec![
            DescriptorRecord {
                descriptor: format!("wpkh(tprv-{name}/84h/1h/0h/0/*)#mock0000"),
                timestamp: DescriptorTimestamp::Unix(1_700_000_000),
                active: true,
                internal: false,
                range: Some(DescriptorRange::Span(0, 999)),
                next_index: Some(5),
            },
            DescriptorRecord {
                descriptor: format!("wpkh(tprv-{name}/84h/1h/0h/1/*)#mock0001"),
                timestamp: DescriptorTimestamp::Unix(1_700_000_000),
                active: true,
                internal: true,
                range: Some(DescriptorRange::Span(0, 999)),
                next_index: Some(0),
            },
        ]
    }

    impl MockWallet {
        pub fn new() -> Self {
            Self::default()
        }

        /// Preload a wallet with the given descriptors.
        pub fn with_wallet(self, name: &str, descriptors: Vec<DescriptorRecord>) -> Self {
            self.state
                .lock()
                .unwrap()
                .wallets
                .insert(name.to_string(), descriptors);
            self
        }

        pub fn set_faults(&self, faults: WalletFaults) {
            self.state.lock().unwrap().faults = faults;
        }

        pub fn is_loaded(&self, name: &str) -> bool {
            self.state.lock().unwrap().wallets.contains_key(name)
        }

        pub fn descriptors(&self, name: &str) -> Option<Vec<DescriptorRecord>> {
            self.state.lock().unwrap().wallets.get(name).cloned()
        }

        pub fn created(&self) -> Vec<String> {
            self.state.lock().unwrap().created.clone()
        }

        pub fn unloaded(&self) -> Vec<String> {
            self.state.lock().unwrap().unloaded.clone()
        }

        fn check_available(&self) -> Result<WalletFaults, WalletError> {
            let faults = self.state.lock().unwrap().faults.clone();
            if faults.unavailable {
                return Err(WalletError::Unavailable("mock node offline".to_string()));
            }
            Ok(faults)
        }
    }

    impl WalletService for MockWallet {
        fn list_wallet_names(&self) -> Result<BTreeSet<String>, WalletError> {
            self.check_available()?;
            Ok(self.state.lock().unwrap().wallets.keys().cloned().collect())
        }

        fn create_wallet(&self, name: &str, template: WalletTemplate) -> Result<(), WalletError> {
            let faults = self.check_available()?;
            if faults.fail_create {
                return Err(WalletError::Rpc {
                    method: "createwallet",
                    code: Some(-4),
                    message: "injected failure".to_string(),
                });
            }

            let mut state = self.state.lock().unwrap();
            if state.wallets.contains_key(name) {
                return Err(WalletError::AlreadyLoaded(name.to_string()));
            }
            let descriptors = match template {
                WalletTemplate::Fresh => sample_descriptors(name),
                WalletTemplate::Blank => Vec::new(),
            };
            state.wallets.insert(name.to_string(), descriptors);
            state.created.push(name.to_string());
            Ok(())
        }

        fn unload_wallet(&self, name: &str) -> Result<(), WalletError> {
            let faults = self.check_available()?;
            if faults.fail_unload {
                return Err(WalletError::Rpc {
                    method: "unloadwallet",
                    code: None,
                    message: "injected failure".to_string(),
                });
            }

            let mut state = self.state.lock().unwrap();
            if state.wallets.remove(name).is_none() {
                return Err(WalletError::NotLoaded(name.to_string()));
            }
            state.unloaded.push(name.to_string());
            Ok(())
        }

        fn export_descriptors(&self, name: &str) -> Result<DescriptorExport, WalletError> {
            let faults = self.check_available()?;
            if faults.export_unavailable {
                return Err(WalletError::Unavailable("connection refused".to_string()));
            }

            let state = self.state.lock().unwrap();
            let descriptors = state
                .wallets
                .get(name)
                .ok_or_else(|| WalletError::NotLoaded(name.to_string()))?;

            Ok(DescriptorExport {
                wallet_metadata: serde_json::json!({
                    "walletname": name,
                    "format": "sqlite",
                    "descriptors": true,
                    "private_keys_enabled": true,
                }),
                descriptor_set: DescriptorSet {
                    wallet_name: Some(name.to_string()),
                    descriptors: if faults.empty_export {
                        Vec::new()
                    } else {
                        descriptors.clone()
                    },
                },
            })
        }

        fn import_descriptors(
            &self,
            name: &str,
            records: &[ImportDescriptor],
        ) -> Result<(), WalletError> {
            let faults = self.check_available()?;
            if faults.fail_import {
                return Err(WalletError::ImportRejected {
                    rejected: 1,
                    total: records.len(),
                    reason: "injected failure".to_string(),
                });
            }

            let mut state = self.state.lock().unwrap();
            let wallet = state
                .wallets
                .get_mut(name)
                .ok_or_else(|| WalletError::NotLoaded(name.to_string()))?;
            wallet.extend(records.iter().map(DescriptorRecord::from));
            Ok(())
        }

        fn get_balance(&self, name: &str) -> Option<String> {
            self.check_available().ok()?;
            self.is_loaded(name).then(|| "0.00000000".to_string())
        }
    }
}
