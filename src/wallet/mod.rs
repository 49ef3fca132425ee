// Wallet Vault - Wallet Module
//
// The wallet-holding service. `WalletService` is the narrow capability set
// the transfer protocol needs; `BitcoinCli` drives Bitcoin Core through
// `bitcoin-cli`, keeping descriptors off the command line.

mod bitcoind;
mod error;
mod service;

pub use bitcoind::BitcoinCli;
pub use error::WalletError;
pub use service::{WalletService, WalletTemplate};

#[cfg(test)]
pub use service::mock;
