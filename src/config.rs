// Wallet Vault - Configuration
//
// Everything is read from the environment once at startup. Connection
// details for bitcoind live in bitcoin.conf or the extra arguments; the
// password store location follows pass(1)'s own PASSWORD_STORE_DIR.

use std::path::PathBuf;

use thiserror::Error;

use crate::vault::validate_wallet_name;

const DEFAULT_PREFIX: &str = "bitcoind";
const DEFAULT_STAGING_DIR: &str = "/dev/shm";
const DEFAULT_BITCOIN_CLI: &str = "bitcoin-cli";
const DEFAULT_PASS: &str = "pass";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid store prefix {0:?}: use '/'-separated segments of letters, digits, '_', '-' or '.'")]
    InvalidPrefix(String),

    #[error("Cannot split WALLET_VAULT_BITCOIN_CLI_ARGS: {0:?}")]
    InvalidArguments(String),

    #[error("Cannot determine the home directory for the password store")]
    NoHomeDirectory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultConfig {
    /// Secret-store namespace every backup lives under.
    pub prefix: String,
    pub staging_dir: PathBuf,
    pub staging_fallback: PathBuf,
    pub bitcoin_cli: PathBuf,
    pub bitcoin_cli_args: Vec<String>,
    pub pass: PathBuf,
    pub password_store_dir: PathBuf,
}

impl VaultConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let prefix = get("WALLET_VAULT_PREFIX")
            .map(|p| p.trim_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_PREFIX.to_string());
        validate_prefix(&prefix)?;

        let bitcoin_cli_args = match get("WALLET_VAULT_BITCOIN_CLI_ARGS") {
            Some(raw) => shlex::split(&raw).ok_or(ConfigError::InvalidArguments(raw))?,
            None => Vec::new(),
        };

        let password_store_dir = match get("PASSWORD_STORE_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => dirs_next::home_dir()
                .ok_or(ConfigError::NoHomeDirectory)?
                .join(".password-store"),
        };

        Ok(Self {
            prefix,
            staging_dir: get("WALLET_VAULT_STAGING_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STAGING_DIR)),
            staging_fallback: std::env::temp_dir(),
            bitcoin_cli: get("WALLET_VAULT_BITCOIN_CLI")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_BITCOIN_CLI)),
            bitcoin_cli_args,
            pass: get("WALLET_VAULT_PASS")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PASS)),
            password_store_dir,
        })
    }
}

fn validate_prefix(prefix: &str) -> Result<(), ConfigError> {
    let valid = !prefix.is_empty()
        && prefix
            .split('/')
            .all(|segment| validate_wallet_name(segment).is_ok());
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidPrefix(prefix.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<VaultConfig, ConfigError> {
        let mut env: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        env.entry("PASSWORD_STORE_DIR".to_string())
            .or_insert_with(|| "/tmp/pass-store".to_string());
        VaultConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.prefix, "bitcoind");
        assert_eq!(cfg.staging_dir, PathBuf::from("/dev/shm"));
        assert_eq!(cfg.bitcoin_cli, PathBuf::from("bitcoin-cli"));
        assert!(cfg.bitcoin_cli_args.is_empty());
        assert_eq!(cfg.pass, PathBuf::from("pass"));
        assert_eq!(cfg.password_store_dir, PathBuf::from("/tmp/pass-store"));
    }

    #[test]
    fn test_overrides() {
        let cfg = config(&[
            ("WALLET_VAULT_PREFIX", "/crypto/bitcoind/"),
            ("WALLET_VAULT_STAGING_DIR", "/run/user/1000"),
            ("WALLET_VAULT_BITCOIN_CLI", "/opt/bitcoin/bin/bitcoin-cli"),
            ("WALLET_VAULT_BITCOIN_CLI_ARGS", "-regtest -datadir='/srv/bitcoin data'"),
            ("WALLET_VAULT_PASS", "/usr/local/bin/pass"),
        ])
        .unwrap();

        assert_eq!(cfg.prefix, "crypto/bitcoind");
        assert_eq!(cfg.staging_dir, PathBuf::from("/run/user/1000"));
        assert_eq!(
            cfg.bitcoin_cli_args,
            vec!["-regtest".to_string(), "-datadir=/srv/bitcoin data".to_string()]
        );
        assert_eq!(cfg.pass, PathBuf::from("/usr/local/bin/pass"));
    }

    #[test]
    fn test_empty_value_means_default() {
        let cfg = config(&[("WALLET_VAULT_PREFIX", "  ")]).unwrap();
        assert_eq!(cfg.prefix, "bitcoind");
    }

    #[test]
    fn test_invalid_prefix_rejected() {
        for bad in ["a//b", "../escape", "sp ace", "bit/./coin"] {
            assert!(
                matches!(
                    config(&[("WALLET_VAULT_PREFIX", bad)]),
                    Err(ConfigError::InvalidPrefix(_))
                ),
                "prefix {bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_unbalanced_quotes_rejected() {
        assert!(matches!(
            config(&[("WALLET_VAULT_BITCOIN_CLI_ARGS", "-datadir='/srv")]),
            Err(ConfigError::InvalidArguments(_))
        ));
    }
}
