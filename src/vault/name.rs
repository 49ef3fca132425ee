// Wallet Vault - Wallet name validation

use crate::error::VaultError;

/// Longest name that still fits a single path segment.
pub const MAX_NAME_LEN: usize = 255;

/// Names become secret-store path segments and wallet directories, so only a
/// conservative portable alphabet is allowed.
pub fn validate_wallet_name(name: &str) -> Result<(), VaultError> {
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.');

    if name.is_empty()
        || name.len() > MAX_NAME_LEN
        || name == "."
        || name == ".."
        || !name.chars().all(allowed)
    {
        return Err(VaultError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_portable_names() {
        for name in ["alpha", "cold-storage_2024", "v1.2", "...", ".hidden", "A"] {
            assert!(validate_wallet_name(name).is_ok(), "{name:?} should be valid");
        }
    }

    #[test]
    fn test_rejects_unsafe_names() {
        for name in ["", ".", "..", "a/b", "a b", "wallet\n", "naïve", "x;rm"] {
            assert!(
                matches!(validate_wallet_name(name), Err(VaultError::InvalidName(_))),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_length_limit() {
        assert!(validate_wallet_name(&"a".repeat(MAX_NAME_LEN)).is_ok());
        assert!(validate_wallet_name(&"a".repeat(MAX_NAME_LEN + 1)).is_err());
    }
}
