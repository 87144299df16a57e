//! Local signing accounts exposed through the node-backed provider.
//!
//! # Security
//! - Private keys are loaded ONLY from environment variables
//! - Keys are never logged or serialized

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::{Signature, Signer};

use crate::node::types::{NodeError, NodeResult};

/// Environment variable holding comma-separated private keys.
pub const PRIVATE_KEYS_ENV_VAR: &str = "WALLET_PRIVATE_KEYS";

/// Ordered set of local signers. The first entry is the primary account.
#[derive(Debug, Clone, Default)]
pub struct LocalAccounts {
    signers: Vec<PrivateKeySigner>,
}

impl LocalAccounts {
    /// Parse hex-encoded private keys (with or without 0x prefix).
    pub fn from_private_keys<S: AsRef<str>>(keys: &[S]) -> NodeResult<Self> {
        let mut signers = Vec::with_capacity(keys.len());
        for key in keys {
            let key = key.as_ref().trim();
            let key_hex = key.strip_prefix("0x").unwrap_or(key);

            let signer: PrivateKeySigner = key_hex
                .parse()
                .map_err(|e| NodeError::Account(format!("Invalid private key format: {}", e)))?;

            tracing::info!(address = %signer.address(), "Local account loaded");
            signers.push(signer);
        }

        Ok(Self { signers })
    }

    /// Load accounts from `WALLET_PRIVATE_KEYS`.
    ///
    /// An unset variable yields an empty account set.
    pub fn from_env() -> NodeResult<Self> {
        match std::env::var(PRIVATE_KEYS_ENV_VAR) {
            Ok(value) => {
                let keys: Vec<&str> = value.split(',').filter(|k| !k.trim().is_empty()).collect();
                Self::from_private_keys(&keys)
            }
            Err(_) => {
                tracing::warn!(var = PRIVATE_KEYS_ENV_VAR, "No local accounts configured");
                Ok(Self::default())
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.signers.is_empty()
    }

    /// Account addresses in configuration order.
    pub fn addresses(&self) -> Vec<Address> {
        self.signers.iter().map(|s| s.address()).collect()
    }

    /// Sign arbitrary message bytes (with Ethereum prefix) as `address`.
    pub async fn sign_message(&self, address: Address, message: &[u8]) -> NodeResult<Signature> {
        let signer = self
            .signers
            .iter()
            .find(|s| s.address() == address)
            .ok_or_else(|| NodeError::Account(format!("Unknown account {}", address)))?;

        signer
            .sign_message(message)
            .await
            .map_err(|e| NodeError::Account(format!("Message signing failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known test private key (Anvil's first account)
    const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const TEST_ADDRESS: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

    #[test]
    fn test_accounts_from_private_key() {
        let accounts = LocalAccounts::from_private_keys(&[TEST_PRIVATE_KEY]).unwrap();
        assert_eq!(
            accounts.addresses()[0].to_string().to_lowercase(),
            TEST_ADDRESS
        );
    }

    #[test]
    fn test_accounts_with_0x_prefix() {
        let accounts = LocalAccounts::from_private_keys(&[format!("0x{}", TEST_PRIVATE_KEY)]).unwrap();
        assert_eq!(accounts.addresses().len(), 1);
        assert!(!accounts.is_empty());
    }

    #[test]
    fn test_invalid_private_key() {
        let result = LocalAccounts::from_private_keys(&["invalid_key"]);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid private key"));
    }

    #[tokio::test]
    async fn test_sign_message() {
        let accounts = LocalAccounts::from_private_keys(&[TEST_PRIVATE_KEY]).unwrap();
        let address = accounts.addresses()[0];
        let signature = accounts.sign_message(address, b"Hello, World!").await.unwrap();
        // Signature should be 65 bytes (r, s, v)
        assert_eq!(signature.as_bytes().len(), 65);
    }

    #[tokio::test]
    async fn test_sign_with_unknown_account() {
        let accounts = LocalAccounts::from_private_keys(&[TEST_PRIVATE_KEY]).unwrap();
        let result = accounts.sign_message(Address::ZERO, b"hi").await;
        assert!(result.is_err());
    }
}
