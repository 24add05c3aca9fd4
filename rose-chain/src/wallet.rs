//! Local signing key for the connected address

use alloy::network::EthereumWallet;
use alloy::primitives::{Address, B256};
use alloy::signers::local::PrivateKeySigner;
use std::str::FromStr;
use tracing::info;

use crate::types::{ChainError, Result};

/// Environment variable holding the signing key
pub const PRIVATE_KEY_ENV: &str = "ROSE_PRIVATE_KEY";

/// Key-backed wallet that signs swaps and transfers
///
/// The key never appears in `Debug` output.
#[derive(Clone)]
pub struct LocalWallet {
    signer: PrivateKeySigner,
}

impl LocalWallet {
    /// Parse a hex key, with or without the `0x` prefix
    pub fn from_private_key(private_key: &str) -> Result<Self> {
        let key = private_key.trim();
        let key = key.strip_prefix("0x").unwrap_or(key);

        let bytes = B256::from_str(key)
            .map_err(|e| ChainError::Wallet(format!("Invalid private key format: {}", e)))?;
        let signer = PrivateKeySigner::from_bytes(&bytes)
            .map_err(|e| ChainError::Wallet(format!("Failed to create signer: {}", e)))?;

        info!("Loaded signing key for {}", signer.address());
        Ok(Self { signer })
    }

    /// Load the key from `ROSE_PRIVATE_KEY`
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load the key through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let key = lookup(PRIVATE_KEY_ENV).filter(|k| !k.trim().is_empty()).ok_or_else(|| {
            ChainError::MissingCredentials(format!("{} is not set", PRIVATE_KEY_ENV))
        })?;
        Self::from_private_key(&key)
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Signer set for an alloy provider
    pub fn ethereum_wallet(&self) -> EthereumWallet {
        EthereumWallet::from(self.signer.clone())
    }
}

impl std::fmt::Debug for LocalWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalWallet")
            .field("address", &self.address())
            .finish()
    }
}
