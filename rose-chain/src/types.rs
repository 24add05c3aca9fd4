//! Shared types for the Rose contract interface

use alloy::primitives::{Address, TxHash, U256};

// ============================================================================
// Contract Constants
// ============================================================================

/// The native coin always carries 18 decimals
pub const NATIVE_DECIMALS: u8 = 18;

/// Interval between receipt polls while waiting for confirmation
pub const RECEIPT_POLL_INTERVAL_MS: u64 = 1_000;

// ============================================================================
// Chain Data
// ============================================================================

/// Liquidity held by the Rose contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolReserves {
    /// Native coin held by the pool (smallest unit)
    pub native: U256,
    /// Tokens held by the pool (smallest unit)
    pub token: U256,
}

/// Mined transaction summary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    /// `false` when the transaction reverted on-chain
    pub success: bool,
}

/// Recipient of a token transfer, before resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    Address(Address),
    /// Human-readable handle, e.g. `rosemoney.eth`
    Name(String),
}

impl Recipient {
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        match input.parse::<Address>() {
            Ok(address) => Recipient::Address(address),
            Err(_) => Recipient::Name(input.to_string()),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Errors that can occur when talking to the chain
#[derive(Debug, Clone, thiserror::Error)]
pub enum ChainError {
    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    /// The node or signer refused the request with a reason
    #[error("{reason}")]
    Provider { reason: String },

    #[error("Transaction reverted{}", .reason.as_ref().map(|r| format!(": {}", r)).unwrap_or_default())]
    Reverted { reason: Option<String> },

    #[error("Unit conversion error: {0}")]
    Units(String),

    #[error("Timed out waiting for confirmation of {0}")]
    Timeout(TxHash),
}

impl ChainError {
    /// Reason reported by the provider, if any
    pub fn provider_reason(&self) -> Option<&str> {
        match self {
            ChainError::Provider { reason } => Some(reason),
            ChainError::Reverted { reason } => reason.as_deref(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ChainError>;
