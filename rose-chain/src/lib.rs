//! Rose Chain - Rose contract access
//!
//! This crate provides:
//! - Wallet management (loading a local signing key from env)
//! - The `RoseContract` interface and its JSON-RPC implementation
//! - Base-unit conversion
//! - Wallet sessions, handles and the connector that owns them

pub mod connector;
pub mod contract;
pub mod rpc;
pub mod session;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod types;
pub mod units;
pub mod wallet;

pub use connector::WalletConnector;
pub use contract::RoseContract;
pub use rpc::RpcRoseContract;
pub use session::{BalanceSnapshot, WalletHandle, WalletSession};
pub use types::*;
pub use units::{from_base_units, to_base_units};
pub use wallet::LocalWallet;

// Re-exported so downstream crates share one alloy version
pub use alloy::primitives::{Address, TxHash, U256};
