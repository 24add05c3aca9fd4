//! Read/write interface of the Rose contract
//!
//! The terminal never talks to a node directly; every chain interaction goes
//! through this trait so services can be driven by an in-memory double.

use alloy::primitives::{Address, TxHash, U256};
use async_trait::async_trait;

use crate::types::{PoolReserves, Result, TxReceipt};

#[async_trait]
pub trait RoseContract: Send + Sync {
    /// Chain id of the connected node
    async fn chain_id(&self) -> Result<u64>;

    /// Native coin balance of `owner`
    async fn native_balance(&self, owner: Address) -> Result<U256>;

    /// Token balance of `owner`
    async fn token_balance_of(&self, owner: Address) -> Result<U256>;

    async fn token_decimals(&self) -> Result<u8>;

    /// Native and token liquidity held by the contract itself
    async fn pool_reserves(&self) -> Result<PoolReserves>;

    /// Tokens received for `amount` of native coin
    async fn quote_deposit(&self, amount: U256) -> Result<U256>;

    /// Native coin received for `amount` of tokens
    async fn quote_withdraw(&self, amount: U256) -> Result<U256>;

    /// Payable swap of `value` native coin into at least `min_out` tokens
    async fn deposit(&self, value: U256, min_out: U256) -> Result<TxHash>;

    /// Swap `amount` tokens into at least `min_out` native coin
    async fn withdraw(&self, amount: U256, min_out: U256) -> Result<TxHash>;

    /// Dry-run a token transfer and return the token's `bool` result
    async fn simulate_transfer(&self, to: Address, amount: U256) -> Result<bool>;

    /// Submit a token transfer
    async fn transfer(&self, to: Address, amount: U256) -> Result<TxHash>;

    /// Wait until `tx` is mined
    async fn wait_for_confirmation(&self, tx: TxHash) -> Result<TxReceipt>;

    /// Resolve a human-readable handle to an address
    async fn resolve_name(&self, name: &str) -> Result<Option<Address>>;
}
