//! Wallet session - the process-wide connection capability
//!
//! A session exists from connect to disconnect. Components receive a
//! [`WalletHandle`] and re-read the current session on every use instead of
//! caching it.

use alloy::primitives::Address;
use parking_lot::RwLock;
use rose_core::{Network, SwapDirection};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

use crate::contract::RoseContract;
use crate::types::{Result, NATIVE_DECIMALS};
use crate::units::from_base_units;

/// Balances of the connected address and the pool, in display units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BalanceSnapshot {
    pub native: Decimal,
    pub token: Decimal,
    pub native_reserve: Decimal,
    pub token_reserve: Decimal,
}

impl BalanceSnapshot {
    /// Pool price of one token in native coin; `None` on an empty pool
    pub fn pool_price(&self) -> Option<Decimal> {
        if self.token_reserve.is_zero() {
            return None;
        }
        self.native_reserve.checked_div(self.token_reserve)
    }
}

/// A connected wallet bound to the Rose contract
pub struct WalletSession {
    address: Address,
    chain_id: u64,
    token_decimals: u8,
    contract: Arc<dyn RoseContract>,
    balances: RwLock<Option<BalanceSnapshot>>,
}

impl WalletSession {
    pub fn new(
        address: Address,
        chain_id: u64,
        token_decimals: u8,
        contract: Arc<dyn RoseContract>,
    ) -> Self {
        Self {
            address,
            chain_id,
            token_decimals,
            contract,
            balances: RwLock::new(None),
        }
    }

    /// Read chain id, token decimals and balances, then build the session
    pub async fn open(address: Address, contract: Arc<dyn RoseContract>) -> Result<Self> {
        let chain_id = contract.chain_id().await?;
        let token_decimals = contract.token_decimals().await?;

        let session = Self::new(address, chain_id, token_decimals, contract);
        session.refresh_balances().await?;
        Ok(session)
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn network(&self) -> Option<Network> {
        Network::from_chain_id(self.chain_id)
    }

    pub fn token_decimals(&self) -> u8 {
        self.token_decimals
    }

    pub fn contract(&self) -> &Arc<dyn RoseContract> {
        &self.contract
    }

    /// Decimals of the asset paid in `direction`
    pub fn input_decimals(&self, direction: SwapDirection) -> u8 {
        match direction {
            SwapDirection::Deposit => NATIVE_DECIMALS,
            SwapDirection::Withdraw => self.token_decimals,
        }
    }

    /// Decimals of the asset received in `direction`
    pub fn output_decimals(&self, direction: SwapDirection) -> u8 {
        self.input_decimals(direction.toggled())
    }

    /// Last balance snapshot, if one was read
    pub fn balances(&self) -> Option<BalanceSnapshot> {
        *self.balances.read()
    }

    pub fn set_balances(&self, snapshot: BalanceSnapshot) {
        *self.balances.write() = Some(snapshot);
    }

    /// Re-read balances and reserves from the chain
    pub async fn refresh_balances(&self) -> Result<BalanceSnapshot> {
        let native = self.contract.native_balance(self.address).await?;
        let token = self.contract.token_balance_of(self.address).await?;
        let reserves = self.contract.pool_reserves().await?;

        let snapshot = BalanceSnapshot {
            native: from_base_units(native, NATIVE_DECIMALS)?,
            token: from_base_units(token, self.token_decimals)?,
            native_reserve: from_base_units(reserves.native, NATIVE_DECIMALS)?,
            token_reserve: from_base_units(reserves.token, self.token_decimals)?,
        };

        debug!(
            "Balances for {}: native={} token={}",
            self.address, snapshot.native, snapshot.token
        );
        self.set_balances(snapshot);
        Ok(snapshot)
    }
}

impl std::fmt::Debug for WalletSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletSession")
            .field("address", &self.address)
            .field("chain_id", &self.chain_id)
            .field("token_decimals", &self.token_decimals)
            .finish()
    }
}

// ============================================================================
// Handle
// ============================================================================

/// Read side of the wallet connection, cheap to clone
#[derive(Debug, Clone)]
pub struct WalletHandle {
    rx: watch::Receiver<Option<Arc<WalletSession>>>,
}

impl WalletHandle {
    pub(crate) fn new(rx: watch::Receiver<Option<Arc<WalletSession>>>) -> Self {
        Self { rx }
    }

    /// Handle that never connects
    pub fn disconnected() -> Self {
        let (_tx, rx) = watch::channel(None);
        Self { rx }
    }

    /// Handle pinned to a fixed session
    pub fn fixed(session: Arc<WalletSession>) -> Self {
        let (_tx, rx) = watch::channel(Some(session));
        Self { rx }
    }

    pub fn current(&self) -> Option<Arc<WalletSession>> {
        self.rx.borrow().clone()
    }

    pub fn is_connected(&self) -> bool {
        self.rx.borrow().is_some()
    }

    /// Wait for the next connect or disconnect
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}
