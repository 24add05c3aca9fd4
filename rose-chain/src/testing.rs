//! In-memory Rose contract for tests

use alloy::primitives::{Address, TxHash, U256};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::contract::RoseContract;
use crate::session::{BalanceSnapshot, WalletSession};
use crate::types::{ChainError, PoolReserves, Result, TxReceipt};

/// Address used as the connected wallet in tests
pub const TEST_OWNER: Address = Address::repeat_byte(0x11);

/// A contract call recorded by [`MockContract`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    QuoteDeposit(U256),
    QuoteWithdraw(U256),
    Deposit { value: U256, min_out: U256 },
    Withdraw { amount: U256, min_out: U256 },
    Transfer { to: Address, amount: U256 },
}

#[derive(Debug)]
struct MockState {
    chain_id: u64,
    decimals: u8,
    native: HashMap<Address, U256>,
    token: HashMap<Address, U256>,
    reserves: PoolReserves,
    /// Quote output = input * numerator / denominator
    rate: (U256, U256),
    names: HashMap<String, Address>,
    quote_error: Option<ChainError>,
    submit_error: Option<ChainError>,
    confirm_error: Option<ChainError>,
    confirm_success: bool,
    transfer_accepted: bool,
    calls: Vec<MockCall>,
    next_tx: u64,
}

/// Scriptable [`RoseContract`] double
#[derive(Debug, Clone)]
pub struct MockContract {
    state: Arc<Mutex<MockState>>,
    confirmations: Arc<Semaphore>,
    gated: Arc<Mutex<bool>>,
}

impl Default for MockContract {
    fn default() -> Self {
        Self::new()
    }
}

impl MockContract {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                chain_id: 1,
                decimals: 18,
                native: HashMap::new(),
                token: HashMap::new(),
                reserves: PoolReserves::default(),
                rate: (U256::from(1u64), U256::from(1u64)),
                names: HashMap::new(),
                quote_error: None,
                submit_error: None,
                confirm_error: None,
                confirm_success: true,
                transfer_accepted: true,
                calls: Vec::new(),
                next_tx: 1,
            })),
            confirmations: Arc::new(Semaphore::new(0)),
            gated: Arc::new(Mutex::new(false)),
        }
    }

    pub fn with_chain_id(self, chain_id: u64) -> Self {
        self.state.lock().chain_id = chain_id;
        self
    }

    pub fn with_native_balance(self, owner: Address, amount: U256) -> Self {
        self.state.lock().native.insert(owner, amount);
        self
    }

    pub fn with_token_balance(self, owner: Address, amount: U256) -> Self {
        self.state.lock().token.insert(owner, amount);
        self
    }

    pub fn with_reserves(self, native: U256, token: U256) -> Self {
        self.state.lock().reserves = PoolReserves { native, token };
        self
    }

    pub fn with_rate(self, numerator: u64, denominator: u64) -> Self {
        self.state.lock().rate = (U256::from(numerator), U256::from(denominator));
        self
    }

    pub fn with_name(self, name: &str, address: Address) -> Self {
        self.state.lock().names.insert(name.to_string(), address);
        self
    }

    pub fn fail_quotes(&self, err: ChainError) {
        self.state.lock().quote_error = Some(err);
    }

    pub fn fail_next_submit(&self, err: ChainError) {
        self.state.lock().submit_error = Some(err);
    }

    pub fn fail_next_confirmation(&self, err: ChainError) {
        self.state.lock().confirm_error = Some(err);
    }

    /// Mined receipts report a revert
    pub fn revert_on_chain(&self) {
        self.state.lock().confirm_success = false;
    }

    /// The token's `transfer` returns `false` on simulation
    pub fn refuse_transfers(&self) {
        self.state.lock().transfer_accepted = false;
    }

    /// Hold confirmations until [`MockContract::release_confirmation`]
    pub fn gate_confirmations(&self) {
        *self.gated.lock() = true;
    }

    pub fn release_confirmation(&self) {
        self.confirmations.add_permits(1);
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.state.lock().calls.clone()
    }

    pub fn submissions(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| {
                matches!(
                    c,
                    MockCall::Deposit { .. } | MockCall::Withdraw { .. } | MockCall::Transfer { .. }
                )
            })
            .count()
    }

    fn quote(&self, amount: U256) -> Result<U256> {
        let state = self.state.lock();
        if let Some(err) = &state.quote_error {
            return Err(err.clone());
        }
        let (numerator, denominator) = state.rate;
        Ok(amount * numerator / denominator)
    }

    fn submit(&self, call: MockCall) -> Result<TxHash> {
        let mut state = self.state.lock();
        if let Some(err) = state.submit_error.take() {
            return Err(err);
        }
        state.calls.push(call);
        let tx = TxHash::with_last_byte(state.next_tx as u8);
        state.next_tx += 1;
        Ok(tx)
    }
}

#[async_trait]
impl RoseContract for MockContract {
    async fn chain_id(&self) -> Result<u64> {
        Ok(self.state.lock().chain_id)
    }

    async fn native_balance(&self, owner: Address) -> Result<U256> {
        Ok(self.state.lock().native.get(&owner).copied().unwrap_or_default())
    }

    async fn token_balance_of(&self, owner: Address) -> Result<U256> {
        Ok(self.state.lock().token.get(&owner).copied().unwrap_or_default())
    }

    async fn token_decimals(&self) -> Result<u8> {
        Ok(self.state.lock().decimals)
    }

    async fn pool_reserves(&self) -> Result<PoolReserves> {
        Ok(self.state.lock().reserves)
    }

    async fn quote_deposit(&self, amount: U256) -> Result<U256> {
        self.state.lock().calls.push(MockCall::QuoteDeposit(amount));
        self.quote(amount)
    }

    async fn quote_withdraw(&self, amount: U256) -> Result<U256> {
        self.state.lock().calls.push(MockCall::QuoteWithdraw(amount));
        self.quote(amount)
    }

    async fn deposit(&self, value: U256, min_out: U256) -> Result<TxHash> {
        self.submit(MockCall::Deposit { value, min_out })
    }

    async fn withdraw(&self, amount: U256, min_out: U256) -> Result<TxHash> {
        self.submit(MockCall::Withdraw { amount, min_out })
    }

    async fn simulate_transfer(&self, _to: Address, _amount: U256) -> Result<bool> {
        Ok(self.state.lock().transfer_accepted)
    }

    async fn transfer(&self, to: Address, amount: U256) -> Result<TxHash> {
        self.submit(MockCall::Transfer { to, amount })
    }

    async fn wait_for_confirmation(&self, tx: TxHash) -> Result<TxReceipt> {
        let gated = *self.gated.lock();
        if gated {
            let permit = self
                .confirmations
                .acquire()
                .await
                .map_err(|_| ChainError::Rpc("confirmation gate closed".to_string()))?;
            permit.forget();
        }

        let mut state = self.state.lock();
        if let Some(err) = state.confirm_error.take() {
            return Err(err);
        }
        Ok(TxReceipt {
            tx_hash: tx,
            block_number: Some(1),
            success: state.confirm_success,
        })
    }

    async fn resolve_name(&self, name: &str) -> Result<Option<Address>> {
        Ok(self.state.lock().names.get(name).copied())
    }
}

/// One whole unit of an 18-decimal asset
pub fn units(whole: u64) -> U256 {
    U256::from(whole) * U256::from(10u64).pow(U256::from(18u64))
}

/// Session over `contract` for [`TEST_OWNER`] with a preset snapshot
pub fn session_with(contract: MockContract, chain_id: u64, snapshot: BalanceSnapshot) -> WalletSession {
    let session = WalletSession::new(TEST_OWNER, chain_id, 18, Arc::new(contract));
    session.set_balances(snapshot);
    session
}
