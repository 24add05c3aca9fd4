//! JSON-RPC implementation of the Rose contract interface

use alloy::ens::ProviderEnsExt;
use alloy::network::ReceiptResponse;
use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::sol;
use alloy::transports::{RpcError, TransportError};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::contract::RoseContract;
use crate::types::{ChainError, PoolReserves, RECEIPT_POLL_INTERVAL_MS, Result, TxReceipt};
use crate::wallet::LocalWallet;

// ============================================================================
// Contract Bindings
// ============================================================================

sol! {
    #[sol(rpc)]
    interface IRose {
        function balanceOf(address owner) external view returns (uint256);
        function decimals() external view returns (uint8);
        function quoteDeposit(uint256 amount) external view returns (uint256);
        function quoteWithdraw(uint256 amount) external view returns (uint256);
        function deposit(uint256 minOut) external payable;
        function withdraw(uint256 amount, uint256 minOut) external;
        function transfer(address to, uint256 amount) external returns (bool);
    }
}

// ============================================================================
// Error Mapping
// ============================================================================

fn transport_error(err: TransportError) -> ChainError {
    if let RpcError::ErrorResp(payload) = &err {
        return ChainError::Provider {
            reason: payload.message.to_string(),
        };
    }
    ChainError::Rpc(err.to_string())
}

fn contract_error(err: alloy::contract::Error) -> ChainError {
    match err {
        alloy::contract::Error::TransportError(inner) => transport_error(inner),
        other => ChainError::Rpc(other.to_string()),
    }
}

// ============================================================================
// RPC Client
// ============================================================================

/// Rose contract reached over HTTP JSON-RPC, signing with a local wallet
pub struct RpcRoseContract {
    provider: DynProvider,
    token: Address,
    confirmation_timeout: Duration,
}

impl RpcRoseContract {
    /// Build a signing provider for `rpc_url` bound to the token at `token`
    pub fn connect(
        wallet: &LocalWallet,
        rpc_url: &str,
        token: Address,
        confirmation_timeout: Duration,
    ) -> Result<Self> {
        let url: url::Url = rpc_url
            .parse()
            .map_err(|e| ChainError::Rpc(format!("Invalid RPC url {}: {}", rpc_url, e)))?;

        let provider = ProviderBuilder::new()
            .wallet(wallet.ethereum_wallet())
            .connect_http(url)
            .erased();

        info!("Connected Rose contract {} via {}", token, rpc_url);

        Ok(Self {
            provider,
            token,
            confirmation_timeout,
        })
    }

    pub fn token_address(&self) -> Address {
        self.token
    }

    async fn poll_receipt(&self, tx: TxHash) -> Result<TxReceipt> {
        let mut ticker = tokio::time::interval(Duration::from_millis(RECEIPT_POLL_INTERVAL_MS));
        loop {
            ticker.tick().await;
            let receipt = self
                .provider
                .get_transaction_receipt(tx)
                .await
                .map_err(transport_error)?;

            if let Some(receipt) = receipt {
                return Ok(TxReceipt {
                    tx_hash: tx,
                    block_number: receipt.block_number(),
                    success: receipt.status(),
                });
            }
            debug!("Receipt for {} not available yet", tx);
        }
    }
}

impl std::fmt::Debug for RpcRoseContract {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcRoseContract")
            .field("token", &self.token)
            .field("confirmation_timeout", &self.confirmation_timeout)
            .finish()
    }
}

#[async_trait]
impl RoseContract for RpcRoseContract {
    async fn chain_id(&self) -> Result<u64> {
        self.provider.get_chain_id().await.map_err(transport_error)
    }

    async fn native_balance(&self, owner: Address) -> Result<U256> {
        self.provider
            .get_balance(owner)
            .await
            .map_err(transport_error)
    }

    async fn token_balance_of(&self, owner: Address) -> Result<U256> {
        IRose::new(self.token, self.provider.clone())
            .balanceOf(owner)
            .call()
            .await
            .map_err(contract_error)
    }

    async fn token_decimals(&self) -> Result<u8> {
        IRose::new(self.token, self.provider.clone())
            .decimals()
            .call()
            .await
            .map_err(contract_error)
    }

    async fn pool_reserves(&self) -> Result<PoolReserves> {
        let native = self.native_balance(self.token).await?;
        let token = self.token_balance_of(self.token).await?;
        Ok(PoolReserves { native, token })
    }

    async fn quote_deposit(&self, amount: U256) -> Result<U256> {
        IRose::new(self.token, self.provider.clone())
            .quoteDeposit(amount)
            .call()
            .await
            .map_err(contract_error)
    }

    async fn quote_withdraw(&self, amount: U256) -> Result<U256> {
        IRose::new(self.token, self.provider.clone())
            .quoteWithdraw(amount)
            .call()
            .await
            .map_err(contract_error)
    }

    #[instrument(skip(self))]
    async fn deposit(&self, value: U256, min_out: U256) -> Result<TxHash> {
        let pending = IRose::new(self.token, self.provider.clone())
            .deposit(min_out)
            .value(value)
            .send()
            .await
            .map_err(contract_error)?;

        let tx = *pending.tx_hash();
        info!("Deposit submitted: {}", tx);
        Ok(tx)
    }

    #[instrument(skip(self))]
    async fn withdraw(&self, amount: U256, min_out: U256) -> Result<TxHash> {
        let pending = IRose::new(self.token, self.provider.clone())
            .withdraw(amount, min_out)
            .send()
            .await
            .map_err(contract_error)?;

        let tx = *pending.tx_hash();
        info!("Withdraw submitted: {}", tx);
        Ok(tx)
    }

    async fn simulate_transfer(&self, to: Address, amount: U256) -> Result<bool> {
        IRose::new(self.token, self.provider.clone())
            .transfer(to, amount)
            .call()
            .await
            .map_err(contract_error)
    }

    #[instrument(skip(self))]
    async fn transfer(&self, to: Address, amount: U256) -> Result<TxHash> {
        let pending = IRose::new(self.token, self.provider.clone())
            .transfer(to, amount)
            .send()
            .await
            .map_err(contract_error)?;

        let tx = *pending.tx_hash();
        info!("Transfer submitted: {}", tx);
        Ok(tx)
    }

    #[instrument(skip(self))]
    async fn wait_for_confirmation(&self, tx: TxHash) -> Result<TxReceipt> {
        match tokio::time::timeout(self.confirmation_timeout, self.poll_receipt(tx)).await {
            Ok(receipt) => receipt,
            Err(_) => {
                warn!("Gave up waiting for {} after {:?}", tx, self.confirmation_timeout);
                Err(ChainError::Timeout(tx))
            }
        }
    }

    async fn resolve_name(&self, name: &str) -> Result<Option<Address>> {
        match self.provider.resolve_name(name).await {
            Ok(address) if address != Address::ZERO => Ok(Some(address)),
            Ok(_) => Ok(None),
            Err(e) => {
                debug!("ENS lookup for {} failed: {}", name, e);
                Err(ChainError::Rpc(format!("ENS lookup for {} failed: {}", name, e)))
            }
        }
    }
}
