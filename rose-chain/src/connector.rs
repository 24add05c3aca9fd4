//! Wallet connector - owns the write side of the wallet session

use alloy::primitives::Address;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

use crate::rpc::RpcRoseContract;
use crate::session::{WalletHandle, WalletSession};
use crate::types::Result;
use crate::wallet::LocalWallet;

/// Publishes connect/disconnect events and keeps balances fresh
pub struct WalletConnector {
    tx: watch::Sender<Option<Arc<WalletSession>>>,
    balance_refresh: Duration,
    refresher: Mutex<Option<JoinHandle<()>>>,
}

impl WalletConnector {
    pub fn new(balance_refresh: Duration) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            tx,
            balance_refresh,
            refresher: Mutex::new(None),
        }
    }

    /// A new read handle on the connection
    pub fn handle(&self) -> WalletHandle {
        WalletHandle::new(self.tx.subscribe())
    }

    pub fn current(&self) -> Option<Arc<WalletSession>> {
        self.tx.borrow().clone()
    }

    /// Connect with a local key over JSON-RPC
    pub async fn connect_rpc(
        &self,
        wallet: &LocalWallet,
        rpc_url: &str,
        token: Address,
        confirmation_timeout: Duration,
    ) -> Result<Arc<WalletSession>> {
        let contract = RpcRoseContract::connect(wallet, rpc_url, token, confirmation_timeout)?;
        let session = WalletSession::open(wallet.address(), Arc::new(contract)).await?;
        Ok(self.publish(session))
    }

    /// Replace the current session and restart the balance refresher
    ///
    /// Must be called from within a tokio runtime.
    pub fn publish(&self, session: WalletSession) -> Arc<WalletSession> {
        let session = Arc::new(session);
        info!(
            "Wallet connected: {} on chain {}",
            session.address(),
            session.chain_id()
        );

        self.stop_refresher();
        self.tx.send_replace(Some(session.clone()));

        let refresher = spawn_balance_refresher(session.clone(), self.balance_refresh);
        *self.refresher.lock() = Some(refresher);

        session
    }

    /// Drop the session; every handle observes `None`
    pub fn disconnect(&self) {
        self.stop_refresher();
        if self.tx.send_replace(None).is_some() {
            info!("Wallet disconnected");
        }
    }

    fn stop_refresher(&self) {
        if let Some(handle) = self.refresher.lock().take() {
            handle.abort();
        }
    }
}

impl Drop for WalletConnector {
    fn drop(&mut self) {
        self.stop_refresher();
    }
}

fn spawn_balance_refresher(session: Arc<WalletSession>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately; the session was just read.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if let Err(e) = session.refresh_balances().await {
                warn!("Failed to refresh balances for {}: {}", session.address(), e);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockContract, TEST_OWNER};

    fn session(chain_id: u64) -> WalletSession {
        WalletSession::new(
            TEST_OWNER,
            chain_id,
            18,
            Arc::new(MockContract::new().with_chain_id(chain_id)),
        )
    }

    #[tokio::test]
    async fn test_handles_follow_connect_and_disconnect() {
        let connector = WalletConnector::new(Duration::from_secs(60));
        let mut handle = connector.handle();
        assert!(!handle.is_connected());

        connector.publish(session(1));
        assert!(handle.changed().await);
        assert_eq!(handle.current().map(|s| s.chain_id()), Some(1));

        // Handles created later see the current session too
        assert!(connector.handle().is_connected());

        connector.disconnect();
        assert!(handle.changed().await);
        assert!(handle.current().is_none());
        assert!(connector.current().is_none());
    }

    #[tokio::test]
    async fn test_publish_replaces_session() {
        let connector = WalletConnector::new(Duration::from_secs(60));
        let handle = connector.handle();

        connector.publish(session(1));
        connector.publish(session(17000));

        assert_eq!(handle.current().map(|s| s.chain_id()), Some(17000));
    }
}
