//! Trade and transfer panels
//!
//! A panel owns its quote poller and orchestrator. Execution runs in a
//! detached task so closing the panel never abandons a submitted
//! transaction; the orchestrator writes the result to the session log.

use rose_chain::WalletHandle;
use rose_core::{format_amount, Quote, SlippageTolerance, SwapDirection};
use rose_services::{
    NotificationSink, QuotePoller, QuoteRequest, SessionLog, SwapQuoteEngine,
    TransactionOrchestrator, TxOutcome,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

/// Everything a panel needs from the terminal
#[derive(Clone)]
pub struct PanelContext {
    pub wallet: WalletHandle,
    pub notifier: Arc<dyn NotificationSink>,
    pub session_log: SessionLog,
    pub quote_refresh: Duration,
}

impl PanelContext {
    fn orchestrator(&self) -> Arc<TransactionOrchestrator> {
        Arc::new(TransactionOrchestrator::new(
            self.wallet.clone(),
            self.notifier.clone(),
            self.session_log.clone(),
        ))
    }
}

// ============================================================================
// Trade
// ============================================================================

/// Swap panel: amount entry, live quote, slippage and execution
pub struct TradePanel {
    direction: SwapDirection,
    amount_text: String,
    slippage: SlippageTolerance,
    engine: Arc<SwapQuoteEngine>,
    orchestrator: Arc<TransactionOrchestrator>,
    requests: watch::Sender<QuoteRequest>,
    _poller: QuotePoller,
}

impl TradePanel {
    /// Must be called from within a tokio runtime.
    pub fn open(ctx: &PanelContext) -> Self {
        let engine = Arc::new(SwapQuoteEngine::new(ctx.wallet.clone()));
        let (requests, rx) = watch::channel(QuoteRequest::default());
        let poller = QuotePoller::spawn(engine.clone(), rx, ctx.quote_refresh);

        debug!("Trade panel opened");
        Self {
            direction: SwapDirection::default(),
            amount_text: String::new(),
            slippage: SlippageTolerance::default(),
            engine,
            orchestrator: ctx.orchestrator(),
            requests,
            _poller: poller,
        }
    }

    pub fn direction(&self) -> SwapDirection {
        self.direction
    }

    pub fn amount_text(&self) -> &str {
        &self.amount_text
    }

    pub fn slippage(&self) -> SlippageTolerance {
        self.slippage
    }

    pub fn set_amount(&mut self, text: impl Into<String>) {
        self.amount_text = text.into();
        self.publish_request();
    }

    /// Swap which asset is paid; the quote is refetched
    pub fn toggle_direction(&mut self) {
        self.direction = self.direction.toggled();
        self.publish_request();
    }

    pub fn increase_slippage(&mut self) {
        self.slippage = self.slippage.increased();
    }

    pub fn decrease_slippage(&mut self) {
        self.slippage = self.slippage.decreased();
    }

    /// Latest quote for the current direction
    pub fn quote(&self) -> Option<Quote> {
        self.engine
            .last_quote()
            .filter(|q| q.direction == self.direction)
    }

    pub fn quote_text(&self) -> String {
        match self.quote() {
            Some(quote) => format!("Quote: {}", format_amount(quote.amount_out)),
            None => "Enter an amount to see quote".to_string(),
        }
    }

    /// Minimum output the next execution would accept
    pub fn min_out(&self) -> Option<Decimal> {
        self.quote()?;
        self.engine.min_out(self.slippage)
    }

    /// Fetch a quote now instead of waiting for the poller
    pub async fn refresh_quote(&self) -> Option<Quote> {
        self.engine.refresh(self.direction, &self.amount_text).await
    }

    pub fn can_execute(&self) -> bool {
        self.orchestrator.can_execute()
    }

    /// Start the swap in the background; `None` while one is in flight
    pub fn execute(&self) -> Option<JoinHandle<TxOutcome>> {
        if !self.can_execute() {
            return None;
        }

        let orchestrator = self.orchestrator.clone();
        let direction = self.direction;
        let amount_text = self.amount_text.clone();
        let quote = self.quote();
        let slippage = self.slippage;

        Some(tokio::spawn(async move {
            orchestrator
                .execute_swap(direction, &amount_text, quote.as_ref(), slippage)
                .await
        }))
    }

    fn publish_request(&self) {
        self.requests
            .send_replace(QuoteRequest::new(self.direction, self.amount_text.clone()));
    }
}

impl Drop for TradePanel {
    fn drop(&mut self) {
        debug!("Trade panel closed");
    }
}

// ============================================================================
// Transfer
// ============================================================================

/// Token transfer panel
pub struct TransferPanel {
    amount_text: String,
    recipient: String,
    orchestrator: Arc<TransactionOrchestrator>,
}

impl TransferPanel {
    pub fn open(ctx: &PanelContext) -> Self {
        Self {
            amount_text: String::new(),
            recipient: String::new(),
            orchestrator: ctx.orchestrator(),
        }
    }

    pub fn amount_text(&self) -> &str {
        &self.amount_text
    }

    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    pub fn set_amount(&mut self, text: impl Into<String>) {
        self.amount_text = text.into();
    }

    pub fn set_recipient(&mut self, recipient: impl Into<String>) {
        self.recipient = recipient.into();
    }

    pub fn can_execute(&self) -> bool {
        self.orchestrator.can_execute()
    }

    /// Start the transfer in the background; `None` while one is in flight
    pub fn execute(&self) -> Option<JoinHandle<TxOutcome>> {
        if !self.can_execute() {
            return None;
        }

        let orchestrator = self.orchestrator.clone();
        let amount_text = self.amount_text.clone();
        let recipient = self.recipient.clone();

        Some(tokio::spawn(async move {
            orchestrator.execute_transfer(&amount_text, &recipient).await
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rose_chain::testing::{session_with, MockContract};
    use rose_chain::BalanceSnapshot;
    use rust_decimal_macros::dec;

    fn context(contract: MockContract, log: SessionLog) -> PanelContext {
        let session = session_with(
            contract,
            1,
            BalanceSnapshot {
                native: dec!(10),
                token: dec!(100),
                native_reserve: dec!(50),
                token_reserve: dec!(1000),
            },
        );
        PanelContext {
            wallet: WalletHandle::fixed(Arc::new(session)),
            notifier: Arc::new(SessionLog::new()),
            session_log: log,
            quote_refresh: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn test_trade_panel_quotes_and_executes() {
        let log = SessionLog::new();
        let mut panel = TradePanel::open(&context(MockContract::new().with_rate(2, 1), log.clone()));
        assert_eq!(panel.quote_text(), "Enter an amount to see quote");

        panel.set_amount("1");
        panel.refresh_quote().await;
        assert_eq!(panel.quote_text(), "Quote: 2.000000");
        assert_eq!(panel.min_out(), Some(dec!(1.94)));

        panel.decrease_slippage();
        assert_eq!(panel.slippage().percent(), dec!(2.9));

        let outcome = panel.execute().unwrap().await.unwrap();
        assert!(outcome.is_confirmed());
        assert_eq!(log.len(), 1);
    }

    #[tokio::test]
    async fn test_toggle_hides_quote_for_other_direction() {
        let mut panel = TradePanel::open(&context(MockContract::new(), SessionLog::new()));
        panel.set_amount("1");
        panel.refresh_quote().await;
        assert!(panel.quote().is_some());

        panel.toggle_direction();
        assert_eq!(panel.direction(), SwapDirection::Withdraw);
        assert!(panel.quote().is_none());
    }

    #[tokio::test]
    async fn test_closing_panel_keeps_transaction() {
        let contract = MockContract::new();
        contract.gate_confirmations();
        let log = SessionLog::new();

        let mut panel = TransferPanel::open(&context(contract.clone(), log.clone()));
        panel.set_amount("5");
        panel.set_recipient(rose_chain::testing::TEST_OWNER.to_string());
        let handle = panel.execute().unwrap();

        tokio::task::yield_now().await;
        assert!(!panel.can_execute());
        assert!(panel.execute().is_none());
        drop(panel);

        contract.release_confirmation();
        assert!(handle.await.unwrap().is_confirmed());
        assert_eq!(log.drain()[0].to_plain_string(), "New balance: 95.000000🌹");
    }
}
