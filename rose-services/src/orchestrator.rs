//! Transaction Orchestrator
//!
//! Validates, submits and confirms swaps and token transfers for one panel.
//! At most one transaction is in flight per orchestrator.

use rose_chain::{
    to_base_units, Address, BalanceSnapshot, ChainError, Recipient, TxHash, WalletHandle,
    WalletSession, U256,
};
use rose_core::{
    format_amount, is_below_minimum, parse_amount, Glyph, Output, Quote, SlippageTolerance,
    SwapDirection, TerminalError, TerminalResult,
};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, instrument, warn};

use crate::notifications::{NotificationSink, SessionLog};

pub const NOT_CONNECTED_MESSAGE: &str = "Please connect your wallet first.";
pub const AMOUNT_TOO_SMALL_MESSAGE: &str = "Amount too small. Minimum amount is 0.000001";
pub const TX_SENT_MESSAGE: &str = "Transaction sent. Waiting for confirmation...";
pub const USER_REJECTED_MESSAGE: &str = "User rejected the request.";
pub const NO_QUOTE_MESSAGE: &str = "No quote available. Enter an amount and wait for a quote.";
pub const INVALID_RECIPIENT_MESSAGE: &str = "Invalid recipient address or unresolved ENS name.";
pub const TRANSFER_REFUSED_REASON: &str = "Token transfer returned false";

/// Largest single withdraw, as a fraction of the token reserve
const POOL_CAP_DIVISOR: u32 = 20;

// ============================================================================
// State
// ============================================================================

/// Lifecycle of the orchestrator's current transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TxPhase {
    #[default]
    Idle,
    Validating,
    Rejected,
    Submitted(TxHash),
    Confirmed(TxHash),
    Failed,
}

/// Result of one execution attempt
#[derive(Debug, Clone, PartialEq)]
pub enum TxOutcome {
    /// Another transaction is in flight; nothing happened
    Busy,
    /// Refused before submission
    Rejected(TerminalError),
    Confirmed { tx_hash: TxHash, output: Output },
    Failed(TerminalError),
}

impl TxOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, TxOutcome::Confirmed { .. })
    }
}

/// Holds the in-flight flag; clearing it and resetting the phase on drop
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
    phase: &'a watch::Sender<TxPhase>,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.phase.send_replace(TxPhase::Idle);
        self.flag.store(false, Ordering::Release);
    }
}

// ============================================================================
// Failure Classification
// ============================================================================

/// Map a chain failure to the message shown to the user
///
/// The provider's reason wins over the generic error text; anything
/// mentioning a rejection is reported as a user rejection.
pub fn classify_failure(err: &ChainError) -> TerminalError {
    let text = err
        .provider_reason()
        .map(str::to_string)
        .unwrap_or_else(|| err.to_string());

    if text.to_lowercase().contains("rejected") {
        TerminalError::transaction(USER_REJECTED_MESSAGE)
    } else {
        TerminalError::transaction(text)
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Drives one panel's transactions from validation to confirmation
pub struct TransactionOrchestrator {
    wallet: WalletHandle,
    notifier: Arc<dyn NotificationSink>,
    log: SessionLog,
    in_flight: AtomicBool,
    phase: watch::Sender<TxPhase>,
}

impl TransactionOrchestrator {
    pub fn new(wallet: WalletHandle, notifier: Arc<dyn NotificationSink>, log: SessionLog) -> Self {
        let (phase, _rx) = watch::channel(TxPhase::Idle);
        Self {
            wallet,
            notifier,
            log,
            in_flight: AtomicBool::new(false),
            phase,
        }
    }

    /// Whether a new execution would be accepted
    pub fn can_execute(&self) -> bool {
        !self.in_flight.load(Ordering::Acquire)
    }

    pub fn phase(&self) -> TxPhase {
        *self.phase.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<TxPhase> {
        self.phase.subscribe()
    }

    fn try_enter(&self) -> Option<InFlightGuard<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        self.phase.send_replace(TxPhase::Validating);
        Some(InFlightGuard {
            flag: &self.in_flight,
            phase: &self.phase,
        })
    }

    /// Swap `amount_text` of the input asset using the last quote
    #[instrument(skip(self, quote))]
    pub async fn execute_swap(
        &self,
        direction: SwapDirection,
        amount_text: &str,
        quote: Option<&Quote>,
        slippage: SlippageTolerance,
    ) -> TxOutcome {
        let Some(_guard) = self.try_enter() else {
            warn!("Swap ignored, a transaction is already in flight");
            return TxOutcome::Busy;
        };

        let prepared = match self.prepare_swap(direction, amount_text, quote, slippage).await {
            Ok(prepared) => prepared,
            Err(err) => return self.reject(err),
        };
        let PreparedSwap {
            session,
            amount,
            amount_out,
            amount_in_units,
            min_out_units,
        } = prepared;

        let contract = session.contract();
        let submitted = match direction {
            SwapDirection::Deposit => contract.deposit(amount_in_units, min_out_units).await,
            SwapDirection::Withdraw => contract.withdraw(amount_in_units, min_out_units).await,
        };

        let tx_hash = match submitted {
            Ok(tx_hash) => tx_hash,
            Err(e) => return self.fail(&e, "Error during trade. Please try again."),
        };
        self.mark_submitted(tx_hash);

        if let Err(e) = self.confirm(&session, tx_hash).await {
            return self.fail(&e, "Error during trade. Please try again.");
        }

        // Reports the quoted amount, not the amount realised on-chain.
        let output = Output::success(format!(
            "Successfully {} {}",
            direction.past_tense(),
            format_amount(amount)
        ))
        .glyph(direction.input_glyph())
        .text(&format!(" for {}", format_amount(amount_out)))
        .glyph(direction.output_glyph());

        self.succeed(tx_hash, output)
    }

    async fn prepare_swap(
        &self,
        direction: SwapDirection,
        amount_text: &str,
        quote: Option<&Quote>,
        slippage: SlippageTolerance,
    ) -> TerminalResult<PreparedSwap> {
        let session = self.session()?;
        let amount = validate_amount(amount_text)?;
        let balances = self.balances(&session).await?;

        match direction {
            SwapDirection::Deposit => {
                if amount > balances.native {
                    return Err(TerminalError::balance(
                        "Insufficient ETH balance. Please enter a smaller amount.",
                    ));
                }
            }
            SwapDirection::Withdraw => {
                if amount > balances.token {
                    return Err(TerminalError::balance(
                        "Insufficient ROSE balance. Please enter a smaller amount.",
                    ));
                }
                let cap = balances.token_reserve / Decimal::from(POOL_CAP_DIVISOR);
                if amount > cap {
                    return Err(TerminalError::balance(format!(
                        "Amount exceeds the pool limit. Maximum per trade is {}",
                        format_amount(cap)
                    )));
                }
            }
        }

        let quote = quote
            .filter(|q| q.direction == direction)
            .ok_or_else(|| TerminalError::user_input(NO_QUOTE_MESSAGE))?;

        let output_decimals = session.output_decimals(direction);
        let min_out = slippage.min_acceptable_output(quote.amount_out, u32::from(output_decimals));

        let amount_in_units = to_base_units(amount, session.input_decimals(direction))
            .map_err(|e| TerminalError::user_input(e.to_string()))?;
        let min_out_units = to_base_units(min_out, output_decimals)
            .map_err(|e| TerminalError::internal(e.to_string()))?;

        Ok(PreparedSwap {
            session,
            amount,
            amount_out: quote.amount_out,
            amount_in_units,
            min_out_units,
        })
    }

    /// Send `amount_text` tokens to an address or ENS name
    #[instrument(skip(self))]
    pub async fn execute_transfer(&self, amount_text: &str, recipient: &str) -> TxOutcome {
        let Some(_guard) = self.try_enter() else {
            warn!("Transfer ignored, a transaction is already in flight");
            return TxOutcome::Busy;
        };

        let (session, amount, balance, to) =
            match self.prepare_transfer(amount_text, recipient).await {
                Ok(prepared) => prepared,
                Err(err) => return self.reject(err),
            };

        let amount_units = match to_base_units(amount, session.token_decimals()) {
            Ok(units) => units,
            Err(e) => return self.reject(TerminalError::user_input(e.to_string())),
        };

        let refused = match session.contract().simulate_transfer(to, amount_units).await {
            Ok(accepted) => !accepted,
            Err(e) => return self.fail(&e, "Error during transfer. Please try again."),
        };
        if refused {
            let cause = ChainError::Reverted {
                reason: Some(TRANSFER_REFUSED_REASON.to_string()),
            };
            return self.fail(&cause, "Error during transfer. Please try again.");
        }

        let tx_hash = match session.contract().transfer(to, amount_units).await {
            Ok(tx_hash) => tx_hash,
            Err(e) => return self.fail(&e, "Error during transfer. Please try again."),
        };
        self.mark_submitted(tx_hash);

        if let Err(e) = self.confirm(&session, tx_hash).await {
            return self.fail(&e, "Error during transfer. Please try again.");
        }

        let output = Output::success(format!("New balance: {}", format_amount(balance - amount)))
            .glyph(Glyph::Token);
        self.succeed(tx_hash, output)
    }

    async fn prepare_transfer(
        &self,
        amount_text: &str,
        recipient: &str,
    ) -> TerminalResult<(Arc<WalletSession>, Decimal, Decimal, Address)> {
        let session = self.session()?;
        let amount = validate_amount(amount_text)?;
        let balances = self.balances(&session).await?;

        if amount > balances.token {
            return Err(TerminalError::balance(format!(
                "Insufficient funds. Current balance: {}",
                format_amount(balances.token)
            )));
        }

        let to = match Recipient::parse(recipient) {
            Recipient::Address(address) => Some(address),
            Recipient::Name(name) if name.is_empty() => None,
            Recipient::Name(name) => match session.contract().resolve_name(&name).await {
                Ok(resolved) => resolved,
                Err(e) => {
                    warn!("Error resolving ENS name {}: {}", name, e);
                    None
                }
            },
        };
        let to = to.ok_or_else(|| TerminalError::user_input(INVALID_RECIPIENT_MESSAGE))?;

        Ok((session, amount, balances.token, to))
    }

    // ------------------------------------------------------------------------
    // Steps shared by swaps and transfers
    // ------------------------------------------------------------------------

    fn session(&self) -> TerminalResult<Arc<WalletSession>> {
        self.wallet
            .current()
            .ok_or_else(|| TerminalError::wallet_state(NOT_CONNECTED_MESSAGE))
    }

    async fn balances(&self, session: &WalletSession) -> TerminalResult<BalanceSnapshot> {
        if let Some(snapshot) = session.balances() {
            return Ok(snapshot);
        }
        session
            .refresh_balances()
            .await
            .map_err(|e| TerminalError::wallet_state(format!("Unable to read balances: {}", e)))
    }

    async fn confirm(&self, session: &WalletSession, tx_hash: TxHash) -> Result<(), ChainError> {
        let receipt = session.contract().wait_for_confirmation(tx_hash).await?;
        if !receipt.success {
            return Err(ChainError::Reverted { reason: None });
        }
        if let Err(e) = session.refresh_balances().await {
            warn!("Failed to refresh balances after {}: {}", tx_hash, e);
        }
        Ok(())
    }

    fn mark_submitted(&self, tx_hash: TxHash) {
        info!("Transaction {} submitted", tx_hash);
        self.phase.send_replace(TxPhase::Submitted(tx_hash));
        self.notifier.notify(Output::pending(TX_SENT_MESSAGE));
    }

    fn reject(&self, err: TerminalError) -> TxOutcome {
        warn!("Transaction rejected: {}", err);
        self.phase.send_replace(TxPhase::Rejected);
        self.notifier.notify(Output::error(err.to_string()));
        TxOutcome::Rejected(err)
    }

    fn fail(&self, cause: &ChainError, log_line: &str) -> TxOutcome {
        let err = classify_failure(cause);
        error!("Transaction failed: {} ({})", err, cause);
        self.phase.send_replace(TxPhase::Failed);
        self.notifier.notify(Output::error(err.to_string()));
        self.log.push(Output::error(log_line));
        TxOutcome::Failed(err)
    }

    fn succeed(&self, tx_hash: TxHash, output: Output) -> TxOutcome {
        info!("Transaction {} confirmed", tx_hash);
        self.phase.send_replace(TxPhase::Confirmed(tx_hash));
        self.notifier.notify(output.clone());
        self.log.push(output.clone());
        TxOutcome::Confirmed { tx_hash, output }
    }
}

struct PreparedSwap {
    session: Arc<WalletSession>,
    amount: Decimal,
    amount_out: Decimal,
    amount_in_units: U256,
    min_out_units: U256,
}

fn validate_amount(amount_text: &str) -> TerminalResult<Decimal> {
    let amount = parse_amount(amount_text)?;
    if is_below_minimum(amount) {
        return Err(TerminalError::user_input(AMOUNT_TOO_SMALL_MESSAGE));
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rose_chain::testing::{session_with, units, MockCall, MockContract, TEST_OWNER};
    use rose_core::OutputKind;
    use rust_decimal_macros::dec;

    struct Fixture {
        orchestrator: Arc<TransactionOrchestrator>,
        contract: MockContract,
        notifications: SessionLog,
        log: SessionLog,
    }

    fn snapshot() -> BalanceSnapshot {
        BalanceSnapshot {
            native: dec!(10),
            token: dec!(100),
            native_reserve: dec!(50),
            token_reserve: dec!(1000),
        }
    }

    fn fixture_with(contract: MockContract, snapshot: BalanceSnapshot) -> Fixture {
        let session = session_with(contract.clone(), 1, snapshot);
        let notifications = SessionLog::new();
        let log = SessionLog::new();
        let orchestrator = TransactionOrchestrator::new(
            WalletHandle::fixed(Arc::new(session)),
            Arc::new(notifications.clone()),
            log.clone(),
        );
        Fixture {
            orchestrator: Arc::new(orchestrator),
            contract,
            notifications,
            log,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(MockContract::new(), snapshot())
    }

    fn deposit_quote(amount_out: Decimal) -> Quote {
        Quote::new(SwapDirection::Deposit, dec!(1), amount_out)
    }

    #[test]
    fn test_classify_failure() {
        let rejected = ChainError::Provider {
            reason: "MetaMask Tx Signature: User REJECTED transaction".to_string(),
        };
        assert_eq!(
            classify_failure(&rejected),
            TerminalError::transaction(USER_REJECTED_MESSAGE)
        );

        let reverted = ChainError::Reverted {
            reason: Some("slippage".to_string()),
        };
        assert_eq!(
            classify_failure(&reverted),
            TerminalError::transaction("slippage")
        );

        let rpc = ChainError::Rpc("connection refused".to_string());
        assert_eq!(
            classify_failure(&rpc),
            TerminalError::transaction("RPC error: connection refused")
        );
    }

    #[tokio::test]
    async fn test_swap_requires_connection() {
        let notifications = SessionLog::new();
        let orchestrator = TransactionOrchestrator::new(
            WalletHandle::disconnected(),
            Arc::new(notifications.clone()),
            SessionLog::new(),
        );

        let outcome = orchestrator
            .execute_swap(
                SwapDirection::Deposit,
                "1",
                Some(&deposit_quote(dec!(100))),
                SlippageTolerance::default(),
            )
            .await;

        assert_eq!(
            outcome,
            TxOutcome::Rejected(TerminalError::wallet_state(NOT_CONNECTED_MESSAGE))
        );
        assert_eq!(notifications.drain()[0].text, NOT_CONNECTED_MESSAGE);
    }

    #[tokio::test]
    async fn test_swap_amount_too_small() {
        let f = fixture();

        let outcome = f
            .orchestrator
            .execute_swap(
                SwapDirection::Deposit,
                "0.0000001",
                Some(&deposit_quote(dec!(100))),
                SlippageTolerance::default(),
            )
            .await;

        assert_eq!(
            outcome,
            TxOutcome::Rejected(TerminalError::user_input(AMOUNT_TOO_SMALL_MESSAGE))
        );
        assert_eq!(f.contract.submissions(), 0);
        assert!(f.log.is_empty());
        assert!(f.orchestrator.can_execute());
    }

    #[tokio::test]
    async fn test_deposit_exceeding_balance_is_rejected() {
        let f = fixture();

        let outcome = f
            .orchestrator
            .execute_swap(
                SwapDirection::Deposit,
                "10.5",
                Some(&deposit_quote(dec!(100))),
                SlippageTolerance::default(),
            )
            .await;

        assert!(matches!(outcome, TxOutcome::Rejected(TerminalError::Balance(_))));
        assert_eq!(f.contract.submissions(), 0);
    }

    #[tokio::test]
    async fn test_withdraw_pool_cap() {
        let f = fixture_with(
            MockContract::new(),
            BalanceSnapshot {
                token: dec!(500),
                ..snapshot()
            },
        );
        let quote = Quote::new(SwapDirection::Withdraw, dec!(60), dec!(3));

        let outcome = f
            .orchestrator
            .execute_swap(
                SwapDirection::Withdraw,
                "60",
                Some(&quote),
                SlippageTolerance::default(),
            )
            .await;

        assert_eq!(
            outcome,
            TxOutcome::Rejected(TerminalError::balance(
                "Amount exceeds the pool limit. Maximum per trade is 50.000000"
            ))
        );
        assert_eq!(f.contract.submissions(), 0);
    }

    #[tokio::test]
    async fn test_swap_without_quote_is_rejected() {
        let f = fixture();

        let outcome = f
            .orchestrator
            .execute_swap(SwapDirection::Deposit, "1", None, SlippageTolerance::default())
            .await;

        assert_eq!(
            outcome,
            TxOutcome::Rejected(TerminalError::user_input(NO_QUOTE_MESSAGE))
        );
    }

    #[tokio::test]
    async fn test_deposit_confirmed() {
        let f = fixture();

        let outcome = f
            .orchestrator
            .execute_swap(
                SwapDirection::Deposit,
                "1",
                Some(&deposit_quote(dec!(100))),
                SlippageTolerance::default(),
            )
            .await;

        assert!(outcome.is_confirmed());
        assert_eq!(
            f.contract.calls(),
            vec![MockCall::Deposit {
                value: units(1),
                min_out: units(97),
            }]
        );

        let notifications = f.notifications.drain();
        assert_eq!(notifications.len(), 2);
        assert_eq!(notifications[0].text, TX_SENT_MESSAGE);
        assert_eq!(notifications[1].kind, OutputKind::Success);
        assert_eq!(
            notifications[1].to_plain_string(),
            "Successfully deposited 1.000000ETH for 100.000000🌹"
        );

        assert_eq!(f.log.len(), 1);
        assert_eq!(f.orchestrator.phase(), TxPhase::Idle);
        assert!(f.orchestrator.can_execute());
    }

    #[tokio::test]
    async fn test_user_rejection_reports_once() {
        let f = fixture();
        f.contract.fail_next_submit(ChainError::Provider {
            reason: "user rejected transaction".to_string(),
        });

        let outcome = f
            .orchestrator
            .execute_swap(
                SwapDirection::Deposit,
                "1",
                Some(&deposit_quote(dec!(100))),
                SlippageTolerance::default(),
            )
            .await;

        assert_eq!(
            outcome,
            TxOutcome::Failed(TerminalError::transaction(USER_REJECTED_MESSAGE))
        );
        let notifications = f.notifications.drain();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].text, USER_REJECTED_MESSAGE);
        assert_eq!(f.log.len(), 1);
        assert!(f.orchestrator.can_execute());
    }

    #[tokio::test]
    async fn test_revert_on_chain_fails() {
        let f = fixture();
        f.contract.revert_on_chain();

        let outcome = f
            .orchestrator
            .execute_swap(
                SwapDirection::Deposit,
                "1",
                Some(&deposit_quote(dec!(100))),
                SlippageTolerance::default(),
            )
            .await;

        assert_eq!(
            outcome,
            TxOutcome::Failed(TerminalError::transaction("Transaction reverted"))
        );
        assert_eq!(f.log.drain()[0].text, "Error during trade. Please try again.");
    }

    #[tokio::test]
    async fn test_concurrent_execution_is_busy() {
        let f = fixture();
        f.contract.gate_confirmations();

        let first = {
            let orchestrator = f.orchestrator.clone();
            tokio::spawn(async move {
                let quote = deposit_quote(dec!(100));
                orchestrator
                    .execute_swap(
                        SwapDirection::Deposit,
                        "1",
                        Some(&quote),
                        SlippageTolerance::default(),
                    )
                    .await
            })
        };

        let mut phase = f.orchestrator.subscribe();
        phase
            .wait_for(|p| matches!(p, TxPhase::Submitted(_)))
            .await
            .unwrap();
        assert!(!f.orchestrator.can_execute());

        let second = f
            .orchestrator
            .execute_swap(
                SwapDirection::Deposit,
                "1",
                Some(&deposit_quote(dec!(100))),
                SlippageTolerance::default(),
            )
            .await;
        assert_eq!(second, TxOutcome::Busy);

        f.contract.release_confirmation();
        assert!(first.await.unwrap().is_confirmed());
        assert_eq!(f.contract.submissions(), 1);
        assert!(f.orchestrator.can_execute());
    }

    #[tokio::test]
    async fn test_transfer_to_ens_name() {
        let recipient = Address::repeat_byte(0x22);
        let f = fixture_with(
            MockContract::new().with_name("rosemoney.eth", recipient),
            snapshot(),
        );

        let outcome = f.orchestrator.execute_transfer("10", "rosemoney.eth").await;

        match outcome {
            TxOutcome::Confirmed { output, .. } => {
                assert_eq!(output.to_plain_string(), "New balance: 90.000000🌹");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(
            f.contract.calls(),
            vec![MockCall::Transfer {
                to: recipient,
                amount: units(10),
            }]
        );
    }

    #[tokio::test]
    async fn test_transfer_guards() {
        let f = fixture();

        let outcome = f.orchestrator.execute_transfer("150", "rosemoney.eth").await;
        assert_eq!(
            outcome,
            TxOutcome::Rejected(TerminalError::balance(
                "Insufficient funds. Current balance: 100.000000"
            ))
        );

        let outcome = f.orchestrator.execute_transfer("1", "nobody.eth").await;
        assert_eq!(
            outcome,
            TxOutcome::Rejected(TerminalError::user_input(INVALID_RECIPIENT_MESSAGE))
        );

        let outcome = f
            .orchestrator
            .execute_transfer("1", &TEST_OWNER.to_string())
            .await;
        assert!(outcome.is_confirmed());
    }

    #[tokio::test]
    async fn test_withdraw_confirmed() {
        let f = fixture();
        let quote = Quote::new(SwapDirection::Withdraw, dec!(10), dec!(3));

        let outcome = f
            .orchestrator
            .execute_swap(
                SwapDirection::Withdraw,
                "10",
                Some(&quote),
                SlippageTolerance::default(),
            )
            .await;

        assert!(outcome.is_confirmed());
        assert_eq!(
            f.contract.calls(),
            vec![MockCall::Withdraw {
                amount: units(10),
                min_out: U256::from(291u64) * U256::from(10u64).pow(U256::from(16u64)),
            }]
        );
        assert_eq!(
            f.log.drain()[0].to_plain_string(),
            "Successfully withdrawn 10.000000🌹 for 3.000000ETH"
        );
    }

    #[tokio::test]
    async fn test_withdraw_min_out_truncates_to_native_precision() {
        let f = fixture();
        let quote = Quote::new(SwapDirection::Withdraw, dec!(1), dec!(0.000000000000000001));

        let outcome = f
            .orchestrator
            .execute_swap(
                SwapDirection::Withdraw,
                "1",
                Some(&quote),
                SlippageTolerance::default(),
            )
            .await;

        assert!(outcome.is_confirmed());
        // 97% of one wei rounds down to nothing
        assert_eq!(
            f.contract.calls(),
            vec![MockCall::Withdraw {
                amount: units(1),
                min_out: U256::ZERO,
            }]
        );
    }

    #[tokio::test]
    async fn test_withdraw_exceeding_token_balance_is_rejected() {
        let f = fixture();
        let quote = Quote::new(SwapDirection::Withdraw, dec!(120), dec!(6));

        let outcome = f
            .orchestrator
            .execute_swap(
                SwapDirection::Withdraw,
                "120",
                Some(&quote),
                SlippageTolerance::default(),
            )
            .await;

        assert_eq!(
            outcome,
            TxOutcome::Rejected(TerminalError::balance(
                "Insufficient ROSE balance. Please enter a smaller amount."
            ))
        );
        assert_eq!(f.contract.submissions(), 0);
        assert!(f.log.is_empty());
    }

    #[tokio::test]
    async fn test_confirmation_timeout_releases_lock() {
        let f = fixture();
        f.contract
            .fail_next_confirmation(ChainError::Timeout(TxHash::with_last_byte(1)));

        let outcome = f
            .orchestrator
            .execute_swap(
                SwapDirection::Deposit,
                "1",
                Some(&deposit_quote(dec!(100))),
                SlippageTolerance::default(),
            )
            .await;

        assert!(matches!(outcome, TxOutcome::Failed(TerminalError::Transaction(_))));
        assert_eq!(f.contract.submissions(), 1);
        assert!(f.orchestrator.can_execute());
        assert_eq!(f.orchestrator.phase(), TxPhase::Idle);

        let log = f.log.drain();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].text, "Error during trade. Please try again.");

        let notifications = f.notifications.drain();
        assert_eq!(notifications.len(), 2);
        assert_eq!(notifications[1].kind, OutputKind::Error);
    }

    #[tokio::test]
    async fn test_refused_transfer_fails() {
        let f = fixture();
        f.contract.refuse_transfers();

        let outcome = f
            .orchestrator
            .execute_transfer("5", &TEST_OWNER.to_string())
            .await;

        assert_eq!(
            outcome,
            TxOutcome::Failed(TerminalError::transaction(TRANSFER_REFUSED_REASON))
        );
        assert_eq!(f.contract.submissions(), 0);
        assert_eq!(
            f.log.drain(),
            vec![Output::error("Error during transfer. Please try again.")]
        );
        assert!(f.orchestrator.can_execute());
    }
}
