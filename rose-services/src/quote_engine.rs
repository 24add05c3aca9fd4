//! Swap Quote Engine
//!
//! Fetches advisory quotes from the Rose contract and keeps the latest one
//! for the minimum-output computation at submission.

use parking_lot::Mutex;
use rose_chain::{from_base_units, to_base_units, WalletHandle};
use rose_core::{parse_amount, Quote, SlippageTolerance, SwapDirection};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn};

/// Default period between background quote refreshes
pub const DEFAULT_QUOTE_REFRESH: Duration = Duration::from_secs(5);

/// What the quote should be computed for
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuoteRequest {
    pub direction: SwapDirection,
    pub amount_text: String,
}

impl QuoteRequest {
    pub fn new(direction: SwapDirection, amount_text: impl Into<String>) -> Self {
        Self {
            direction,
            amount_text: amount_text.into(),
        }
    }

    pub fn has_amount(&self) -> bool {
        !self.amount_text.trim().is_empty()
    }
}

#[derive(Debug, Default)]
struct StoredQuote {
    generation: u64,
    quote: Option<Quote>,
}

/// Quote source bound to the current wallet session
pub struct SwapQuoteEngine {
    wallet: WalletHandle,
    generation: AtomicU64,
    latest: Mutex<StoredQuote>,
}

impl SwapQuoteEngine {
    pub fn new(wallet: WalletHandle) -> Self {
        Self {
            wallet,
            generation: AtomicU64::new(0),
            latest: Mutex::new(StoredQuote::default()),
        }
    }

    /// Quote `amount_text` of the input asset in `direction`
    ///
    /// `None` when disconnected, when the amount does not parse, or when the
    /// contract call fails.
    pub async fn get_quote(&self, direction: SwapDirection, amount_text: &str) -> Option<Quote> {
        let session = self.wallet.current()?;
        let amount = parse_amount(amount_text).ok()?;

        let amount_in = match to_base_units(amount, session.input_decimals(direction)) {
            Ok(units) => units,
            Err(e) => {
                warn!("Cannot quote {}: {}", amount, e);
                return None;
            }
        };

        let contract = session.contract();
        let result = match direction {
            SwapDirection::Deposit => contract.quote_deposit(amount_in).await,
            SwapDirection::Withdraw => contract.quote_withdraw(amount_in).await,
        };

        let amount_out = match result
            .and_then(|out| from_base_units(out, session.output_decimals(direction)))
        {
            Ok(out) => out,
            Err(e) => {
                warn!("Error getting {} quote for {}: {}", direction, amount, e);
                return None;
            }
        };

        debug!("Quoted {} {} -> {}", direction, amount, amount_out);
        Some(Quote::new(direction, amount, amount_out))
    }

    /// Fetch and store a quote, discarding it if a newer refresh already landed
    pub async fn refresh(&self, direction: SwapDirection, amount_text: &str) -> Option<Quote> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let quote = self.get_quote(direction, amount_text).await;

        let mut latest = self.latest.lock();
        if latest.generation > generation {
            debug!(
                "Discarding stale quote (generation {} < {})",
                generation, latest.generation
            );
            return latest.quote.clone();
        }
        latest.generation = generation;
        latest.quote = quote.clone();
        quote
    }

    /// Forget the stored quote
    pub fn clear(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *self.latest.lock() = StoredQuote {
            generation,
            quote: None,
        };
    }

    pub fn last_quote(&self) -> Option<Quote> {
        self.latest.lock().quote.clone()
    }

    /// Minimum counter-asset output accepted for the stored quote
    pub fn min_out(&self, slippage: SlippageTolerance) -> Option<Decimal> {
        let quote = self.last_quote()?;
        let session = self.wallet.current()?;
        let decimals = session.output_decimals(quote.direction);
        Some(slippage.min_acceptable_output(quote.amount_out, u32::from(decimals)))
    }
}

impl std::fmt::Debug for SwapQuoteEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwapQuoteEngine")
            .field("generation", &self.generation.load(Ordering::Relaxed))
            .field("last_quote", &self.last_quote())
            .finish()
    }
}

// ============================================================================
// Poller
// ============================================================================

/// Background refresher for a panel's quote
///
/// Refreshes immediately when the request changes and every `period` while
/// an amount is present. Dropping the poller stops it.
pub struct QuotePoller {
    handle: JoinHandle<()>,
}

impl QuotePoller {
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        engine: Arc<SwapQuoteEngine>,
        mut requests: watch::Receiver<QuoteRequest>,
        period: Duration,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    changed = requests.changed() => {
                        if changed.is_err() {
                            debug!("Quote request channel closed, stopping poller");
                            break;
                        }
                        ticker.reset();
                    }
                }

                let request = requests.borrow_and_update().clone();
                if request.has_amount() {
                    engine.refresh(request.direction, &request.amount_text).await;
                } else {
                    engine.clear();
                }
            }
        });

        Self { handle }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for QuotePoller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
