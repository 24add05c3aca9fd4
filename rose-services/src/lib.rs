//! Services for the Rose terminal
//!
//! This crate sits between the chain interface and the terminal: it quotes
//! swaps, runs transactions through validation and confirmation, and turns
//! price feeds into candles.

pub mod notifications;
pub mod ohlc;
pub mod orchestrator;
pub mod price_feed;
pub mod quote_engine;

pub use notifications::{ChannelSink, NotificationSink, SessionLog};
pub use ohlc::{aggregate, aggregate_width, bucket_start, fill_gaps, CandleSeries};
pub use orchestrator::{classify_failure, TransactionOrchestrator, TxOutcome, TxPhase};
pub use price_feed::{
    normalize_feed, HttpPriceFeed, PoolPriceSampler, PriceFeed, PriceFeedError,
    POOL_SAMPLE_CAPACITY,
};
pub use quote_engine::{QuotePoller, QuoteRequest, SwapQuoteEngine, DEFAULT_QUOTE_REFRESH};
