//! Core types for the Rose Terminal
//!
//! This crate defines the shared data structures used across the terminal,
//! including amounts, swap parameters, output log entries and price series.

pub mod amount;
pub mod error;
pub mod market;
pub mod network;
pub mod output;
pub mod swap;

pub use amount::{format_amount, is_below_minimum, parse_amount, DISPLAY_DECIMALS, MIN_AMOUNT};
pub use error::{TerminalError, TerminalResult};
pub use market::{Candle, CandleInterval, PricePoint};
pub use network::{Network, SupportedNetworks, CHANGE_NETWORK_MESSAGE};
pub use output::{EntryKind, Glyph, HistoryEntry, InlineToken, Output, OutputKind};
pub use swap::{Quote, SlippageTolerance, SwapDirection};
