//! Amount parsing and display helpers
//!
//! User amounts are non-negative decimals; everything shown in the terminal
//! carries exactly six fractional digits.

use rust_decimal::prelude::*;

use crate::error::{TerminalError, TerminalResult};

/// Fractional digits used for display and for the minimum-amount check
pub const DISPLAY_DECIMALS: u32 = 6;

/// Smallest amount a transfer or swap accepts (1e-6)
pub const MIN_AMOUNT: Decimal = Decimal::from_parts(1, 0, 0, false, 6);

/// Parse user-entered amount text
pub fn parse_amount(text: &str) -> TerminalResult<Decimal> {
    let text = text.trim();
    if text.is_empty() {
        return Err(TerminalError::user_input("Please enter an amount."));
    }

    let amount = Decimal::from_str(text)
        .map_err(|_| TerminalError::user_input(format!("Invalid amount: {}", text)))?;

    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(TerminalError::user_input("Amount must not be negative."));
    }

    Ok(amount)
}

/// Round half away from zero to the display precision
pub fn round_display(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(DISPLAY_DECIMALS, RoundingStrategy::MidpointAwayFromZero)
}

/// Whether an amount rounds to less than the minimum tradable unit
pub fn is_below_minimum(amount: Decimal) -> bool {
    round_display(amount) < MIN_AMOUNT
}

/// Format with exactly six fractional digits
pub fn format_amount(amount: Decimal) -> String {
    format!("{:.6}", round_display(amount))
}
