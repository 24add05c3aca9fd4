//! Swap data structures: direction, slippage tolerance and quotes

use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{TerminalError, TerminalResult};
use crate::output::Glyph;

/// Which way a swap converts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwapDirection {
    /// Native coin in, token out
    Deposit,
    /// Token in, native coin out
    Withdraw,
}

impl SwapDirection {
    pub fn toggled(&self) -> Self {
        match self {
            SwapDirection::Deposit => SwapDirection::Withdraw,
            SwapDirection::Withdraw => SwapDirection::Deposit,
        }
    }

    /// Asset the user pays
    pub fn input_glyph(&self) -> Glyph {
        match self {
            SwapDirection::Deposit => Glyph::NativeCoin,
            SwapDirection::Withdraw => Glyph::Token,
        }
    }

    /// Asset the user receives
    pub fn output_glyph(&self) -> Glyph {
        self.toggled().input_glyph()
    }

    /// Past-tense verb used in confirmation messages
    pub fn past_tense(&self) -> &'static str {
        match self {
            SwapDirection::Deposit => "deposited",
            SwapDirection::Withdraw => "withdrawn",
        }
    }
}

impl Default for SwapDirection {
    fn default() -> Self {
        SwapDirection::Deposit
    }
}

impl fmt::Display for SwapDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwapDirection::Deposit => write!(f, "deposit"),
            SwapDirection::Withdraw => write!(f, "withdraw"),
        }
    }
}

// ============================================================================
// Slippage
// ============================================================================

/// Maximum percentage drop from the quote a swap accepts before reverting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlippageTolerance(Decimal);

impl SlippageTolerance {
    pub const MIN: Decimal = Decimal::from_parts(1, 0, 0, false, 1);
    pub const MAX: Decimal = Decimal::from_parts(25, 0, 0, false, 0);
    pub const STEP: Decimal = Decimal::from_parts(1, 0, 0, false, 1);
    pub const DEFAULT: Decimal = Decimal::from_parts(30, 0, 0, false, 1);

    /// Build from a percentage in range, then snap to the 0.1 grid
    pub fn new(percent: Decimal) -> TerminalResult<Self> {
        if percent < Self::MIN || percent > Self::MAX {
            return Err(TerminalError::user_input(format!(
                "Slippage must be between {} and {} percent",
                Self::MIN,
                Self::MAX
            )));
        }
        let snapped = percent.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
        Ok(Self(snapped.clamp(Self::MIN, Self::MAX)))
    }

    pub fn percent(&self) -> Decimal {
        self.0
    }

    /// One step up, saturating at the maximum
    pub fn increased(&self) -> Self {
        Self((self.0 + Self::STEP).min(Self::MAX))
    }

    /// One step down, saturating at the minimum
    pub fn decreased(&self) -> Self {
        Self((self.0 - Self::STEP).max(Self::MIN))
    }

    /// `quote * (100 - slippage) / 100`, truncated to `decimals` places
    ///
    /// `decimals` is the counter asset's on-chain precision, so the result is
    /// always a whole number of its smallest unit.
    pub fn min_acceptable_output(&self, quote: Decimal, decimals: u32) -> Decimal {
        let hundred = Decimal::ONE_HUNDRED;
        (quote * (hundred - self.0) / hundred)
            .round_dp_with_strategy(decimals, RoundingStrategy::ToZero)
    }
}

impl Default for SlippageTolerance {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl fmt::Display for SlippageTolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}%", self.0)
    }
}

// ============================================================================
// Quote
// ============================================================================

/// Advisory amount of the counter asset for a prospective swap
///
/// Never persisted; refetched whenever the amount or direction changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub direction: SwapDirection,
    /// Amount the user pays
    pub amount_in: Decimal,
    /// Counter-asset amount the contract quoted
    pub amount_out: Decimal,
    pub fetched_at: DateTime<Utc>,
}

impl Quote {
    pub fn new(direction: SwapDirection, amount_in: Decimal, amount_out: Decimal) -> Self {
        Self {
            direction,
            amount_in,
            amount_out,
            fetched_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_direction_toggle() {
        assert_eq!(SwapDirection::Deposit.toggled(), SwapDirection::Withdraw);
        assert_eq!(SwapDirection::Withdraw.toggled().toggled(), SwapDirection::Withdraw);
        assert_eq!(SwapDirection::Deposit.output_glyph(), Glyph::Token);
    }

    #[test]
    fn test_slippage_bounds() {
        assert_eq!(SlippageTolerance::default().percent(), dec!(3.0));
        assert!(SlippageTolerance::new(dec!(0.05)).is_err());
        assert!(SlippageTolerance::new(dec!(25.1)).is_err());
        assert!(SlippageTolerance::new(dec!(25.04)).is_err());
        assert!(SlippageTolerance::new(dec!(0.09)).is_err());
        assert_eq!(SlippageTolerance::new(dec!(0.1)).unwrap().percent(), dec!(0.1));
        assert_eq!(SlippageTolerance::new(dec!(2.46)).unwrap().percent(), dec!(2.5));
    }

    #[test]
    fn test_slippage_steps_saturate() {
        let max = SlippageTolerance::new(dec!(25)).unwrap();
        assert_eq!(max.increased(), max);

        let min = SlippageTolerance::new(dec!(0.1)).unwrap();
        assert_eq!(min.decreased(), min);

        assert_eq!(SlippageTolerance::default().increased().percent(), dec!(3.1));
        assert_eq!(SlippageTolerance::default().decreased().percent(), dec!(2.9));
    }

    #[test]
    fn test_min_acceptable_output() {
        let slippage = SlippageTolerance::default();
        assert_eq!(slippage.min_acceptable_output(dec!(100), 18), dec!(97.0));
        assert_eq!(slippage.min_acceptable_output(dec!(0), 18), dec!(0));
    }

    #[test]
    fn test_min_acceptable_output_truncates_to_smallest_unit() {
        let slippage = SlippageTolerance::new(dec!(1)).unwrap();
        // 0.000003 * 0.99 = 0.00000297 -> 0.000002 at 6 decimals
        assert_eq!(slippage.min_acceptable_output(dec!(0.000003), 6), dec!(0.000002));
    }
}
