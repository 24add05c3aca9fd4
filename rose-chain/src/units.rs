//! Conversion between human decimals and on-chain base units

use alloy::primitives::U256;
use rust_decimal::prelude::*;

use crate::types::{ChainError, Result};

fn pow10(decimals: u8) -> U256 {
    U256::from(10u64).pow(U256::from(decimals))
}

/// Convert a decimal amount into base units, truncating extra precision
pub fn to_base_units(amount: Decimal, decimals: u8) -> Result<U256> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(ChainError::Units(format!("negative amount: {}", amount)));
    }

    let truncated = amount.round_dp_with_strategy(decimals as u32, RoundingStrategy::ToZero);
    let scale = truncated.scale();
    let mantissa = truncated.mantissa().unsigned_abs();

    // round_dp never increases the scale, so scale <= decimals here
    let shift = (decimals as u32).saturating_sub(scale);
    Ok(U256::from(mantissa) * pow10(shift as u8))
}

/// Convert base units into a decimal amount
pub fn from_base_units(raw: U256, decimals: u8) -> Result<Decimal> {
    let divisor = pow10(decimals);
    let whole = raw / divisor;
    let fraction = raw % divisor;

    let text = if decimals == 0 {
        whole.to_string()
    } else {
        format!(
            "{}.{:0>width$}",
            whole,
            fraction.to_string(),
            width = decimals as usize
        )
    };

    Decimal::from_str(&text)
        .map(|d| d.normalize())
        .map_err(|e| ChainError::Units(format!("{} does not fit a decimal: {}", text, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_to_base_units() {
        assert_eq!(to_base_units(dec!(1), 18).unwrap(), U256::from(10u64).pow(U256::from(18)));
        assert_eq!(to_base_units(dec!(1.5), 6).unwrap(), U256::from(1_500_000u64));
        assert_eq!(to_base_units(dec!(0), 18).unwrap(), U256::ZERO);
        // Extra precision is truncated
        assert_eq!(to_base_units(dec!(0.0000019), 6).unwrap(), U256::from(1u64));
        assert_err!(to_base_units(dec!(-1), 18));
    }

    #[test]
    fn test_oversized_value_does_not_fit() {
        assert_err!(from_base_units(U256::MAX, 0));
        assert_ok!(from_base_units(U256::from(u64::MAX), 0));
    }

    #[test]
    fn test_from_base_units() {
        assert_eq!(from_base_units(U256::from(1_500_000u64), 6).unwrap(), dec!(1.5));
        assert_eq!(from_base_units(U256::ZERO, 18).unwrap(), dec!(0));
        assert_eq!(from_base_units(U256::from(42u64), 0).unwrap(), dec!(42));
        assert_eq!(
            from_base_units(U256::from(97u64) * pow10(18), 18).unwrap(),
            dec!(97)
        );
    }
}
