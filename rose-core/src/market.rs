//! Price series structures used for charting

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One sample from the price feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Unix timestamp in seconds
    pub timestamp_secs: i64,
    pub value: Decimal,
}

impl PricePoint {
    pub fn new(timestamp_secs: i64, value: Decimal) -> Self {
        Self {
            timestamp_secs,
            value,
        }
    }
}

/// OHLC summary of the points inside one bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candle {
    /// Start of the bucket in Unix seconds, a multiple of the interval width
    pub bucket_start: i64,
    /// First value in the bucket
    pub open: Decimal,
    /// Highest value in the bucket
    pub high: Decimal,
    /// Lowest value in the bucket
    pub low: Decimal,
    /// Last value in the bucket
    pub close: Decimal,
}

impl Candle {
    /// Candle seeded from a single value
    pub fn flat(bucket_start: i64, value: Decimal) -> Self {
        Self {
            bucket_start,
            open: value,
            high: value,
            low: value,
            close: value,
        }
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.bucket_start, 0)
    }
}

/// Candle width menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CandleInterval {
    /// 3 minute candles
    #[serde(rename = "3m")]
    ThreeMinutes,
    /// 15 minute candles
    #[serde(rename = "15m")]
    FifteenMinutes,
    /// 1 hour candles
    #[serde(rename = "1h")]
    OneHour,
    /// 4 hour candles
    #[serde(rename = "4h")]
    FourHours,
    /// 1 day candles
    #[serde(rename = "1d")]
    OneDay,
    /// 1 week candles
    #[serde(rename = "1w")]
    OneWeek,
    /// 30 day candles
    #[serde(rename = "30d")]
    ThirtyDays,
}

impl CandleInterval {
    pub const ALL: [CandleInterval; 7] = [
        CandleInterval::ThreeMinutes,
        CandleInterval::FifteenMinutes,
        CandleInterval::OneHour,
        CandleInterval::FourHours,
        CandleInterval::OneDay,
        CandleInterval::OneWeek,
        CandleInterval::ThirtyDays,
    ];

    /// Get the interval duration in seconds
    pub fn to_seconds(&self) -> i64 {
        match self {
            CandleInterval::ThreeMinutes => 180,
            CandleInterval::FifteenMinutes => 900,
            CandleInterval::OneHour => 3_600,
            CandleInterval::FourHours => 14_400,
            CandleInterval::OneDay => 86_400,
            CandleInterval::OneWeek => 604_800,
            CandleInterval::ThirtyDays => 2_592_000,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CandleInterval::ThreeMinutes => "3m",
            CandleInterval::FifteenMinutes => "15m",
            CandleInterval::OneHour => "1h",
            CandleInterval::FourHours => "4h",
            CandleInterval::OneDay => "1d",
            CandleInterval::OneWeek => "1w",
            CandleInterval::ThirtyDays => "30d",
        }
    }

    /// Parse from string representation
    pub fn from_label(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|interval| interval.label() == s)
    }

    pub fn from_seconds(secs: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|interval| interval.to_seconds() == secs)
    }
}

impl Default for CandleInterval {
    fn default() -> Self {
        CandleInterval::OneHour
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_menu_bounds() {
        assert_eq!(CandleInterval::ALL[0].to_seconds(), 180);
        assert_eq!(CandleInterval::ALL[6].to_seconds(), 2_592_000);
    }

    #[test]
    fn test_interval_labels_round_trip() {
        for interval in CandleInterval::ALL {
            assert_eq!(CandleInterval::from_label(interval.label()), Some(interval));
        }
        assert_eq!(CandleInterval::from_label("2h"), None);
        assert_eq!(CandleInterval::from_seconds(900), Some(CandleInterval::FifteenMinutes));
    }
}
