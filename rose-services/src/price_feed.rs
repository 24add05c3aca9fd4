//! Price feeds for the chart
//!
//! Two sources: an HTTP endpoint returning historical prices, and a sampler
//! recording the pool ratio from the wallet session's balance snapshots.

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Client;
use rose_chain::BalanceSnapshot;
use rose_core::PricePoint;
use rust_decimal::prelude::*;
use serde_json::Value;
use std::collections::VecDeque;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Pool ratios retained for the inline chart
pub const POOL_SAMPLE_CAPACITY: usize = 100;

const HTTP_TIMEOUT_SECS: u64 = 30;

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Errors that can occur while fetching a price feed
#[derive(Debug, thiserror::Error)]
pub enum PriceFeedError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Price feed returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Unexpected feed payload: {0}")]
    Payload(String),
}

/// Source of historical price points
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Points sorted by ascending timestamp, in seconds
    async fn fetch(&self) -> Result<Vec<PricePoint>, PriceFeedError>;
}

// ============================================================================
// HTTP Feed
// ============================================================================

/// Price feed served as JSON over HTTP
///
/// Accepts either `{"<ms>": price, ...}` or a market-chart style
/// `{"prices": [[ms, price], ...]}` body.
#[derive(Clone)]
pub struct HttpPriceFeed {
    client: Client,
    url: String,
}

impl HttpPriceFeed {
    pub fn new(url: impl Into<String>) -> Result<Self, PriceFeedError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl PriceFeed for HttpPriceFeed {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn fetch(&self) -> Result<Vec<PricePoint>, PriceFeedError> {
        let response = self.client.get(&self.url).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(PriceFeedError::Status { status, body });
        }

        let payload: Value = response.json().await?;
        let points = normalize_feed(&payload)?;
        debug!("Fetched {} price points", points.len());
        Ok(points)
    }
}

/// Convert a feed payload into points in seconds, sorted ascending
///
/// Entries with unparsable timestamps or prices are skipped with a warning.
pub fn normalize_feed(payload: &Value) -> Result<Vec<PricePoint>, PriceFeedError> {
    let mut points: Vec<PricePoint> = match payload {
        Value::Object(map) => match map.get("prices") {
            Some(Value::Array(rows)) => rows.iter().filter_map(point_from_row).collect(),
            Some(other) => {
                return Err(PriceFeedError::Payload(format!(
                    "expected an array of prices, got {}",
                    other
                )));
            }
            None => map
                .iter()
                .filter_map(|(key, value)| point_from_entry(key, value))
                .collect(),
        },
        other => {
            return Err(PriceFeedError::Payload(format!(
                "expected a JSON object, got {}",
                other
            )));
        }
    };

    points.sort_by_key(|p| p.timestamp_secs);
    Ok(points)
}

fn point_from_entry(key: &str, value: &Value) -> Option<PricePoint> {
    let Ok(millis) = key.trim().parse::<i64>() else {
        warn!("Skipping feed entry with bad timestamp: {}", key);
        return None;
    };
    let Some(price) = decimal_from_json(value) else {
        warn!("Skipping feed entry {} with bad price: {}", key, value);
        return None;
    };
    Some(PricePoint::new(millis.div_euclid(1000), price))
}

fn point_from_row(row: &Value) -> Option<PricePoint> {
    let (millis, price) = match row.as_array().map(Vec::as_slice) {
        Some([millis, price]) => (millis, price),
        _ => {
            warn!("Skipping malformed price row: {}", row);
            return None;
        }
    };

    let millis = millis
        .as_i64()
        .or_else(|| millis.as_f64().map(|m| m as i64));
    match (millis, decimal_from_json(price)) {
        (Some(millis), Some(price)) => Some(PricePoint::new(millis.div_euclid(1000), price)),
        _ => {
            warn!("Skipping malformed price row: {}", row);
            None
        }
    }
}

fn decimal_from_json(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

// ============================================================================
// Pool Sampler
// ============================================================================

/// Rolling window of pool price ratios (native reserve / token reserve)
#[derive(Debug)]
pub struct PoolPriceSampler {
    samples: Mutex<VecDeque<Decimal>>,
    capacity: usize,
}

impl Default for PoolPriceSampler {
    fn default() -> Self {
        Self::new(POOL_SAMPLE_CAPACITY)
    }
}

impl PoolPriceSampler {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity: capacity.max(1),
        }
    }

    /// Record the snapshot's pool price; empty pools are skipped
    pub fn record(&self, snapshot: &BalanceSnapshot) -> Option<Decimal> {
        let price = snapshot.pool_price()?;
        let mut samples = self.samples.lock();
        if samples.len() == self.capacity {
            samples.pop_front();
        }
        samples.push_back(price);
        Some(price)
    }

    /// Oldest first
    pub fn samples(&self) -> Vec<Decimal> {
        self.samples.lock().iter().copied().collect()
    }

    /// One block character per sample, scaled between the window's extremes
    ///
    /// `None` until two samples exist.
    pub fn sparkline(&self) -> Option<String> {
        let samples = self.samples();
        if samples.len() < 2 {
            return None;
        }
        let min = samples.iter().copied().min()?;
        let max = samples.iter().copied().max()?;
        let top = Decimal::from(SPARK_LEVELS.len() - 1);

        let line = samples
            .iter()
            .map(|&value| {
                let level = if max == min {
                    SPARK_LEVELS.len() / 2
                } else {
                    ((value - min) / (max - min) * top)
                        .round()
                        .to_usize()
                        .unwrap_or(0)
                };
                SPARK_LEVELS[level.min(SPARK_LEVELS.len() - 1)]
            })
            .collect();
        Some(line)
    }

    pub fn latest(&self) -> Option<Decimal> {
        self.samples.lock().back().copied()
    }

    pub fn len(&self) -> usize {
        self.samples.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_normalize_timestamp_map() {
        let payload = json!({
            "1700000060000": 2.5,
            "1700000000000": "2.25",
            "not-a-time": 1.0
        });

        let points = normalize_feed(&payload).unwrap();

        assert_eq!(
            points,
            vec![
                PricePoint::new(1_700_000_000, dec!(2.25)),
                PricePoint::new(1_700_000_060, dec!(2.5)),
            ]
        );
    }

    #[test]
    fn test_normalize_market_chart() {
        let payload = json!({
            "prices": [[1700000060000u64, 1.5], [1700000000000u64, 1.25], ["bad"]]
        });

        let points = normalize_feed(&payload).unwrap();

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].timestamp_secs, 1_700_000_000);
        assert_eq!(points[1].value, dec!(1.5));
    }

    #[test]
    fn test_normalize_rejects_non_object() {
        assert!(matches!(
            normalize_feed(&json!([1, 2])),
            Err(PriceFeedError::Payload(_))
        ));
    }

    #[test]
    fn test_sampler_keeps_last_samples() {
        let sampler = PoolPriceSampler::new(3);
        for token_reserve in 1..=5 {
            sampler.record(&BalanceSnapshot {
                native_reserve: dec!(10),
                token_reserve: Decimal::from(token_reserve),
                ..Default::default()
            });
        }

        assert_eq!(sampler.len(), 3);
        assert_eq!(sampler.samples()[0], dec!(10) / dec!(3));
        assert_eq!(sampler.latest(), Some(dec!(2)));
    }

    #[test]
    fn test_sparkline_scales_to_extremes() {
        let sampler = PoolPriceSampler::default();
        assert_eq!(sampler.sparkline(), None);

        for native_reserve in [1, 8, 4, 1] {
            sampler.record(&BalanceSnapshot {
                native_reserve: Decimal::from(native_reserve),
                token_reserve: dec!(1),
                ..Default::default()
            });
        }
        assert_eq!(sampler.sparkline().as_deref(), Some("▁█▄▁"));

        let flat = PoolPriceSampler::default();
        for _ in 0..3 {
            flat.record(&BalanceSnapshot {
                native_reserve: dec!(2),
                token_reserve: dec!(1),
                ..Default::default()
            });
        }
        assert_eq!(flat.sparkline().as_deref(), Some("▅▅▅"));
    }

    #[test]
    fn test_sampler_skips_empty_pool() {
        let sampler = PoolPriceSampler::default();
        assert_eq!(sampler.record(&BalanceSnapshot::default()), None);
        assert!(sampler.is_empty());
    }
}
