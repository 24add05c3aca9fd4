//! OHLC Aggregation
//!
//! Buckets a price series into fixed-width candles for charting.

use rose_core::{Candle, CandleInterval, PricePoint};
use tracing::debug;

/// Start of the bucket containing `timestamp_secs`
///
/// Floors towards negative infinity so timestamps before the epoch land in
/// the bucket below them rather than the one above.
pub fn bucket_start(timestamp_secs: i64, width_secs: i64) -> i64 {
    timestamp_secs.div_euclid(width_secs) * width_secs
}

/// Aggregate ascending points into candles of `interval`
pub fn aggregate(points: &[PricePoint], interval: CandleInterval) -> Vec<Candle> {
    aggregate_width(points, interval.to_seconds())
}

/// Aggregate ascending points into candles `width_secs` wide
///
/// Single pass: one candle is kept open at a time and emitted when a point
/// falls in a different bucket.
pub fn aggregate_width(points: &[PricePoint], width_secs: i64) -> Vec<Candle> {
    if width_secs <= 0 {
        return Vec::new();
    }

    let mut candles = Vec::new();
    let mut current: Option<Candle> = None;

    for point in points {
        let start = bucket_start(point.timestamp_secs, width_secs);
        match current.as_mut() {
            Some(candle) if candle.bucket_start == start => {
                candle.high = candle.high.max(point.value);
                candle.low = candle.low.min(point.value);
                candle.close = point.value;
            }
            _ => {
                if let Some(done) = current.take() {
                    candles.push(done);
                }
                current = Some(Candle::flat(start, point.value));
            }
        }
    }

    if let Some(done) = current {
        candles.push(done);
    }

    candles
}

/// Fill empty buckets between candles with flat candles at the previous close
pub fn fill_gaps(candles: &[Candle], interval: CandleInterval) -> Vec<Candle> {
    if candles.len() < 2 {
        return candles.to_vec();
    }

    let width = interval.to_seconds();
    let mut filled: Vec<Candle> = Vec::with_capacity(candles.len());

    for candle in candles {
        if let Some(last) = filled.last().copied() {
            let mut gap_start = last.bucket_start + width;
            while gap_start < candle.bucket_start {
                filled.push(Candle::flat(gap_start, last.close));
                gap_start += width;
            }
        }
        filled.push(*candle);
    }

    filled
}

// ============================================================================
// Candle Series
// ============================================================================

/// A sorted price series and its candles at the selected interval
///
/// Candles are recomputed in full whenever the interval or the points change.
#[derive(Debug, Clone, Default)]
pub struct CandleSeries {
    points: Vec<PricePoint>,
    interval: CandleInterval,
    candles: Vec<Candle>,
}

impl CandleSeries {
    pub fn new(mut points: Vec<PricePoint>, interval: CandleInterval) -> Self {
        points.sort_by_key(|p| p.timestamp_secs);
        let candles = aggregate(&points, interval);
        Self {
            points,
            interval,
            candles,
        }
    }

    pub fn interval(&self) -> CandleInterval {
        self.interval
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    /// Candles with empty buckets filled in
    pub fn gap_filled(&self) -> Vec<Candle> {
        fill_gaps(&self.candles, self.interval)
    }

    /// Switch interval and rebuild every candle
    pub fn set_interval(&mut self, interval: CandleInterval) {
        if interval == self.interval && !self.candles.is_empty() {
            return;
        }
        self.interval = interval;
        self.rebuild();
    }

    /// Merge new points and rebuild
    pub fn extend(&mut self, points: impl IntoIterator<Item = PricePoint>) {
        self.points.extend(points);
        self.points.sort_by_key(|p| p.timestamp_secs);
        self.rebuild();
    }

    fn rebuild(&mut self) {
        self.candles = aggregate(&self.points, self.interval);
        debug!(
            "Rebuilt {} candles from {} points at {}",
            self.candles.len(),
            self.points.len(),
            self.interval.label()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn point(t: i64, v: rust_decimal::Decimal) -> PricePoint {
        PricePoint::new(t, v)
    }

    #[test]
    fn test_bucket_start() {
        assert_eq!(bucket_start(0, 300), 0);
        assert_eq!(bucket_start(299, 300), 0);
        assert_eq!(bucket_start(300, 300), 300);
        assert_eq!(bucket_start(-1, 300), -300);
    }

    #[test]
    fn test_aggregate_two_buckets() {
        let points = vec![
            point(0, dec!(10)),
            point(10, dec!(12)),
            point(299, dec!(8)),
            point(300, dec!(20)),
        ];

        let candles = aggregate_width(&points, 300);

        assert_eq!(
            candles,
            vec![
                Candle {
                    bucket_start: 0,
                    open: dec!(10),
                    high: dec!(12),
                    low: dec!(8),
                    close: dec!(8),
                },
                Candle::flat(300, dec!(20)),
            ]
        );
    }

    #[test]
    fn test_aggregate_empty_and_single() {
        assert!(aggregate(&[], CandleInterval::OneHour).is_empty());

        let candles = aggregate(&[point(3_700, dec!(1.5))], CandleInterval::OneHour);
        assert_eq!(candles, vec![Candle::flat(3_600, dec!(1.5))]);
    }

    #[test]
    fn test_aggregate_is_idempotent_per_bucket() {
        let points = vec![
            point(100, dec!(1)),
            point(200, dec!(3)),
            point(4_000, dec!(2)),
        ];

        let first = aggregate(&points, CandleInterval::OneHour);
        let second = aggregate(&points, CandleInterval::OneHour);
        assert_eq!(first, second);

        for candle in &first {
            assert_eq!(candle.bucket_start % 3_600, 0);
            assert!(candle.low <= candle.open && candle.open <= candle.high);
            assert!(candle.low <= candle.close && candle.close <= candle.high);
        }
    }

    #[test]
    fn test_aggregate_negative_timestamps() {
        let candles = aggregate_width(&[point(-10, dec!(1)), point(5, dec!(2))], 300);
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].bucket_start, -300);
        assert_eq!(candles[1].bucket_start, 0);
    }

    #[test]
    fn test_fill_gaps() {
        let candles = vec![
            Candle::flat(0, dec!(1)),
            Candle {
                bucket_start: 540,
                open: dec!(2),
                high: dec!(3),
                low: dec!(2),
                close: dec!(3),
            },
        ];

        let filled = fill_gaps(&candles, CandleInterval::ThreeMinutes);

        assert_eq!(filled.len(), 4);
        assert_eq!(filled[1], Candle::flat(180, dec!(1)));
        assert_eq!(filled[2], Candle::flat(360, dec!(1)));
        assert_eq!(filled[3].bucket_start, 540);
    }

    #[test]
    fn test_series_set_interval_rebuilds() {
        let mut series = CandleSeries::new(
            vec![
                point(4_000, dec!(2)),
                point(100, dec!(1)),
                point(200, dec!(3)),
            ],
            CandleInterval::ThreeMinutes,
        );
        assert_eq!(series.points()[0].timestamp_secs, 100);
        assert_eq!(series.candles().len(), 3);

        series.set_interval(CandleInterval::OneDay);
        assert_eq!(series.candles().len(), 1);
        assert_eq!(series.candles()[0].open, dec!(1));
        assert_eq!(series.candles()[0].close, dec!(2));
        assert_eq!(series.candles()[0].high, dec!(3));
    }

    #[test]
    fn test_series_extend_resorts() {
        let mut series = CandleSeries::new(vec![point(500, dec!(5))], CandleInterval::OneHour);
        series.extend(vec![point(10, dec!(1))]);

        assert_eq!(series.candles().len(), 1);
        assert_eq!(series.candles()[0].open, dec!(1));
        assert_eq!(series.candles()[0].close, dec!(5));
    }
}
