//! Time series values

use serde::{Deserialize, Serialize};

/// Width of the hourly buckets both indexers aggregate into
pub const HOURLY_BUCKET_SECS: i64 = 3600;

/// Closing value of one fixed-width time bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candle {
    /// Bucket start, unix seconds, aligned to the bucket width
    pub period_start: i64,
    /// Canonical decimal string
    pub close: String,
}

impl Candle {
    pub fn new(period_start: i64, close: impl Into<String>) -> Self {
        Self {
            period_start,
            close: close.into(),
        }
    }
}

/// One point of a composite spot series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Unix seconds
    pub time: i64,
    pub value: f64,
}

impl PricePoint {
    pub fn new(time: i64, value: f64) -> Self {
        Self { time, value }
    }
}

/// Result of evaluating a ticker expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotSeries {
    /// The expression this series was computed from
    pub ticker: String,
    /// Upstream pool addresses, one per hop
    pub pools: Vec<String>,
    /// Ascending by time
    pub series: Vec<PricePoint>,
    pub latest_price: Option<f64>,
    /// Divisor applied from an on-chain rate provider (1 when none)
    pub rate: f64,
}

impl SpotSeries {
    pub fn new(ticker: impl Into<String>, pools: Vec<String>, series: Vec<PricePoint>, rate: f64) -> Self {
        let latest_price = series.last().map(|p| p.value);
        Self {
            ticker: ticker.into(),
            pools,
            series,
            latest_price,
            rate,
        }
    }
}
