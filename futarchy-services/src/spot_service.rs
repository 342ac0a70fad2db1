//! Cached spot series

use futarchy_core::{ChartResult, SpotSeries};
use futarchy_spot::SpotEngine;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::caches::ChartCaches;

/// Spot evaluation through the spot cache. Only successful evaluations are
/// stored, so a rate-limited provider is retried on the next request.
pub struct SpotService {
    engine: SpotEngine,
    caches: Arc<ChartCaches>,
}

impl SpotService {
    pub fn new(engine: SpotEngine, caches: Arc<ChartCaches>) -> Self {
        Self { engine, caches }
    }

    pub async fn spot(&self, ticker: &str) -> ChartResult<SpotSeries> {
        let key = ticker.trim().to_string();
        if let Some(series) = self.caches.spot.get(&key) {
            return Ok(series);
        }

        match self.engine.evaluate(&key).await {
            Ok(series) => {
                debug!("Caching spot series for {} ({} points)", key, series.series.len());
                self.caches.spot.set(key, series.clone());
                Ok(series)
            }
            Err(e) if e.is_transient() => {
                warn!("Spot evaluation for {} failed, retrying on next request: {}", key, e);
                Err(e)
            }
            Err(e) => {
                debug!("Spot evaluation rejected {}: {}", key, e);
                Err(e)
            }
        }
    }

    /// Cached series only; never reaches the OHLCV provider.
    pub fn cached(&self, ticker: &str) -> Option<SpotSeries> {
        self.caches.spot.get(&ticker.trim().to_string())
    }
}
