//! The four cache layers

use futarchy_core::{Candle, ProposalIdentity, SpotSeries};

use crate::chart_service::ChartResponse;
use crate::config::CacheTtls;
use crate::ttl_cache::TtlCache;

/// Independent key spaces, one TTL each
pub struct ChartCaches {
    /// Normalized identifier -> resolved identity
    pub registry: TtlCache<String, ProposalIdentity>,
    /// `chain|pool|min|max` over hour-aligned bounds -> raw (unfilled) candles
    pub candles: TtlCache<String, Vec<Candle>>,
    /// Ticker -> evaluated series
    pub spot: TtlCache<String, SpotSeries>,
    /// `proposal|min|max|spot` -> assembled response
    pub responses: TtlCache<String, ChartResponse>,
}

impl ChartCaches {
    pub fn new(ttls: &CacheTtls) -> Self {
        Self {
            registry: TtlCache::new("registry", ttls.registry),
            candles: TtlCache::new("candles", ttls.candles),
            spot: TtlCache::new("spot", ttls.spot),
            responses: TtlCache::new("responses", ttls.response),
        }
    }

    pub fn candle_key(chain_id: u64, pool_id: &str, min_time: i64, max_time: i64) -> String {
        format!("{}|{}|{}|{}", chain_id, pool_id, min_time, max_time)
    }

    /// Sweep expired entries from every layer. Reads only evict the key they
    /// touch, so one-off windows would otherwise stay resident.
    pub fn purge_expired(&self) -> usize {
        self.registry.purge_expired()
            + self.candles.purge_expired()
            + self.spot.purge_expired()
            + self.responses.purge_expired()
    }
}

impl Default for ChartCaches {
    fn default() -> Self {
        Self::new(&CacheTtls::default())
    }
}
