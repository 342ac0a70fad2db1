//! Chart assembly
//!
//! One chart request resolves the proposal, picks its YES/NO conditional
//! pools, then fetches the currency rate, both candle series and the spot
//! series concurrently. Sub-fetch failures degrade their field instead of
//! failing the request. A transient failure makes the whole response
//! degraded, which is served but never cached.

use chrono::Utc;
use futarchy_core::address::normalize_address;
use futarchy_core::{
    Candle, ChartResult, OutcomeSide, Pool, ProposalIdentity, SpotSeries, HOURLY_BUCKET_SECS,
};
use futarchy_spot::{Network, RateSource, NEUTRAL_RATE};
use futarchy_subgraph::{Backend, MarketDataAdapter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::caches::ChartCaches;
use crate::candle_fill::fill_candle_gaps;
use crate::spot_service::SpotService;
use crate::warmer::WarmList;

/// Default lookback when neither the request nor the proposal sets a start
pub const DEFAULT_LOOKBACK_SECS: i64 = 7 * 24 * 3600;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartParams {
    /// External identifier or trading address
    pub proposal: String,
    pub min_time: Option<i64>,
    pub max_time: Option<i64>,
    pub include_spot: bool,
}

impl ChartParams {
    pub fn new(proposal: impl Into<String>) -> Self {
        Self {
            proposal: proposal.into(),
            min_time: None,
            max_time: None,
            include_spot: false,
        }
    }

    pub fn with_window(mut self, min_time: Option<i64>, max_time: Option<i64>) -> Self {
        self.min_time = min_time;
        self.max_time = max_time;
        self
    }

    pub fn with_spot(mut self, include_spot: bool) -> Self {
        self.include_spot = include_spot;
        self
    }

    /// `proposal|min|max|spot`
    pub fn cache_key(&self) -> String {
        let bound = |t: Option<i64>| t.map(|t| t.to_string()).unwrap_or_default();
        format!(
            "{}|{}|{}|{}",
            normalize_address(&self.proposal),
            bound(self.min_time),
            bound(self.max_time),
            self.include_spot
        )
    }
}

/// Where a chart computation may take its spot series from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpotMode {
    /// Spot cache, then the OHLCV provider
    Live,
    /// Spot cache only
    CacheOnly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomePair<T> {
    pub yes: T,
    pub no: T,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartResponse {
    pub proposal: ProposalIdentity,
    pub pools: OutcomePair<Option<Pool>>,
    /// Gap-filled hourly candles
    pub candles: OutcomePair<Vec<Candle>>,
    pub spot: Option<SpotSeries>,
    pub currency_rate: f64,
    pub min_time: i64,
    pub max_time: i64,
    /// Some sub-fetch failed and its field carries a fallback
    pub degraded: bool,
}

pub struct ChartService {
    adapter: Arc<dyn MarketDataAdapter>,
    rates: Arc<dyn RateSource>,
    spot: Arc<SpotService>,
    caches: Arc<ChartCaches>,
    warm_list: Arc<WarmList>,
}

impl ChartService {
    pub fn new(
        adapter: Arc<dyn MarketDataAdapter>,
        rates: Arc<dyn RateSource>,
        spot: Arc<SpotService>,
        caches: Arc<ChartCaches>,
        warm_list: Arc<WarmList>,
    ) -> Self {
        Self {
            adapter,
            rates,
            spot,
            caches,
            warm_list,
        }
    }

    pub fn caches(&self) -> &ChartCaches {
        &self.caches
    }

    /// Schema backend the adapter speaks
    pub fn backend(&self) -> Backend {
        self.adapter.backend()
    }

    pub fn warm_list(&self) -> &WarmList {
        &self.warm_list
    }

    pub fn cached_response(&self, key: &str) -> Option<ChartResponse> {
        self.caches.responses.get(&key.to_string())
    }

    /// Resolve through the registry cache.
    pub async fn resolve(&self, identifier: &str) -> ChartResult<ProposalIdentity> {
        let key = normalize_address(identifier);
        if let Some(identity) = self.caches.registry.get(&key) {
            return Ok(identity);
        }

        let identity = self.adapter.resolve_proposal(&key).await?;
        self.caches.registry.set(key, identity.clone());
        Ok(identity)
    }

    /// Serve a chart, computing it on a response cache miss. Successful
    /// computations are registered for warming.
    #[instrument(skip(self), fields(key = %params.cache_key()))]
    pub async fn chart(&self, params: ChartParams) -> ChartResponse {
        let key = params.cache_key();
        if let Some(response) = self.cached_response(&key) {
            self.warm_list.touch(&key);
            return response;
        }

        let response = self.compute(&params, SpotMode::Live).await;
        if !response.degraded {
            self.warm_list.register(key, params);
        }
        response
    }

    /// Compute a chart without consulting the response cache. A failed field
    /// falls back to its neutral value. Transient failures mark the response
    /// degraded, and degraded responses are never stored.
    pub async fn compute(&self, params: &ChartParams, spot_mode: SpotMode) -> ChartResponse {
        let mut degraded = false;

        let identity = match self.resolve(&params.proposal).await {
            Ok(identity) => identity,
            Err(e) => {
                warn!("Resolving {} failed, using it as the trading address: {}", params.proposal, e);
                degraded |= e.is_transient();
                ProposalIdentity::pass_through(&normalize_address(&params.proposal))
            }
        };

        let pools = match self
            .adapter
            .list_pools(&identity.trading_address, identity.chain_id)
            .await
        {
            Ok(pools) => pools,
            Err(e) => {
                warn!("Listing pools for {} failed: {}", identity.trading_address, e);
                degraded |= e.is_transient();
                Vec::new()
            }
        };
        let yes_pool = conditional_pool(&pools, OutcomeSide::Yes);
        let no_pool = conditional_pool(&pools, OutcomeSide::No);

        let now = Utc::now().timestamp();
        let max_time = params.max_time.or(identity.close_timestamp).unwrap_or(now);
        let min_time = params
            .min_time
            .or(identity.start_timestamp)
            .unwrap_or(now - DEFAULT_LOOKBACK_SECS);

        // Candle fetches use hour-aligned bounds so defaulted windows keep
        // hitting the candle cache while `now` moves within the bucket.
        let fetch_min = floor_to_bucket(min_time);
        let fetch_max = floor_to_bucket(max_time);

        let (rate, yes_candles, no_candles, spot) = tokio::join!(
            self.currency_rate(&identity),
            self.pool_candles(yes_pool.as_ref(), fetch_min, fetch_max, identity.chain_id),
            self.pool_candles(no_pool.as_ref(), fetch_min, fetch_max, identity.chain_id),
            self.spot_series(&identity, params.include_spot, spot_mode),
        );

        let currency_rate = rate.unwrap_or_else(|e| {
            warn!("Currency rate for {} unavailable: {}", identity.proposal_id, e);
            degraded |= e.is_transient();
            NEUTRAL_RATE
        });
        let mut candles = |side: &str, result: ChartResult<Vec<Candle>>| {
            result.unwrap_or_else(|e| {
                warn!("{} candles for {} unavailable: {}", side, identity.proposal_id, e);
                degraded |= e.is_transient();
                Vec::new()
            })
        };
        let yes_candles = candles("YES", yes_candles);
        let no_candles = candles("NO", no_candles);
        let spot = spot.unwrap_or_else(|e| {
            warn!("Spot for {} unavailable: {}", identity.proposal_id, e);
            degraded |= e.is_transient();
            None
        });

        let ceiling = max_time.min(now);
        let response = ChartResponse {
            pools: OutcomePair {
                yes: yes_pool,
                no: no_pool,
            },
            candles: OutcomePair {
                yes: fill_candle_gaps(&yes_candles, HOURLY_BUCKET_SECS, ceiling),
                no: fill_candle_gaps(&no_candles, HOURLY_BUCKET_SECS, ceiling),
            },
            spot,
            currency_rate,
            min_time,
            max_time,
            degraded,
            proposal: identity,
        };

        if response.degraded {
            info!("Serving degraded chart for {} uncached", params.proposal);
        } else {
            self.caches.responses.set(params.cache_key(), response.clone());
        }
        response
    }

    async fn currency_rate(&self, identity: &ProposalIdentity) -> ChartResult<f64> {
        let Some(provider) = identity.rate_provider_address.as_deref() else {
            return Ok(NEUTRAL_RATE);
        };
        let Some(rpc_url) = Network::for_chain_id(identity.chain_id).and_then(|n| n.rpc_url) else {
            debug!("No RPC for chain {}, currency rate is neutral", identity.chain_id);
            return Ok(NEUTRAL_RATE);
        };
        self.rates.read_rate(&rpc_url, provider).await
    }

    async fn pool_candles(
        &self,
        pool: Option<&Pool>,
        min_time: i64,
        max_time: i64,
        chain_id: u64,
    ) -> ChartResult<Vec<Candle>> {
        let Some(pool) = pool else {
            return Ok(Vec::new());
        };

        let key = ChartCaches::candle_key(chain_id, &pool.id, min_time, max_time);
        if let Some(candles) = self.caches.candles.get(&key) {
            return Ok(candles);
        }

        let candles = self
            .adapter
            .fetch_candle_series(&pool.id, min_time, max_time, chain_id)
            .await?;
        self.caches.candles.set(key, candles.clone());
        Ok(candles)
    }

    async fn spot_series(
        &self,
        identity: &ProposalIdentity,
        include_spot: bool,
        mode: SpotMode,
    ) -> ChartResult<Option<SpotSeries>> {
        let Some(ticker) = identity.ticker_spec.as_deref().filter(|_| include_spot) else {
            return Ok(None);
        };

        match mode {
            SpotMode::Live => self.spot.spot(ticker).await.map(Some),
            SpotMode::CacheOnly => Ok(self.spot.cached(ticker)),
        }
    }
}

fn floor_to_bucket(ts: i64) -> i64 {
    ts.div_euclid(HOURLY_BUCKET_SECS) * HOURLY_BUCKET_SECS
}

fn conditional_pool(pools: &[Pool], side: OutcomeSide) -> Option<Pool> {
    pools
        .iter()
        .find(|p| p.is_conditional() && p.outcome_side == Some(side))
        .cloned()
}
