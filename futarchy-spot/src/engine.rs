//! Ticker evaluation

use futarchy_core::{ChartError, ChartResult, PricePoint, SpotSeries};
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::composite::{divide_series, forward_fill_join, invert_series, normalize_series};
use crate::ohlcv::{select_pool, OhlcvRequest, OhlcvSource, TokenSide};
use crate::rate::{rate_or_neutral, RateSource, NEUTRAL_RATE};
use crate::ticker::{HopSource, HopSpec, Network, TickerSpec};

/// Evaluates ticker expressions into composite price series
#[derive(Clone)]
pub struct SpotEngine {
    ohlcv: Arc<dyn OhlcvSource>,
    rates: Arc<dyn RateSource>,
}

impl SpotEngine {
    pub fn new(ohlcv: Arc<dyn OhlcvSource>, rates: Arc<dyn RateSource>) -> Self {
        Self { ohlcv, rates }
    }

    /// Parse and evaluate `ticker`. Any hop failing fails the whole series.
    #[instrument(skip(self))]
    pub async fn evaluate(&self, ticker: &str) -> ChartResult<SpotSeries> {
        let spec = TickerSpec::parse(ticker)?;
        let network = Network::resolve(&spec.network);

        // A rate provider on a multi-hop ticker is parsed but not applied.
        let rate_provider = match spec.hops.as_slice() {
            [hop] => hop.rate_provider.as_deref(),
            _ => None,
        };

        let hops = try_join_all(
            spec.hops
                .iter()
                .map(|hop| self.fetch_hop(hop, &spec, &network)),
        );
        let rate = async {
            match rate_provider {
                Some(provider) => rate_or_neutral(self.rates.as_ref(), &network, provider).await,
                None => NEUTRAL_RATE,
            }
        };
        let (hops, rate) = futures::join!(hops, rate);
        let (pools, series): (Vec<String>, Vec<Vec<PricePoint>>) = hops?.into_iter().unzip();

        let mut combined = forward_fill_join(&series);
        if spec.invert {
            invert_series(&mut combined);
        }
        if rate != NEUTRAL_RATE {
            divide_series(&mut combined, rate);
        }

        info!(
            "Evaluated {} over {} hop(s): {} points, rate {}",
            spec,
            pools.len(),
            combined.len(),
            rate
        );

        Ok(SpotSeries::new(spec.raw.clone(), pools, combined, rate))
    }

    async fn fetch_hop(
        &self,
        hop: &HopSpec,
        spec: &TickerSpec,
        network: &Network,
    ) -> ChartResult<(String, Vec<PricePoint>)> {
        let (pool_address, token) = match &hop.source {
            HopSource::Pool { address } => (address.clone(), TokenSide::Base),
            HopSource::Pair { base, quote } => {
                let query = format!("{} {}", base, quote);
                let hits = self.ohlcv.search_pools(&query, &network.provider_id).await?;
                let found = select_pool(&hits, base, quote).ok_or_else(|| {
                    ChartError::not_found(format!(
                        "No pool for {}/{} on {}",
                        base, quote, network.provider_id
                    ))
                })?;
                debug!("{}/{} resolved to {} ({:?})", base, quote, found.address, found.token);
                (found.address, found.token)
            }
        };

        let request = OhlcvRequest {
            network: network.provider_id.clone(),
            pool_address,
            timeframe: spec.timeframe,
            limit: spec.limit,
            token,
        };
        let mut series = normalize_series(self.ohlcv.fetch_closes(&request).await?);
        if hop.invert {
            invert_series(&mut series);
        }

        Ok((request.pool_address, series))
    }
}
