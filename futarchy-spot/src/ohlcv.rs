//! OHLCV provider client
//!
//! Pool search and per-pool close series from GeckoTerminal's public API.

use async_trait::async_trait;
use futarchy_core::{ChartError, ChartResult, PricePoint};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::ticker::Timeframe;

pub const DEFAULT_OHLCV_API_BASE: &str = "https://api.geckoterminal.com/api/v2";

const PROVIDER: &str = "geckoterminal";

/// Which token of the pool the closes are denominated against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenSide {
    Base,
    Quote,
}

impl TokenSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenSide::Base => "base",
            TokenSide::Quote => "quote",
        }
    }
}

/// One pool search result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolHit {
    pub address: String,
    /// Display name, e.g. `PNK / WETH 0.3%`
    pub name: String,
}

/// A search hit chosen for a BASE/QUOTE pair, with the side to price
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolMatch {
    pub address: String,
    pub token: TokenSide,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OhlcvRequest {
    /// Provider network id
    pub network: String,
    pub pool_address: String,
    pub timeframe: Timeframe,
    pub limit: u32,
    pub token: TokenSide,
}

/// Source of pool search and close series
#[async_trait]
pub trait OhlcvSource: Send + Sync {
    async fn search_pools(&self, query: &str, network: &str) -> ChartResult<Vec<PoolHit>>;

    /// Close prices in upstream order; callers normalize.
    async fn fetch_closes(&self, request: &OhlcvRequest) -> ChartResult<Vec<PricePoint>>;
}

/// Pick the pool for `BASE/QUOTE` from fuzzy search hits.
///
/// A hit named `BASE / QUOTE` wins. A hit named `QUOTE / BASE` comes next
/// and is priced against its quote token. Otherwise the first hit is used
/// as-is.
pub fn select_pool(hits: &[PoolHit], base: &str, quote: &str) -> Option<PoolMatch> {
    let named = |hit: &PoolHit, left: &str, right: &str| {
        pool_name_legs(&hit.name)
            .is_some_and(|(l, r)| l.eq_ignore_ascii_case(left) && r.eq_ignore_ascii_case(right))
    };

    if let Some(hit) = hits.iter().find(|h| named(h, base, quote)) {
        return Some(PoolMatch {
            address: hit.address.clone(),
            token: TokenSide::Base,
        });
    }
    if let Some(hit) = hits.iter().find(|h| named(h, quote, base)) {
        return Some(PoolMatch {
            address: hit.address.clone(),
            token: TokenSide::Quote,
        });
    }
    hits.first().map(|hit| PoolMatch {
        address: hit.address.clone(),
        token: TokenSide::Base,
    })
}

/// `"PNK / WETH 0.3%"` -> `("PNK", "WETH")`
fn pool_name_legs(name: &str) -> Option<(&str, &str)> {
    let (left, right) = name.split_once('/')?;
    let left = left.trim();
    let right = right.split_whitespace().next()?;
    if left.is_empty() {
        return None;
    }
    Some((left, right))
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<SearchEntry>,
}

#[derive(Debug, Deserialize)]
struct SearchEntry {
    attributes: SearchAttributes,
}

#[derive(Debug, Deserialize)]
struct SearchAttributes {
    address: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct OhlcvResponse {
    data: OhlcvData,
}

#[derive(Debug, Deserialize)]
struct OhlcvData {
    attributes: OhlcvAttributes,
}

#[derive(Debug, Deserialize)]
struct OhlcvAttributes {
    /// `[timestamp, open, high, low, close, volume]`
    #[serde(default)]
    ohlcv_list: Vec<Vec<f64>>,
}

/// GeckoTerminal REST client
#[derive(Clone)]
pub struct GeckoTerminalClient {
    http: Client,
    base_url: String,
}

impl GeckoTerminalClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent("FutarchyCharts/1.0")
            .build()
            .unwrap_or_default();

        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> ChartResult<T> {
        debug!("[GeckoTerminal] GET {} {:?}", url, query);

        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| ChartError::network(format!("OHLCV request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ChartError::rate_limited(PROVIDER));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChartError::upstream(format!(
                "OHLCV provider error ({}): {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ChartError::parse(format!("Failed to parse OHLCV response: {}", e)))
    }
}

impl Default for GeckoTerminalClient {
    fn default() -> Self {
        Self::new(DEFAULT_OHLCV_API_BASE)
    }
}

#[async_trait]
impl OhlcvSource for GeckoTerminalClient {
    #[instrument(skip(self))]
    async fn search_pools(&self, query: &str, network: &str) -> ChartResult<Vec<PoolHit>> {
        let url = format!("{}/search/pools", self.base_url);
        let response: SearchResponse = self
            .get(
                &url,
                &[("query", query.to_string()), ("network", network.to_string())],
            )
            .await?;

        Ok(response
            .data
            .into_iter()
            .map(|entry| PoolHit {
                address: entry.attributes.address.to_lowercase(),
                name: entry.attributes.name,
            })
            .collect())
    }

    #[instrument(skip(self), fields(pool = %request.pool_address))]
    async fn fetch_closes(&self, request: &OhlcvRequest) -> ChartResult<Vec<PricePoint>> {
        let url = format!(
            "{}/networks/{}/pools/{}/ohlcv/{}",
            self.base_url, request.network, request.pool_address, request.timeframe
        );
        let response: OhlcvResponse = self
            .get(
                &url,
                &[
                    ("limit", request.limit.to_string()),
                    ("token", request.token.as_str().to_string()),
                ],
            )
            .await?;

        Ok(closes_from_rows(response.data.attributes.ohlcv_list))
    }
}

fn closes_from_rows(rows: Vec<Vec<f64>>) -> Vec<PricePoint> {
    rows.into_iter()
        .filter_map(|row| match (row.first(), row.get(4)) {
            (Some(ts), Some(close)) => Some(PricePoint::new(*ts as i64, *close)),
            _ => None,
        })
        .collect()
}
