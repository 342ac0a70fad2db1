//! graph-node indexer adapter
//!
//! Nested relation objects, `BigInt`/`BigDecimal` values as strings, and
//! numeric filters that must be passed as strings. Volumes are already
//! human-scaled decimals.

use async_trait::async_trait;
use futarchy_core::address::normalize_address;
use futarchy_core::{
    Candle, ChartResult, Pool, ProposalConfig, ProposalIdentity, TokenInfo, TokenRole,
    HOURLY_BUCKET_SECS,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::adapter::{
    AdapterConfig, Backend, MarketDataAdapter, MAX_CANDLE_PAGES, PAGE_SIZE, SNAPSHOT_ID_KEY,
};
use crate::normalize::{canonical_or_zero, is_company, PoolParts};
use crate::transport::{decode, GraphqlTransport};
use crate::wire::{i64_from_string_or_number, opt_string_or_number, string_or_number};

const SNAPSHOT_QUERY: &str = r#"
query ResolveBySnapshotId($key: String!, $value: String!, $aggregator: String!) {
  metadataEntries(
    where: { key: $key, value: $value, proposal_: { aggregator: $aggregator } }
    first: 1
  ) {
    proposal {
      id
      proposalAddress
      metadata
      organization { id name }
    }
  }
}"#;

const LEGACY_QUERY: &str = r#"
query ResolveLegacyKey($key: String!) {
  metadataEntries(where: { key: $key, organization_not: null }, first: 1) {
    value
    organization { id name }
  }
}"#;

const PROPOSAL_BY_ADDRESS_QUERY: &str = r#"
query ProposalByAddress($address: String!) {
  proposals(where: { proposalAddress: $address }, first: 1) {
    id
    proposalAddress
    metadata
    organization { id name }
  }
}"#;

const POOLS_QUERY: &str = r#"
query Pools($proposal: String!) {
  pools(where: { proposal: $proposal }, first: 100) {
    id
    name
    type
    outcomeSide
    price
    volumeToken0
    volumeToken1
    token0 { symbol role }
    token1 { symbol role }
  }
}"#;

const CANDLES_QUERY: &str = r#"
query Candles($pool: String!, $period: String!, $minTime: String!, $maxTime: String!, $first: Int!) {
  candles(
    where: { pool: $pool, period: $period, periodStartUnix_gte: $minTime, periodStartUnix_lte: $maxTime }
    orderBy: periodStartUnix
    orderDirection: asc
    first: $first
  ) {
    periodStartUnix
    close
  }
}"#;

#[derive(Debug, Deserialize)]
struct MetadataEntry {
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    proposal: Option<ProposalRecord>,
    #[serde(default)]
    organization: Option<OrganizationRecord>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProposalRecord {
    id: String,
    #[serde(default)]
    proposal_address: Option<String>,
    #[serde(default)]
    metadata: Option<String>,
    #[serde(default)]
    organization: Option<OrganizationRecord>,
}

#[derive(Debug, Clone, Deserialize)]
struct OrganizationRecord {
    id: String,
    #[serde(default)]
    name: Option<String>,
}

impl ProposalRecord {
    fn to_identity(&self) -> ProposalIdentity {
        let organization = self.organization.clone();
        ProposalIdentity::from_record(
            &self.id,
            self.proposal_address.as_deref().unwrap_or(&self.id),
            organization.as_ref().map(|o| o.id.clone()),
            organization.and_then(|o| o.name),
            ProposalConfig::parse(self.metadata.as_deref()),
        )
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PoolRecord {
    id: String,
    name: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    outcome_side: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    price: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    volume_token0: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    volume_token1: Option<String>,
    #[serde(default)]
    token0: Option<TokenRecord>,
    #[serde(default)]
    token1: Option<TokenRecord>,
}

#[derive(Debug, Clone, Deserialize)]
struct TokenRecord {
    symbol: String,
    #[serde(default)]
    role: Option<String>,
}

impl TokenRecord {
    fn to_info(&self) -> TokenInfo {
        TokenInfo {
            symbol: self.symbol.clone(),
            role: self
                .role
                .as_deref()
                .map(TokenRole::parse)
                .unwrap_or(TokenRole::Unknown),
        }
    }
}

impl PoolRecord {
    fn to_pool(self) -> Pool {
        let volume0 = canonical_or_zero(self.volume_token0.as_deref().unwrap_or("0"), "volume");
        let volume1 = canonical_or_zero(self.volume_token1.as_deref().unwrap_or("0"), "volume");

        // Base is the company leg; token order in the indexer follows addresses.
        let (tokens, volume_base, volume_quote) = match (&self.token0, &self.token1) {
            (Some(t0), Some(t1)) => {
                let (i0, i1) = (t0.to_info(), t1.to_info());
                if !is_company(i0.role) && is_company(i1.role) {
                    (Some((i1, i0)), volume1, volume0)
                } else {
                    (Some((i0, i1)), volume0, volume1)
                }
            }
            _ => (None, volume0, volume1),
        };

        PoolParts {
            id: self.id,
            name: self.name,
            kind: self.kind,
            outcome_side: self.outcome_side,
            price: self.price,
            volume_base,
            volume_quote,
            tokens,
        }
        .into_pool()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CandleRecord {
    #[serde(deserialize_with = "i64_from_string_or_number")]
    period_start_unix: i64,
    #[serde(deserialize_with = "string_or_number")]
    close: String,
}

/// Adapter for the graph-node registry and candles subgraphs
pub struct GraphNodeAdapter {
    config: AdapterConfig,
    transport: Arc<dyn GraphqlTransport>,
}

impl GraphNodeAdapter {
    pub fn new(config: AdapterConfig, transport: Arc<dyn GraphqlTransport>) -> Self {
        Self { config, transport }
    }

    async fn proposal_by_address(&self, address: &str) -> ChartResult<Option<ProposalRecord>> {
        let data = self
            .transport
            .query(
                &self.config.registry_endpoint,
                PROPOSAL_BY_ADDRESS_QUERY,
                json!({ "address": address }),
            )
            .await?;
        let records: Vec<ProposalRecord> = decode(&data, "proposals")?;
        Ok(records.into_iter().next())
    }
}

#[async_trait]
impl MarketDataAdapter for GraphNodeAdapter {
    fn backend(&self) -> Backend {
        Backend::GraphNode
    }

    #[instrument(skip(self))]
    async fn find_by_snapshot_id(&self, identifier: &str) -> ChartResult<Option<ProposalIdentity>> {
        let data = self
            .transport
            .query(
                &self.config.registry_endpoint,
                SNAPSHOT_QUERY,
                json!({
                    "key": SNAPSHOT_ID_KEY,
                    "value": identifier,
                    "aggregator": self.config.aggregator,
                }),
            )
            .await?;

        let entries: Vec<MetadataEntry> = decode(&data, "metadataEntries")?;
        Ok(entries
            .into_iter()
            .find_map(|e| e.proposal)
            .map(|p| p.to_identity()))
    }

    #[instrument(skip(self))]
    async fn find_by_legacy_key(&self, identifier: &str) -> ChartResult<Option<ProposalIdentity>> {
        let data = self
            .transport
            .query(
                &self.config.registry_endpoint,
                LEGACY_QUERY,
                json!({ "key": identifier }),
            )
            .await?;

        let entries: Vec<MetadataEntry> = decode(&data, "metadataEntries")?;
        let Some(entry) = entries.into_iter().next() else {
            return Ok(None);
        };
        let Some(address) = entry.value.as_deref().map(normalize_address) else {
            return Ok(None);
        };

        if let Some(record) = self.proposal_by_address(&address).await? {
            return Ok(Some(record.to_identity()));
        }

        debug!("Legacy key {} points at unindexed address {}", identifier, address);
        let organization = entry.organization;
        Ok(Some(ProposalIdentity::from_record(
            &address,
            &address,
            organization.as_ref().map(|o| o.id.clone()),
            organization.and_then(|o| o.name),
            ProposalConfig::default(),
        )))
    }

    #[instrument(skip(self))]
    async fn list_pools(&self, trading_address: &str, _chain_id: u64) -> ChartResult<Vec<Pool>> {
        let data = self
            .transport
            .query(
                &self.config.candles_endpoint,
                POOLS_QUERY,
                json!({ "proposal": normalize_address(trading_address) }),
            )
            .await?;

        let records: Vec<PoolRecord> = decode(&data, "pools")?;
        debug!("graph-node returned {} pools", records.len());
        Ok(records.into_iter().map(PoolRecord::to_pool).collect())
    }

    #[instrument(skip(self))]
    async fn fetch_candle_series(
        &self,
        pool_id: &str,
        min_time: i64,
        max_time: i64,
        _chain_id: u64,
    ) -> ChartResult<Vec<Candle>> {
        let pool = normalize_address(pool_id);
        let mut candles = Vec::new();
        let mut cursor = min_time;

        for _ in 0..MAX_CANDLE_PAGES {
            let data = self
                .transport
                .query(
                    &self.config.candles_endpoint,
                    CANDLES_QUERY,
                    json!({
                        "pool": pool,
                        "period": HOURLY_BUCKET_SECS.to_string(),
                        "minTime": cursor.to_string(),
                        "maxTime": max_time.to_string(),
                        "first": PAGE_SIZE,
                    }),
                )
                .await?;

            let page: Vec<CandleRecord> = decode(&data, "candles")?;
            let page_len = page.len();
            candles.extend(page.into_iter().map(|c| {
                Candle::new(c.period_start_unix, canonical_or_zero(&c.close, "close"))
            }));

            match candles.last() {
                Some(last) if page_len == PAGE_SIZE => cursor = last.period_start + 1,
                _ => break,
            }
        }

        Ok(candles)
    }
}
