//! Checkpoint indexer adapter
//!
//! Flat foreign-key strings instead of nested objects, integer-typed numeric
//! filters, ids of the form `<chainId>-<address>`, and token amounts as raw
//! 18-decimal integers. Token legs are recovered from pool names.

use async_trait::async_trait;
use futarchy_core::address::{chain_prefixed, normalize_address};
use futarchy_core::decimal::{scale_fixed_point, TOKEN_DECIMALS};
use futarchy_core::{
    Candle, ChartResult, Pool, ProposalConfig, ProposalIdentity, HOURLY_BUCKET_SECS,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::adapter::{
    AdapterConfig, Backend, MarketDataAdapter, MAX_CANDLE_PAGES, PAGE_SIZE, SNAPSHOT_ID_KEY,
};
use crate::normalize::{canonical_or_zero, PoolParts};
use crate::transport::{decode, GraphqlTransport};
use crate::wire::{i64_from_string_or_number, opt_string_or_number, string_or_number};

const METADATA_QUERY: &str = r#"
query MetadataByKeyValue($key: String!, $value: String!) {
  metadataentries(where: { key: $key, value: $value }, first: 10) {
    id
    proposal
    organization
  }
}"#;

const LEGACY_QUERY: &str = r#"
query MetadataByKey($key: String!) {
  metadataentries(where: { key: $key }, first: 10) {
    id
    value
    organization
  }
}"#;

const PROPOSAL_QUERY: &str = r#"
query ProposalById($id: String!) {
  proposalentity(id: $id) {
    id
    proposalAddress
    metadata
    organization
    aggregator
  }
}"#;

const PROPOSAL_BY_ADDRESS_QUERY: &str = r#"
query ProposalByAddress($address: String!) {
  proposalentities(where: { proposalAddress: $address }, first: 1) {
    id
    proposalAddress
    metadata
    organization
    aggregator
  }
}"#;

const ORGANIZATION_QUERY: &str = r#"
query OrganizationById($id: String!) {
  organization(id: $id) {
    id
    name
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
    isInverted
    volumeToken0
    volumeToken1
    token0
    token1
  }
}"#;

const CANDLES_QUERY: &str = r#"
query Candles($pool: String!, $period: Int!, $minTime: Int!, $maxTime: Int!, $first: Int!) {
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
struct MetadataRow {
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    proposal: Option<String>,
    #[serde(default)]
    organization: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProposalRow {
    id: String,
    #[serde(default)]
    proposal_address: Option<String>,
    #[serde(default)]
    metadata: Option<String>,
    #[serde(default)]
    organization: Option<String>,
    #[serde(default)]
    aggregator: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrganizationRow {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PoolRow {
    id: String,
    name: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    outcome_side: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    price: Option<String>,
    /// token0 is the currency leg
    #[serde(default)]
    is_inverted: Option<bool>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    volume_token0: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    volume_token1: Option<String>,
}

impl PoolRow {
    fn to_pool(self) -> Pool {
        let volume0 = scaled_volume(self.volume_token0.as_deref());
        let volume1 = scaled_volume(self.volume_token1.as_deref());
        let (volume_base, volume_quote) = if self.is_inverted.unwrap_or(false) {
            (volume1, volume0)
        } else {
            (volume0, volume1)
        };

        PoolParts {
            id: self.id,
            name: self.name,
            kind: self.kind,
            outcome_side: self.outcome_side,
            price: self.price,
            volume_base,
            volume_quote,
            tokens: None,
        }
        .into_pool()
    }
}

fn scaled_volume(raw: Option<&str>) -> String {
    let raw = raw.unwrap_or("0");
    scale_fixed_point(raw, TOKEN_DECIMALS).unwrap_or_else(|e| {
        warn!("Malformed raw volume '{}': {}", raw, e);
        "0".to_string()
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CandleRow {
    #[serde(deserialize_with = "i64_from_string_or_number")]
    period_start_unix: i64,
    #[serde(deserialize_with = "string_or_number")]
    close: String,
}

/// Adapter for the checkpoint indexer
pub struct CheckpointAdapter {
    config: AdapterConfig,
    transport: Arc<dyn GraphqlTransport>,
}

impl CheckpointAdapter {
    pub fn new(config: AdapterConfig, transport: Arc<dyn GraphqlTransport>) -> Self {
        Self { config, transport }
    }

    async fn registry(&self, query: &str, variables: serde_json::Value) -> ChartResult<serde_json::Value> {
        self.transport
            .query(&self.config.registry_endpoint, query, variables)
            .await
    }

    async fn proposal(&self, id: &str) -> ChartResult<Option<ProposalRow>> {
        let data = self.registry(PROPOSAL_QUERY, json!({ "id": id })).await?;
        decode(&data, "proposalentity")
    }

    async fn organization_name(&self, id: &str) -> ChartResult<Option<String>> {
        let data = self.registry(ORGANIZATION_QUERY, json!({ "id": id })).await?;
        let row: Option<OrganizationRow> = decode(&data, "organization")?;
        Ok(row.and_then(|r| r.name))
    }

    async fn to_identity(&self, row: ProposalRow) -> ChartResult<ProposalIdentity> {
        let organization_name = match row.organization.as_deref() {
            Some(org) => self.organization_name(org).await?,
            None => None,
        };
        let address = row.proposal_address.as_deref().unwrap_or(&row.id);

        Ok(ProposalIdentity::from_record(
            &row.id,
            address,
            row.organization.clone(),
            organization_name,
            ProposalConfig::parse(row.metadata.as_deref()),
        ))
    }

    fn in_scope(&self, row: &ProposalRow) -> bool {
        row.aggregator
            .as_deref()
            .map(normalize_address)
            .is_some_and(|a| a == normalize_address(&self.config.aggregator))
    }
}

#[async_trait]
impl MarketDataAdapter for CheckpointAdapter {
    fn backend(&self) -> Backend {
        Backend::Checkpoint
    }

    #[instrument(skip(self))]
    async fn find_by_snapshot_id(&self, identifier: &str) -> ChartResult<Option<ProposalIdentity>> {
        let data = self
            .registry(
                METADATA_QUERY,
                json!({ "key": SNAPSHOT_ID_KEY, "value": identifier }),
            )
            .await?;
        let rows: Vec<MetadataRow> = decode(&data, "metadataentries")?;

        // No nested filters here, so the aggregator scope is checked per row.
        for proposal_id in rows.into_iter().filter_map(|r| r.proposal) {
            if let Some(row) = self.proposal(&proposal_id).await? {
                if self.in_scope(&row) {
                    return self.to_identity(row).await.map(Some);
                }
                debug!("Proposal {} is outside aggregator scope", proposal_id);
            }
        }

        Ok(None)
    }

    #[instrument(skip(self))]
    async fn find_by_legacy_key(&self, identifier: &str) -> ChartResult<Option<ProposalIdentity>> {
        let data = self
            .registry(LEGACY_QUERY, json!({ "key": identifier }))
            .await?;
        let rows: Vec<MetadataRow> = decode(&data, "metadataentries")?;

        let Some(row) = rows
            .into_iter()
            .find(|r| r.organization.is_some() && r.value.is_some())
        else {
            return Ok(None);
        };
        let address = normalize_address(row.value.as_deref().unwrap_or_default());

        let data = self
            .registry(PROPOSAL_BY_ADDRESS_QUERY, json!({ "address": address }))
            .await?;
        let proposals: Vec<ProposalRow> = decode(&data, "proposalentities")?;
        if let Some(proposal) = proposals.into_iter().next() {
            return self.to_identity(proposal).await.map(Some);
        }

        debug!("Legacy key {} points at unindexed address {}", identifier, address);
        let organization_name = match row.organization.as_deref() {
            Some(org) => self.organization_name(org).await?,
            None => None,
        };
        Ok(Some(ProposalIdentity::from_record(
            &address,
            &address,
            row.organization,
            organization_name,
            ProposalConfig::default(),
        )))
    }

    #[instrument(skip(self))]
    async fn list_pools(&self, trading_address: &str, chain_id: u64) -> ChartResult<Vec<Pool>> {
        let data = self
            .transport
            .query(
                &self.config.candles_endpoint,
                POOLS_QUERY,
                json!({ "proposal": chain_prefixed(chain_id, trading_address) }),
            )
            .await?;

        let rows: Vec<PoolRow> = decode(&data, "pools")?;
        debug!("checkpoint returned {} pools", rows.len());
        Ok(rows.into_iter().map(PoolRow::to_pool).collect())
    }

    #[instrument(skip(self))]
    async fn fetch_candle_series(
        &self,
        pool_id: &str,
        min_time: i64,
        max_time: i64,
        chain_id: u64,
    ) -> ChartResult<Vec<Candle>> {
        let pool = chain_prefixed(chain_id, pool_id);
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
                        "period": HOURLY_BUCKET_SECS,
                        "minTime": cursor,
                        "maxTime": max_time,
                        "first": PAGE_SIZE,
                    }),
                )
                .await?;

            let page: Vec<CandleRow> = decode(&data, "candles")?;
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
