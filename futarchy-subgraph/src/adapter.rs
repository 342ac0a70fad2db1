//! Backend-independent adapter contract
//!
//! Both indexers expose the same three operations once normalized. The
//! resolution order is shared: sentinel metadata lookup, then the legacy
//! per-organization key, then pass-through.

use async_trait::async_trait;
use futarchy_core::address::normalize_address;
use futarchy_core::{Candle, ChartError, ChartResult, Pool, ProposalIdentity};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

use crate::checkpoint::CheckpointAdapter;
use crate::graph_node::GraphNodeAdapter;
use crate::transport::GraphqlTransport;

/// Metadata key whose value holds the external (snapshot) proposal id
pub const SNAPSHOT_ID_KEY: &str = "snapshot_id";

/// Aggregator that scopes sentinel lookups to our tenant set
pub const DEFAULT_AGGREGATOR: &str = "0xc5eb43d53e2fe5fdde5faf400cc4167e5b5d4fc1";

/// Page size for list queries
pub const PAGE_SIZE: usize = 1000;

/// Upper bound on pages fetched for one candle window
pub const MAX_CANDLE_PAGES: usize = 10;

/// Identical contract over either indexer.
#[async_trait]
pub trait MarketDataAdapter: Send + Sync {
    fn backend(&self) -> Backend;

    /// Step 1: metadata entry `snapshot_id == identifier` under the aggregator.
    async fn find_by_snapshot_id(&self, identifier: &str) -> ChartResult<Option<ProposalIdentity>>;

    /// Step 2: legacy organization metadata keyed by the identifier itself.
    async fn find_by_legacy_key(&self, identifier: &str) -> ChartResult<Option<ProposalIdentity>>;

    async fn list_pools(&self, trading_address: &str, chain_id: u64) -> ChartResult<Vec<Pool>>;

    /// Hourly candles with `min_time <= periodStart <= max_time`, ascending.
    async fn fetch_candle_series(
        &self,
        pool_id: &str,
        min_time: i64,
        max_time: i64,
        chain_id: u64,
    ) -> ChartResult<Vec<Candle>>;

    /// Resolve an external identifier or trading address. Misses fall through
    /// to the next step; transport failures propagate.
    async fn resolve_proposal(&self, identifier: &str) -> ChartResult<ProposalIdentity> {
        let normalized = normalize_address(identifier);
        if normalized.is_empty() {
            return Err(ChartError::not_found("Empty proposal identifier"));
        }

        if let Some(identity) = self.find_by_snapshot_id(&normalized).await? {
            debug!("Resolved {} via {} metadata", normalized, SNAPSHOT_ID_KEY);
            return Ok(identity);
        }

        if let Some(identity) = self.find_by_legacy_key(&normalized).await? {
            debug!("Resolved {} via legacy organization metadata", normalized);
            return Ok(identity);
        }

        debug!("No metadata for {}, treating it as the trading address", normalized);
        Ok(ProposalIdentity::pass_through(&normalized))
    }
}

/// Which indexer flavor is configured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Nested relations, string-typed numeric filters, plain ids
    GraphNode,
    /// Flat foreign keys, integer filters, `<chainId>-<address>` ids
    Checkpoint,
}

impl Backend {
    pub fn default_registry_endpoint(&self) -> &'static str {
        match self {
            Backend::GraphNode => {
                "https://api.studio.thegraph.com/query/1719/futarchy-registry/version/latest"
            }
            Backend::Checkpoint => "https://checkpoint.futarchy.ai/graphql",
        }
    }

    pub fn default_candles_endpoint(&self) -> &'static str {
        match self {
            Backend::GraphNode => {
                "https://api.studio.thegraph.com/query/1719/futarchy-candles/version/latest"
            }
            Backend::Checkpoint => "https://checkpoint.futarchy.ai/graphql",
        }
    }
}

impl FromStr for Backend {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "graph-node" | "graphnode" | "subgraph" | "graph" => Ok(Backend::GraphNode),
            "checkpoint" => Ok(Backend::Checkpoint),
            other => Err(ChartError::config(format!("Unknown subgraph backend: {}", other))),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::GraphNode => write!(f, "graph-node"),
            Backend::Checkpoint => write!(f, "checkpoint"),
        }
    }
}

/// Endpoints and tenant scope for one adapter instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterConfig {
    pub backend: Backend,
    pub registry_endpoint: String,
    pub candles_endpoint: String,
    pub aggregator: String,
}

impl AdapterConfig {
    pub fn for_backend(backend: Backend) -> Self {
        Self {
            backend,
            registry_endpoint: backend.default_registry_endpoint().to_string(),
            candles_endpoint: backend.default_candles_endpoint().to_string(),
            aggregator: DEFAULT_AGGREGATOR.to_string(),
        }
    }
}

/// Construct the configured adapter once at startup.
pub fn build_adapter(
    config: AdapterConfig,
    transport: Arc<dyn GraphqlTransport>,
) -> Arc<dyn MarketDataAdapter> {
    match config.backend {
        Backend::GraphNode => Arc::new(GraphNodeAdapter::new(config, transport)),
        Backend::Checkpoint => Arc::new(CheckpointAdapter::new(config, transport)),
    }
}
