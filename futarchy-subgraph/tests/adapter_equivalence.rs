//! Both indexer adapters must produce identical normalized output from
//! equivalent fixtures, and follow the same resolution order.
//!
//! Run with: cargo test -p futarchy-subgraph --test adapter_equivalence

use async_trait::async_trait;
use futarchy_core::{ChartError, ChartResult, OutcomeSide, PoolKind, TokenRole, DEFAULT_CHAIN_ID};
use futarchy_subgraph::{
    build_adapter, AdapterConfig, Backend, GraphqlTransport, MarketDataAdapter,
    DEFAULT_AGGREGATOR,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;

const TRADING: &str = "0x1111111111111111111111111111111111111111";
const YES_POOL: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
const NO_POOL: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

/// Canned responses keyed by GraphQL operation name
struct FakeTransport {
    responses: Vec<(&'static str, Value)>,
    calls: Mutex<Vec<(String, Value)>>,
    fail: bool,
}

impl FakeTransport {
    fn new(responses: Vec<(&'static str, Value)>) -> Arc<Self> {
        Arc::new(Self {
            responses,
            calls: Mutex::new(Vec::new()),
            fail: false,
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            responses: vec![],
            calls: Mutex::new(Vec::new()),
            fail: true,
        })
    }

    fn calls_to(&self, operation: &str) -> Vec<Value> {
        self.calls
            .lock()
            .iter()
            .filter(|(op, _)| op == operation)
            .map(|(_, vars)| vars.clone())
            .collect()
    }
}

fn operation_name(query: &str) -> String {
    query
        .split("query ")
        .nth(1)
        .and_then(|rest| rest.split(['(', ' ', '{']).next())
        .unwrap_or_default()
        .to_string()
}

#[async_trait]
impl GraphqlTransport for FakeTransport {
    async fn query(&self, _endpoint: &str, query: &str, variables: Value) -> ChartResult<Value> {
        let op = operation_name(query);
        self.calls.lock().push((op.clone(), variables));
        if self.fail {
            return Err(ChartError::upstream("indexer down"));
        }
        Ok(self
            .responses
            .iter()
            .find(|(name, _)| *name == op)
            .map(|(_, v)| v.clone())
            .unwrap_or_else(|| json!({})))
    }
}

fn graph_node_fixture() -> Vec<(&'static str, Value)> {
    vec![
        (
            "Pools",
            json!({ "pools": [
                {
                    "id": YES_POOL,
                    "name": "YES_GNO / YES_sDAI",
                    "type": "CONDITIONAL",
                    "outcomeSide": "YES",
                    "price": "120.50",
                    "volumeToken0": "250.5",
                    "volumeToken1": "10.000",
                    "token0": { "symbol": "YES_sDAI", "role": "YES_CURRENCY" },
                    "token1": { "symbol": "YES_GNO", "role": "YES_COMPANY" }
                },
                {
                    "id": NO_POOL,
                    "name": "NO_GNO / NO_sDAI",
                    "type": "CONDITIONAL",
                    "outcomeSide": null,
                    "price": "118",
                    "volumeToken0": "3",
                    "volumeToken1": "400",
                    "token0": { "symbol": "NO_GNO", "role": "NO_COMPANY" },
                    "token1": { "symbol": "NO_sDAI", "role": "NO_CURRENCY" }
                }
            ]}),
        ),
        (
            "Candles",
            json!({ "candles": [
                { "periodStartUnix": "3600", "close": "120.10" },
                { "periodStartUnix": "10800", "close": "121" }
            ]}),
        ),
    ]
}

fn checkpoint_fixture() -> Vec<(&'static str, Value)> {
    vec![
        (
            "Pools",
            json!({ "pools": [
                {
                    "id": format!("100-{}", YES_POOL),
                    "name": "YES_GNO / YES_sDAI",
                    "type": "CONDITIONAL",
                    "outcomeSide": "YES",
                    "price": "120.5",
                    "isInverted": true,
                    "volumeToken0": "250500000000000000000",
                    "volumeToken1": "10000000000000000000",
                    "token0": "100-0xsdai",
                    "token1": "100-0xgno"
                },
                {
                    "id": format!("100-{}", NO_POOL),
                    "name": "NO_GNO / NO_sDAI",
                    "type": "CONDITIONAL",
                    "price": 118,
                    "isInverted": false,
                    "volumeToken0": "3000000000000000000",
                    "volumeToken1": "400000000000000000000",
                    "token0": "100-0xnogno",
                    "token1": "100-0xnosdai"
                }
            ]}),
        ),
        (
            "Candles",
            json!({ "candles": [
                { "periodStartUnix": 3600, "close": "120.1" },
                { "periodStartUnix": 10800, "close": "121.0" }
            ]}),
        ),
    ]
}

fn adapter(backend: Backend, transport: Arc<FakeTransport>) -> Arc<dyn MarketDataAdapter> {
    build_adapter(AdapterConfig::for_backend(backend), transport)
}

#[tokio::test]
async fn test_list_pools_is_backend_independent() {
    let graph = adapter(Backend::GraphNode, FakeTransport::new(graph_node_fixture()));
    let checkpoint = adapter(Backend::Checkpoint, FakeTransport::new(checkpoint_fixture()));

    let a = graph.list_pools(TRADING, DEFAULT_CHAIN_ID).await.unwrap();
    let b = checkpoint.list_pools(TRADING, DEFAULT_CHAIN_ID).await.unwrap();

    assert_eq!(a, b);
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );

    let yes = &a[0];
    assert_eq!(yes.id, YES_POOL);
    assert_eq!(yes.kind, PoolKind::Conditional);
    assert_eq!(yes.outcome_side, Some(OutcomeSide::Yes));
    assert_eq!(yes.price, "120.5");
    assert_eq!(yes.volume_base, "10");
    assert_eq!(yes.volume_quote, "250.5");
    assert_eq!(yes.base_token.as_ref().unwrap().symbol, "YES_GNO");
    assert_eq!(yes.base_token.as_ref().unwrap().role, TokenRole::YesCompany);
    assert_eq!(yes.quote_token.as_ref().unwrap().role, TokenRole::YesCurrency);

    let no = &a[1];
    assert_eq!(no.outcome_side, Some(OutcomeSide::No));
    assert_eq!(no.volume_base, "3");
    assert_eq!(no.volume_quote, "400");
}

#[tokio::test]
async fn test_candle_series_is_backend_independent() {
    let graph_transport = FakeTransport::new(graph_node_fixture());
    let checkpoint_transport = FakeTransport::new(checkpoint_fixture());
    let graph = adapter(Backend::GraphNode, graph_transport.clone());
    let checkpoint = adapter(Backend::Checkpoint, checkpoint_transport.clone());

    let a = graph
        .fetch_candle_series(YES_POOL, 0, 20_000, DEFAULT_CHAIN_ID)
        .await
        .unwrap();
    let b = checkpoint
        .fetch_candle_series(YES_POOL, 0, 20_000, DEFAULT_CHAIN_ID)
        .await
        .unwrap();

    assert_eq!(a, b);
    assert_eq!(a[0].period_start, 3600);
    assert_eq!(a[0].close, "120.1");

    // Filter typing and id form differ per backend
    let graph_vars = &graph_transport.calls_to("Candles")[0];
    assert_eq!(graph_vars["pool"], json!(YES_POOL));
    assert_eq!(graph_vars["period"], json!("3600"));
    assert_eq!(graph_vars["minTime"], json!("0"));

    let checkpoint_vars = &checkpoint_transport.calls_to("Candles")[0];
    assert_eq!(checkpoint_vars["pool"], json!(format!("100-{}", YES_POOL)));
    assert_eq!(checkpoint_vars["period"], json!(3600));
    assert_eq!(checkpoint_vars["maxTime"], json!(20_000));
}

#[tokio::test]
async fn test_graph_node_resolves_via_snapshot_metadata() {
    let transport = FakeTransport::new(vec![(
        "ResolveBySnapshotId",
        json!({ "metadataEntries": [{
            "proposal": {
                "id": "0xPROPOSAL",
                "proposalAddress": TRADING,
                "metadata": r#"{"chain": 1, "closeTimestamp": "1760000000", "precision": "bad"}"#,
                "organization": { "id": "0xORG", "name": "Gnosis DAO" }
            }
        }]}),
    )]);
    let graph = adapter(Backend::GraphNode, transport.clone());

    let identity = graph.resolve_proposal("0xSnapshotHash").await.unwrap();
    assert_eq!(identity.trading_address, TRADING);
    assert_eq!(identity.organization_name.as_deref(), Some("Gnosis DAO"));
    assert_eq!(identity.chain_id, 1);
    assert_eq!(identity.close_timestamp, Some(1_760_000_000));
    assert_eq!(identity.price_precision, None);

    let vars = &transport.calls_to("ResolveBySnapshotId")[0];
    assert_eq!(vars["value"], json!("0xsnapshothash"));
    assert_eq!(vars["aggregator"], json!(DEFAULT_AGGREGATOR));
    assert!(transport.calls_to("ResolveLegacyKey").is_empty());
}

#[tokio::test]
async fn test_graph_node_falls_back_to_legacy_key() {
    let transport = FakeTransport::new(vec![
        ("ResolveBySnapshotId", json!({ "metadataEntries": [] })),
        (
            "ResolveLegacyKey",
            json!({ "metadataEntries": [{
                "value": TRADING.to_uppercase().replace("0X", "0x"),
                "organization": { "id": "0xorg", "name": "Kleros" }
            }]}),
        ),
        ("ProposalByAddress", json!({ "proposals": [] })),
    ]);
    let graph = adapter(Backend::GraphNode, transport.clone());

    let identity = graph.resolve_proposal("legacy-market").await.unwrap();
    assert_eq!(identity.trading_address, TRADING);
    assert_eq!(identity.organization_name.as_deref(), Some("Kleros"));
    assert!(identity.ticker_spec.is_none());
    assert_eq!(transport.calls_to("ProposalByAddress").len(), 1);
}

fn empty_registry() -> Vec<(&'static str, Value)> {
    vec![
        ("ResolveBySnapshotId", json!({ "metadataEntries": [] })),
        ("ResolveLegacyKey", json!({ "metadataEntries": [] })),
        ("MetadataByKeyValue", json!({ "metadataentries": [] })),
        ("MetadataByKey", json!({ "metadataentries": [] })),
    ]
}

#[tokio::test]
async fn test_misses_pass_through_on_both_backends() {
    for backend in [Backend::GraphNode, Backend::Checkpoint] {
        let a = adapter(backend, FakeTransport::new(empty_registry()));
        let identity = a.resolve_proposal("100-0xDEADBEEF").await.unwrap();
        assert_eq!(identity.trading_address, "0xdeadbeef", "{}", backend);
        assert_eq!(identity.chain_id, DEFAULT_CHAIN_ID);
        assert!(identity.organization_id.is_none());
    }
}

#[tokio::test]
async fn test_checkpoint_enforces_aggregator_scope() {
    let transport = FakeTransport::new(vec![
        (
            "MetadataByKeyValue",
            json!({ "metadataentries": [{ "id": "m1", "proposal": "100-0xprop", "organization": "100-0xorg" }] }),
        ),
        (
            "ProposalById",
            json!({ "proposalentity": {
                "id": "100-0xprop",
                "proposalAddress": format!("100-{}", TRADING),
                "metadata": r#"{"spotPrice": "GNO/sDAI-hour-100-xdai"}"#,
                "organization": "100-0xorg",
                "aggregator": "0x0000000000000000000000000000000000000bad"
            }}),
        ),
        ("MetadataByKey", json!({ "metadataentries": [] })),
    ]);
    let checkpoint = adapter(Backend::Checkpoint, transport.clone());

    let identity = checkpoint.resolve_proposal("snap-1").await.unwrap();
    // Out-of-scope proposal is ignored, so resolution passes through
    assert_eq!(identity.trading_address, "snap-1");
    assert_eq!(transport.calls_to("MetadataByKey").len(), 1);
}

#[tokio::test]
async fn test_checkpoint_resolves_in_scope_proposal() {
    let transport = FakeTransport::new(vec![
        (
            "MetadataByKeyValue",
            json!({ "metadataentries": [{ "id": "m1", "proposal": "100-0xprop", "organization": "100-0xorg" }] }),
        ),
        (
            "ProposalById",
            json!({ "proposalentity": {
                "id": "100-0xprop",
                "proposalAddress": format!("100-{}", TRADING),
                "metadata": r#"{"spotPrice": "GNO/sDAI-hour-100-xdai"}"#,
                "organization": "100-0xorg",
                "aggregator": DEFAULT_AGGREGATOR
            }}),
        ),
        ("OrganizationById", json!({ "organization": { "id": "100-0xorg", "name": "Gnosis DAO" } })),
    ]);
    let checkpoint = adapter(Backend::Checkpoint, transport);

    let identity = checkpoint.resolve_proposal("snap-1").await.unwrap();
    assert_eq!(identity.proposal_id, "0xprop");
    assert_eq!(identity.trading_address, TRADING);
    assert_eq!(identity.organization_id.as_deref(), Some("0xorg"));
    assert_eq!(identity.organization_name.as_deref(), Some("Gnosis DAO"));
    assert_eq!(identity.ticker_spec.as_deref(), Some("GNO/sDAI-hour-100-xdai"));
}

#[tokio::test]
async fn test_transport_failure_propagates() {
    for backend in [Backend::GraphNode, Backend::Checkpoint] {
        let a = adapter(backend, FakeTransport::failing());
        assert!(matches!(
            a.resolve_proposal("0xabc").await,
            Err(ChartError::Upstream(_))
        ));
        assert!(a.list_pools(TRADING, DEFAULT_CHAIN_ID).await.is_err());
        assert!(a
            .fetch_candle_series(YES_POOL, 0, 1, DEFAULT_CHAIN_ID)
            .await
            .is_err());
    }
}
