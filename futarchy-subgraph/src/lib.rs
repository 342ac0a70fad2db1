//! Indexer adapters for the futarchy chart engine
//!
//! Two structurally different GraphQL indexers (graph-node subgraphs and a
//! checkpoint indexer) sit behind one [`MarketDataAdapter`] contract. The
//! adapter is chosen once at startup with [`build_adapter`]; everything it
//! returns is normalized: plain lowercase ids, human-scaled volumes, and
//! token legs recovered from pool names when the backend only stores keys.

pub mod adapter;
pub mod checkpoint;
pub mod graph_node;
mod normalize;
pub mod pool_name;
pub mod transport;
mod wire;

pub use adapter::{
    build_adapter, AdapterConfig, Backend, MarketDataAdapter, DEFAULT_AGGREGATOR, SNAPSHOT_ID_KEY,
};
pub use checkpoint::CheckpointAdapter;
pub use graph_node::GraphNodeAdapter;
pub use pool_name::{parse_pool_name, ParsedPoolName};
pub use transport::{GraphqlTransport, HttpGraphqlClient};
