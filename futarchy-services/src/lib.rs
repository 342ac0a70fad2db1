//! Chart services
//!
//! Orchestrates the subgraph adapter and the spot engine into chart
//! responses, behind four TTL caches and a background warmer.

pub mod caches;
pub mod candle_fill;
pub mod chart_service;
pub mod config;
pub mod spot_service;
pub mod ttl_cache;
pub mod warmer;

pub use caches::ChartCaches;
pub use candle_fill::fill_candle_gaps;
pub use chart_service::{ChartParams, ChartResponse, ChartService, OutcomePair, SpotMode};
pub use config::{CacheTtls, ServiceConfig, WarmerConfig};
pub use spot_service::SpotService;
pub use ttl_cache::TtlCache;
pub use warmer::{warm_interval, CacheWarmer, WarmCycle, WarmList};
