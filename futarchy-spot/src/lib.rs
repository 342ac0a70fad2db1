//! Composite spot pricing
//!
//! Evaluates ticker expressions such as `PNK/WETH+!sDAI/WETH-hour-50-xdai`
//! into a single price series: each hop is fetched from an OHLCV provider,
//! optionally inverted, joined by forward fill, and optionally divided by an
//! on-chain rate.

pub mod composite;
pub mod engine;
pub mod ohlcv;
pub mod rate;
pub mod ticker;

pub use engine::SpotEngine;
pub use ohlcv::{GeckoTerminalClient, OhlcvSource, DEFAULT_OHLCV_API_BASE};
pub use rate::{rate_or_neutral, RateSource, RpcRateProvider, NEUTRAL_RATE};
pub use ticker::{HopSource, HopSpec, Network, TickerSpec, Timeframe};
