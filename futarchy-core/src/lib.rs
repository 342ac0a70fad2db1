//! Core types for the futarchy chart engine
//!
//! This crate defines the value objects shared across the workspace:
//! resolved proposal identities, normalized pools and candles, composite
//! spot series, and the workspace-wide error type.

pub mod address;
pub mod candle;
pub mod decimal;
pub mod error;
pub mod metadata;
pub mod pool;
pub mod proposal;

pub use candle::{Candle, PricePoint, SpotSeries, HOURLY_BUCKET_SECS};
pub use error::{ChartError, ChartResult};
pub use pool::{OutcomeSide, Pool, PoolKind, TokenInfo, TokenRole};
pub use proposal::{ProposalConfig, ProposalIdentity, DEFAULT_CHAIN_ID};
