//! On-chain rate providers
//!
//! A rate provider exposes `getRate()` returning a 1e18-scaled uint256. The
//! rate converts a yield-bearing quote (sDAI) into its underlying unit.

use async_trait::async_trait;
use futarchy_core::decimal::TOKEN_DECIMALS;
use futarchy_core::{ChartError, ChartResult};
use reqwest::Client;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::ticker::Network;

/// `getRate()`
const GET_RATE_SELECTOR: &str = "679aefce";

/// Multiplier used when no rate can be read
pub const NEUTRAL_RATE: f64 = 1.0;

/// Reads a provider's current rate
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn read_rate(&self, rpc_url: &str, provider: &str) -> ChartResult<f64>;
}

/// Read a rate, falling back to [`NEUTRAL_RATE`] when the network has no
/// RPC or the call fails.
pub async fn rate_or_neutral(source: &dyn RateSource, network: &Network, provider: &str) -> f64 {
    let Some(rpc_url) = network.rpc_url.as_deref() else {
        debug!("No RPC for network {}, rate for {} is neutral", network.provider_id, provider);
        return NEUTRAL_RATE;
    };

    match source.read_rate(rpc_url, provider).await {
        Ok(rate) => rate,
        Err(e) => {
            warn!("Rate provider {} unreadable, using 1: {}", provider, e);
            NEUTRAL_RATE
        }
    }
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest {
    jsonrpc: &'static str,
    method: &'static str,
    params: Vec<serde_json::Value>,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    result: Option<String>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    message: String,
}

/// `eth_call` over JSON-RPC
#[derive(Clone)]
pub struct RpcRateProvider {
    http: Client,
}

impl RpcRateProvider {
    pub fn new() -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self { http }
    }

    async fn eth_call(&self, rpc_url: &str, to: &str, data: &str) -> ChartResult<String> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method: "eth_call",
            params: vec![
                serde_json::json!({
                    "to": to,
                    "data": data
                }),
                serde_json::json!("latest"),
            ],
            id: 1,
        };

        debug!("eth_call to {} via {}: {}", to, rpc_url, data);

        let response = self
            .http
            .post(rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ChartError::network(format!("RPC request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ChartError::upstream(format!("RPC status {}", response.status())));
        }

        let rpc_response: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| ChartError::parse(format!("Failed to parse RPC response: {}", e)))?;

        if let Some(error) = rpc_response.error {
            return Err(ChartError::upstream(format!("RPC error: {}", error.message)));
        }

        rpc_response
            .result
            .ok_or_else(|| ChartError::upstream("No result in RPC response"))
    }
}

impl Default for RpcRateProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RateSource for RpcRateProvider {
    async fn read_rate(&self, rpc_url: &str, provider: &str) -> ChartResult<f64> {
        let data = format!("0x{}", GET_RATE_SELECTOR);
        let result = self.eth_call(rpc_url, provider, &data).await?;
        parse_rate(&result)
    }
}

/// Decode a 1e18-scaled uint256 return value.
fn parse_rate(hex: &str) -> ChartResult<f64> {
    let raw = parse_uint256(hex)?;
    let mantissa = i128::try_from(raw)
        .map_err(|_| ChartError::parse(format!("Rate {} out of range", raw)))?;
    let rate = Decimal::try_from_i128_with_scale(mantissa, TOKEN_DECIMALS)
        .map_err(|e| ChartError::parse(format!("Rate {} out of range: {}", raw, e)))?
        .to_f64()
        .ok_or_else(|| ChartError::parse(format!("Rate {} not representable", raw)))?;

    if rate <= 0.0 {
        return Err(ChartError::parse("Rate provider returned zero"));
    }
    Ok(rate)
}

fn parse_uint256(hex: &str) -> ChartResult<u128> {
    let hex = hex.strip_prefix("0x").unwrap_or(hex);

    if hex.is_empty() {
        return Err(ChartError::parse("Empty eth_call result"));
    }

    let (high, low) = if hex.len() > 32 {
        hex.split_at(hex.len() - 32)
    } else {
        ("", hex)
    };
    if !high.chars().all(|c| c == '0') {
        return Err(ChartError::parse("uint256 exceeds 128 bits"));
    }

    u128::from_str_radix(low, 16)
        .map_err(|e| ChartError::parse(format!("Failed to parse uint256: {}", e)))
}
