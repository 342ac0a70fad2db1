//! Ticker grammar
//!
//! ```text
//! HOP ('+' HOP)* '-' INTERVAL '-' LIMIT '-' NETWORK ['-invert']
//! HOP := ['!'] ( POOLADDR ['::' RATEPROVIDER] | BASE ['::' RATEPROVIDER] '/' QUOTE )
//! ```
//!
//! `PNK/WETH+!sDAI/WETH-hour-50-xdai` is PNK per WETH times WETH per sDAI,
//! hourly, 50 samples, on Gnosis.

use futarchy_core::address::is_hex_address;
use futarchy_core::{ChartError, ChartResult};
use std::fmt;

/// Where one hop's series comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HopSource {
    /// Direct pool address
    Pool { address: String },
    /// Token pair resolved by fuzzy pool search
    Pair { base: String, quote: String },
}

/// One leg of a composite price
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HopSpec {
    pub source: HopSource,
    /// Replace every value `v` with `1/v` before combination
    pub invert: bool,
    /// On-chain rate divisor (applied on single-hop tickers only)
    pub rate_provider: Option<String>,
}

/// OHLCV granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timeframe {
    Minute,
    Hour,
    Day,
}

impl Timeframe {
    /// Substring match; anything that is neither minute nor day is hourly.
    pub fn parse(token: &str) -> Self {
        let token = token.to_lowercase();
        if token.contains("minute") {
            Timeframe::Minute
        } else if token.contains("day") {
            Timeframe::Day
        } else {
            Timeframe::Hour
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Minute => "minute",
            Timeframe::Hour => "hour",
            Timeframe::Day => "day",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed composite-price request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickerSpec {
    /// Input as given (trimmed); used as the cache key
    pub raw: String,
    pub hops: Vec<HopSpec>,
    pub timeframe: Timeframe,
    /// Sample count ceiling
    pub limit: u32,
    /// Network key as written (`xdai`, `eth`, `base`)
    pub network: String,
    /// Invert the fully combined series
    pub invert: bool,
}

impl TickerSpec {
    pub fn parse(input: &str) -> ChartResult<Self> {
        let raw = input.trim();
        let mut segments: Vec<&str> = raw.split('-').collect();

        let invert = segments
            .last()
            .is_some_and(|s| s.eq_ignore_ascii_case("invert"));
        if invert {
            segments.pop();
        }

        if segments.len() < 4 {
            return Err(ChartError::invalid_ticker(format!(
                "'{}' needs HOPS-INTERVAL-LIMIT-NETWORK",
                raw
            )));
        }

        let network = segments.pop().unwrap_or_default().trim().to_lowercase();
        let limit_token = segments.pop().unwrap_or_default().trim();
        let interval_token = segments.pop().unwrap_or_default();
        let hops_part = segments.join("-");

        if network.is_empty() {
            return Err(ChartError::invalid_ticker(format!("'{}' has no network", raw)));
        }

        let limit: u32 = limit_token
            .parse()
            .ok()
            .filter(|l| *l > 0)
            .ok_or_else(|| {
                ChartError::invalid_ticker(format!("limit '{}' is not a positive integer", limit_token))
            })?;

        let hops = hops_part
            .split('+')
            .map(parse_hop)
            .collect::<ChartResult<Vec<_>>>()?;

        Ok(Self {
            raw: raw.to_string(),
            hops,
            timeframe: Timeframe::parse(interval_token),
            limit,
            network,
            invert,
        })
    }

    pub fn is_multi_hop(&self) -> bool {
        self.hops.len() > 1
    }
}

impl fmt::Display for TickerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn parse_hop(text: &str) -> ChartResult<HopSpec> {
    let text = text.trim();
    let (invert, body) = match text.strip_prefix('!') {
        Some(rest) => (true, rest.trim()),
        None => (false, text),
    };

    if body.is_empty() {
        return Err(ChartError::invalid_ticker("empty hop"));
    }

    if let Some((left, quote)) = body.split_once('/') {
        let (base, rate_provider) = split_rate_provider(left)?;
        let quote = quote.trim();
        if base.is_empty() || quote.is_empty() || quote.contains('/') {
            return Err(ChartError::invalid_ticker(format!("malformed pair '{}'", body)));
        }
        return Ok(HopSpec {
            source: HopSource::Pair {
                base: base.to_string(),
                quote: quote.to_string(),
            },
            invert,
            rate_provider,
        });
    }

    let (address, rate_provider) = split_rate_provider(body)?;
    if !is_hex_address(address) {
        return Err(ChartError::invalid_ticker(format!(
            "'{}' is neither BASE/QUOTE nor a pool address",
            body
        )));
    }

    Ok(HopSpec {
        source: HopSource::Pool {
            address: address.to_lowercase(),
        },
        invert,
        rate_provider,
    })
}

fn split_rate_provider(text: &str) -> ChartResult<(&str, Option<String>)> {
    match text.split_once("::") {
        Some((head, provider)) => {
            let provider = provider.trim();
            if !is_hex_address(provider) {
                return Err(ChartError::invalid_ticker(format!(
                    "rate provider '{}' is not an address",
                    provider
                )));
            }
            Ok((head.trim(), Some(provider.to_lowercase())))
        }
        None => Ok((text.trim(), None)),
    }
}

/// Network key mapped to the OHLCV provider's id and an RPC endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Network {
    pub provider_id: String,
    pub rpc_url: Option<String>,
}

impl Network {
    /// Known keys map to fixed endpoints; unknown keys pass through as the
    /// provider id with no RPC (rate reads then fall back to 1).
    pub fn resolve(key: &str) -> Self {
        let key = key.trim().to_lowercase();
        let (provider_id, rpc_url) = match key.as_str() {
            "xdai" | "gnosis" => ("xdai", Some("https://rpc.gnosischain.com")),
            "eth" | "ethereum" | "mainnet" => ("eth", Some("https://eth.llamarpc.com")),
            "base" => ("base", Some("https://mainnet.base.org")),
            "polygon" | "matic" => ("polygon_pos", Some("https://polygon-rpc.com")),
            _ => {
                return Self {
                    provider_id: key,
                    rpc_url: None,
                }
            }
        };
        Self {
            provider_id: provider_id.to_string(),
            rpc_url: rpc_url.map(str::to_string),
        }
    }

    /// Network for an EVM chain id, when known.
    pub fn for_chain_id(chain_id: u64) -> Option<Self> {
        let key = match chain_id {
            100 => "xdai",
            1 => "eth",
            8453 => "base",
            137 => "polygon",
            _ => return None,
        };
        Some(Self::resolve(key))
    }
}
