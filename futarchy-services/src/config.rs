//! Environment configuration

use futarchy_core::{ChartError, ChartResult};
use futarchy_spot::DEFAULT_OHLCV_API_BASE;
use futarchy_subgraph::{AdapterConfig, Backend};
use std::time::Duration;
use url::Url;

/// Lifetimes of the four cache layers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    pub registry: Duration,
    pub candles: Duration,
    pub spot: Duration,
    pub response: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            registry: Duration::from_secs(600),
            candles: Duration::from_secs(60),
            spot: Duration::from_secs(120),
            response: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarmerConfig {
    pub enabled: bool,
    /// Most queries tracked at once
    pub capacity: usize,
    /// Queries not requested for this long stop being warmed
    pub retention: Duration,
}

impl Default for WarmerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: 200,
            retention: Duration::from_secs(86_400),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub adapter: AdapterConfig,
    pub ohlcv_api_base: String,
    pub ttls: CacheTtls,
    pub warmer: WarmerConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            adapter: AdapterConfig::for_backend(Backend::GraphNode),
            ohlcv_api_base: DEFAULT_OHLCV_API_BASE.to_string(),
            ttls: CacheTtls::default(),
            warmer: WarmerConfig::default(),
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> ChartResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source. Unparsable numbers fall back to their
    /// defaults; an unknown backend name or a malformed URL is an error.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ChartResult<Self> {
        let defaults = Self::default();
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let secs = |name: &str, default: Duration| {
            var(name)
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(default)
        };

        let backend = match var("SUBGRAPH_BACKEND") {
            Some(name) => name.parse::<Backend>()?,
            None => Backend::GraphNode,
        };
        let mut adapter = AdapterConfig::for_backend(backend);
        if let Some(endpoint) = var("REGISTRY_ENDPOINT") {
            adapter.registry_endpoint = endpoint;
        }
        if let Some(endpoint) = var("CANDLES_ENDPOINT") {
            adapter.candles_endpoint = endpoint;
        }
        if let Some(aggregator) = var("AGGREGATOR_ADDRESS") {
            adapter.aggregator = aggregator.to_lowercase();
        }

        let ohlcv_api_base = var("OHLCV_API_BASE").unwrap_or(defaults.ohlcv_api_base);
        for (name, endpoint) in [
            ("REGISTRY_ENDPOINT", &adapter.registry_endpoint),
            ("CANDLES_ENDPOINT", &adapter.candles_endpoint),
            ("OHLCV_API_BASE", &ohlcv_api_base),
        ] {
            Url::parse(endpoint)
                .map_err(|e| ChartError::config(format!("{} '{}': {}", name, endpoint, e)))?;
        }

        Ok(Self {
            adapter,
            ohlcv_api_base,
            ttls: CacheTtls {
                registry: secs("REGISTRY_CACHE_TTL_SECS", defaults.ttls.registry),
                candles: secs("CANDLE_CACHE_TTL_SECS", defaults.ttls.candles),
                spot: secs("SPOT_CACHE_TTL_SECS", defaults.ttls.spot),
                response: secs("RESPONSE_CACHE_TTL_SECS", defaults.ttls.response),
            },
            warmer: WarmerConfig {
                enabled: var("WARMER_ENABLED")
                    .map(|v| !matches!(v.to_lowercase().as_str(), "false" | "0" | "no" | "off"))
                    .unwrap_or(defaults.warmer.enabled),
                capacity: var("WARM_LIST_CAPACITY")
                    .and_then(|v| v.parse::<usize>().ok())
                    .unwrap_or(defaults.warmer.capacity),
                retention: secs("WARM_RETENTION_SECS", defaults.warmer.retention),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.ttls.response, Duration::from_secs(30));
        assert_eq!(config.warmer.capacity, 200);
    }

    #[test]
    fn test_overrides() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("SUBGRAPH_BACKEND", "checkpoint"),
            ("CANDLES_ENDPOINT", "http://localhost:3000/graphql"),
            ("AGGREGATOR_ADDRESS", "0xABC"),
            ("RESPONSE_CACHE_TTL_SECS", "45"),
            ("WARM_LIST_CAPACITY", "3"),
            ("WARMER_ENABLED", "false"),
        ]))
        .unwrap();

        assert_eq!(config.adapter.backend, Backend::Checkpoint);
        assert_eq!(config.adapter.candles_endpoint, "http://localhost:3000/graphql");
        assert_eq!(config.adapter.aggregator, "0xabc");
        assert_eq!(config.ttls.response, Duration::from_secs(45));
        assert_eq!(config.warmer.capacity, 3);
        assert!(!config.warmer.enabled);
    }

    #[test]
    fn test_bad_numbers_fall_back() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("SPOT_CACHE_TTL_SECS", "soon"),
            ("WARM_LIST_CAPACITY", "-1"),
        ]))
        .unwrap();
        assert_eq!(config.ttls.spot, Duration::from_secs(120));
        assert_eq!(config.warmer.capacity, 200);
    }

    #[test]
    fn test_malformed_endpoint_is_an_error() {
        let result = ServiceConfig::from_lookup(lookup(&[("REGISTRY_ENDPOINT", "not a url")]));
        assert!(matches!(result, Err(ChartError::Config(_))));
    }

    #[test]
    fn test_unknown_backend_is_an_error() {
        let result = ServiceConfig::from_lookup(lookup(&[("SUBGRAPH_BACKEND", "postgres")]));
        assert!(matches!(result, Err(ChartError::Config(_))));
    }
}
