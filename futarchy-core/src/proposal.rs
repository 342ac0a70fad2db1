//! Resolved proposal identities

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::address::normalize_address;
use crate::metadata::{
    parse_blob, parse_optional_i64, parse_optional_string, parse_optional_u32,
    parse_optional_u64,
};

/// Chain assumed when the upstream record does not name one (Gnosis)
pub const DEFAULT_CHAIN_ID: u64 = 100;

/// A market resolved from an external short identifier to internal addresses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalIdentity {
    pub proposal_id: String,

    /// Lowercase address without chain prefix
    pub trading_address: String,

    pub organization_id: Option<String>,

    pub organization_name: Option<String>,

    pub chain_id: u64,

    /// Composite spot-price expression (see the ticker grammar)
    pub ticker_spec: Option<String>,

    pub close_timestamp: Option<i64>,

    pub start_timestamp: Option<i64>,

    pub price_precision: Option<u32>,

    pub rate_provider_address: Option<String>,

    pub stable_symbol: Option<String>,
}

impl ProposalIdentity {
    /// Identity for an input that matched nothing upstream: the input is
    /// taken to be the trading address itself.
    pub fn pass_through(identifier: &str) -> Self {
        let address = normalize_address(identifier);
        Self {
            proposal_id: address.clone(),
            trading_address: address,
            organization_id: None,
            organization_name: None,
            chain_id: DEFAULT_CHAIN_ID,
            ticker_spec: None,
            close_timestamp: None,
            start_timestamp: None,
            price_precision: None,
            rate_provider_address: None,
            stable_symbol: None,
        }
    }

    /// Build an identity from an upstream proposal record and its config blob.
    pub fn from_record(
        proposal_id: &str,
        trading_address: &str,
        organization_id: Option<String>,
        organization_name: Option<String>,
        config: ProposalConfig,
    ) -> Self {
        Self {
            proposal_id: normalize_address(proposal_id),
            trading_address: normalize_address(trading_address),
            organization_id: organization_id.map(|id| normalize_address(&id)),
            organization_name,
            chain_id: config.chain_id.unwrap_or(DEFAULT_CHAIN_ID),
            ticker_spec: config.ticker_spec,
            close_timestamp: config.close_timestamp,
            start_timestamp: config.start_timestamp,
            price_precision: config.price_precision,
            rate_provider_address: config.rate_provider_address,
            stable_symbol: config.stable_symbol,
        }
    }
}

/// Optional fields carried in a proposal's embedded JSON metadata
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProposalConfig {
    pub ticker_spec: Option<String>,
    pub close_timestamp: Option<i64>,
    pub start_timestamp: Option<i64>,
    pub price_precision: Option<u32>,
    pub rate_provider_address: Option<String>,
    pub stable_symbol: Option<String>,
    pub chain_id: Option<u64>,
}

impl ProposalConfig {
    /// Parse the raw metadata string. Each field is extracted on its own;
    /// an unparsable field (or blob) leaves that field `None`.
    pub fn parse(raw: Option<&str>) -> Self {
        Self::from_value(&parse_blob(raw))
    }

    pub fn from_value(blob: &Value) -> Self {
        Self {
            ticker_spec: parse_optional_string(blob, &["chart.spotPrice", "spotPrice", "ticker"]),
            close_timestamp: parse_optional_i64(blob, &["closeTimestamp"]),
            start_timestamp: parse_optional_i64(blob, &["startTimestamp"]),
            price_precision: parse_optional_u32(blob, &["precision", "pricePrecision"]),
            rate_provider_address: parse_optional_string(
                blob,
                &["rateProvider", "rateProviderAddress"],
            )
            .map(|a| normalize_address(&a)),
            stable_symbol: parse_optional_string(
                blob,
                &["stableSymbol", "currencyStableSymbol"],
            ),
            chain_id: parse_optional_u64(blob, &["chain", "chainId"]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_through_identity() {
        let identity = ProposalIdentity::pass_through("100-0xABC");
        assert_eq!(identity.trading_address, "0xabc");
        assert_eq!(identity.proposal_id, "0xabc");
        assert_eq!(identity.chain_id, DEFAULT_CHAIN_ID);
        assert!(identity.ticker_spec.is_none());
    }

    #[test]
    fn test_config_parsing() {
        let raw = r#"{
            "chain": "10",
            "closeTimestamp": 1760000000,
            "startTimestamp": "1750000000",
            "precision": 4,
            "rateProvider": "0x89C80A4540A00b5270347E02e2E144c71da2EceD",
            "currencyStableSymbol": "sDAI",
            "chart": { "spotPrice": "GNO/sDAI-hour-500-xdai" }
        }"#;
        let config = ProposalConfig::parse(Some(raw));
        assert_eq!(config.chain_id, Some(10));
        assert_eq!(config.close_timestamp, Some(1_760_000_000));
        assert_eq!(config.start_timestamp, Some(1_750_000_000));
        assert_eq!(config.price_precision, Some(4));
        assert_eq!(
            config.rate_provider_address.as_deref(),
            Some("0x89c80a4540a00b5270347e02e2e144c71da2eced")
        );
        assert_eq!(config.stable_symbol.as_deref(), Some("sDAI"));
        assert_eq!(config.ticker_spec.as_deref(), Some("GNO/sDAI-hour-500-xdai"));
    }

    #[test]
    fn test_malformed_fields_default_individually() {
        let raw = r#"{ "chain": "gnosis", "closeTimestamp": "soon", "precision": 2 }"#;
        let config = ProposalConfig::parse(Some(raw));
        assert_eq!(config.chain_id, None);
        assert_eq!(config.close_timestamp, None);
        assert_eq!(config.price_precision, Some(2));
    }

    #[test]
    fn test_unparsable_blob_is_empty_config() {
        assert_eq!(ProposalConfig::parse(Some("not json")), ProposalConfig::default());
    }

    #[test]
    fn test_from_record_defaults_chain() {
        let identity = ProposalIdentity::from_record(
            "0xPROP",
            "100-0xTRADE",
            Some("0xORG".to_string()),
            Some("Gnosis DAO".to_string()),
            ProposalConfig::default(),
        );
        assert_eq!(identity.proposal_id, "0xprop");
        assert_eq!(identity.trading_address, "0xtrade");
        assert_eq!(identity.organization_id.as_deref(), Some("0xorg"));
        assert_eq!(identity.chain_id, DEFAULT_CHAIN_ID);
    }
}
