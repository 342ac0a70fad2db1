//! Shared pool normalization
//!
//! Each backend decodes its own wire shape, then funnels the pieces through
//! [`PoolParts::into_pool`] so both emit byte-identical [`Pool`] values.

use futarchy_core::address::normalize_address;
use futarchy_core::decimal::canonical_decimal;
use futarchy_core::{OutcomeSide, Pool, PoolKind, TokenInfo, TokenRole};
use tracing::warn;

use crate::pool_name::parse_pool_name;

/// Backend-neutral pool fields, volumes already human-scaled
#[derive(Debug, Clone)]
pub(crate) struct PoolParts {
    pub id: String,
    pub name: String,
    pub kind: Option<String>,
    pub outcome_side: Option<String>,
    pub price: Option<String>,
    pub volume_base: String,
    pub volume_quote: String,
    /// (base, quote) when the backend supplies token objects
    pub tokens: Option<(TokenInfo, TokenInfo)>,
}

impl PoolParts {
    pub fn into_pool(self) -> Pool {
        let parsed = parse_pool_name(&self.name);

        let outcome_side = self
            .outcome_side
            .as_deref()
            .and_then(|s| s.parse::<OutcomeSide>().ok())
            .or_else(|| parsed.as_ref().map(|p| p.side));

        let kind = match self.kind.as_deref() {
            Some(label) => PoolKind::parse(label),
            None if parsed.is_some() => PoolKind::Conditional,
            None => PoolKind::Other,
        };

        let (base_token, quote_token) = match (self.tokens, parsed) {
            (Some((base, quote)), _) => (Some(base), Some(quote)),
            (None, Some(p)) => (Some(p.base), Some(p.quote)),
            (None, None) => (None, None),
        };

        Pool {
            id: normalize_address(&self.id),
            name: self.name,
            kind,
            outcome_side,
            price: canonical_or_zero(self.price.as_deref().unwrap_or("0"), "price"),
            volume_base: self.volume_base,
            volume_quote: self.volume_quote,
            base_token,
            quote_token,
        }
    }
}

/// Canonical decimal text, or `"0"` for malformed upstream values.
pub(crate) fn canonical_or_zero(raw: &str, field: &str) -> String {
    canonical_decimal(raw).unwrap_or_else(|e| {
        warn!("Malformed {} '{}': {}", field, raw, e);
        "0".to_string()
    })
}

/// Whether a role belongs to the company (base) leg.
pub(crate) fn is_company(role: TokenRole) -> bool {
    matches!(
        role,
        TokenRole::YesCompany | TokenRole::NoCompany | TokenRole::Company
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(name: &str) -> PoolParts {
        PoolParts {
            id: "100-0xABC".to_string(),
            name: name.to_string(),
            kind: None,
            outcome_side: None,
            price: Some("0.500".to_string()),
            volume_base: "1".to_string(),
            volume_quote: "2".to_string(),
            tokens: None,
        }
    }

    #[test]
    fn test_name_fills_missing_fields() {
        let pool = parts("NO_GNO / NO_sDAI").into_pool();
        assert_eq!(pool.id, "0xabc");
        assert_eq!(pool.kind, PoolKind::Conditional);
        assert_eq!(pool.outcome_side, Some(OutcomeSide::No));
        assert_eq!(pool.price, "0.5");
        assert_eq!(pool.base_token.unwrap().role, TokenRole::NoCompany);
    }

    #[test]
    fn test_plain_pool_has_no_tokens() {
        let pool = parts("GNO / sDAI").into_pool();
        assert_eq!(pool.kind, PoolKind::Other);
        assert!(pool.outcome_side.is_none());
        assert!(pool.base_token.is_none());
    }

    #[test]
    fn test_malformed_price_is_zero() {
        let mut p = parts("YES_A / YES_B");
        p.price = Some("NaN-ish".to_string());
        assert_eq!(p.into_pool().price, "0");
    }
}
