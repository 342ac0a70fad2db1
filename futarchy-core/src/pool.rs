//! Normalized trading pools

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Outcome side a conditional pool trades
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OutcomeSide {
    Yes,
    No,
}

impl OutcomeSide {
    /// Token symbol prefix used by conditional tokens (`YES_GNO`)
    pub fn prefix(&self) -> &'static str {
        match self {
            OutcomeSide::Yes => "YES_",
            OutcomeSide::No => "NO_",
        }
    }
}

impl FromStr for OutcomeSide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "YES" => Ok(OutcomeSide::Yes),
            "NO" => Ok(OutcomeSide::No),
            _ => Err(format!("Unknown outcome side: {}", s)),
        }
    }
}

impl fmt::Display for OutcomeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeSide::Yes => write!(f, "YES"),
            OutcomeSide::No => write!(f, "NO"),
        }
    }
}

/// Pool category as labelled by the indexers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PoolKind {
    Conditional,
    Prediction,
    ExpectedValue,
    Other,
}

impl PoolKind {
    /// Lenient parse; unknown labels map to `Other`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_uppercase().replace(['-', ' '], "_").as_str() {
            "CONDITIONAL" => PoolKind::Conditional,
            "PREDICTION" => PoolKind::Prediction,
            "EXPECTED_VALUE" => PoolKind::ExpectedValue,
            _ => PoolKind::Other,
        }
    }
}

/// Economic role of a token within a proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenRole {
    YesCompany,
    YesCurrency,
    NoCompany,
    NoCurrency,
    Company,
    Currency,
    Unknown,
}

impl TokenRole {
    /// Lenient parse; unknown labels map to `Unknown`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "YES_COMPANY" => TokenRole::YesCompany,
            "YES_CURRENCY" => TokenRole::YesCurrency,
            "NO_COMPANY" => TokenRole::NoCompany,
            "NO_CURRENCY" => TokenRole::NoCurrency,
            "COMPANY" => TokenRole::Company,
            "CURRENCY" => TokenRole::Currency,
            _ => TokenRole::Unknown,
        }
    }

    /// Role of the base (company) or quote (currency) leg on an outcome side
    pub fn for_leg(side: OutcomeSide, is_base: bool) -> Self {
        match (side, is_base) {
            (OutcomeSide::Yes, true) => TokenRole::YesCompany,
            (OutcomeSide::Yes, false) => TokenRole::YesCurrency,
            (OutcomeSide::No, true) => TokenRole::NoCompany,
            (OutcomeSide::No, false) => TokenRole::NoCurrency,
        }
    }
}

/// Symbol and role of one pool leg
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub symbol: String,
    pub role: TokenRole,
}

/// One trading venue for one outcome side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pool {
    /// Plain lowercase address, never chain-prefixed
    pub id: String,

    pub name: String,

    pub kind: PoolKind,

    pub outcome_side: Option<OutcomeSide>,

    /// Current price as a canonical decimal string
    pub price: String,

    /// Human-scaled decimal string
    pub volume_base: String,

    /// Human-scaled decimal string
    pub volume_quote: String,

    pub base_token: Option<TokenInfo>,

    pub quote_token: Option<TokenInfo>,
}

impl Pool {
    pub fn is_conditional(&self) -> bool {
        self.kind == PoolKind::Conditional
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_side_parse() {
        assert_eq!("yes".parse::<OutcomeSide>().unwrap(), OutcomeSide::Yes);
        assert_eq!(" NO ".parse::<OutcomeSide>().unwrap(), OutcomeSide::No);
        assert!("maybe".parse::<OutcomeSide>().is_err());
    }

    #[test]
    fn test_pool_kind_parse() {
        assert_eq!(PoolKind::parse("conditional"), PoolKind::Conditional);
        assert_eq!(PoolKind::parse("expected-value"), PoolKind::ExpectedValue);
        assert_eq!(PoolKind::parse("weird"), PoolKind::Other);
    }

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&TokenRole::YesCompany).unwrap();
        assert_eq!(json, "\"YES_COMPANY\"");
        assert_eq!(TokenRole::parse("no_currency"), TokenRole::NoCurrency);
    }
}
