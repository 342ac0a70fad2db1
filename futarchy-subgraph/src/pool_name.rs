//! Token roles reconstructed from pool display names
//!
//! Indexers that only store token foreign keys still name conditional pools
//! `YES_<BASE> / YES_<QUOTE>` (or the `NO_` equivalent). The name is enough
//! to recover the outcome side and both legs.

use futarchy_core::{OutcomeSide, TokenInfo, TokenRole};

/// Legs recovered from a conditional pool name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPoolName {
    pub side: OutcomeSide,
    pub base: TokenInfo,
    pub quote: TokenInfo,
}

/// Parse `YES_GNO / YES_sDAI`. Both legs must carry the same outcome prefix.
pub fn parse_pool_name(name: &str) -> Option<ParsedPoolName> {
    let (left, right) = name.split_once('/')?;
    let (left, right) = (left.trim(), right.trim());

    let side = outcome_of(left)?;
    if outcome_of(right)? != side {
        return None;
    }
    if left.len() <= side.prefix().len() || right.len() <= side.prefix().len() {
        return None;
    }

    Some(ParsedPoolName {
        side,
        base: TokenInfo {
            symbol: left.to_string(),
            role: TokenRole::for_leg(side, true),
        },
        quote: TokenInfo {
            symbol: right.to_string(),
            role: TokenRole::for_leg(side, false),
        },
    })
}

fn outcome_of(symbol: &str) -> Option<OutcomeSide> {
    let upper = symbol.to_uppercase();
    if upper.starts_with(OutcomeSide::Yes.prefix()) {
        Some(OutcomeSide::Yes)
    } else if upper.starts_with(OutcomeSide::No.prefix()) {
        Some(OutcomeSide::No)
    } else {
        None
    }
}
