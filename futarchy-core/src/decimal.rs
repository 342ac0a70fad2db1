//! Decimal string helpers
//!
//! All decimal text leaving the adapters is canonicalized through
//! `rust_decimal`, so two backends that encode the same number differently
//! (`"1.50"` vs raw `1500000000000000000`) emit the same string.

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::{ChartError, ChartResult};

/// Fixed-point precision of raw token amounts emitted by the indexers
pub const TOKEN_DECIMALS: u32 = 18;

/// Canonical text form of a decimal: no trailing zeros, no exponent.
pub fn canonical_decimal(input: &str) -> ChartResult<String> {
    let trimmed = input.trim();
    let value = Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|e| ChartError::parse(format!("Invalid decimal '{}': {}", input, e)))?;
    Ok(value.normalize().to_string())
}

/// Rescale a raw fixed-point integer string to a canonical decimal string.
pub fn scale_fixed_point(raw: &str, decimals: u32) -> ChartResult<String> {
    let raw = raw.trim();
    let units: i128 = raw
        .parse()
        .map_err(|e| ChartError::parse(format!("Invalid integer amount '{}': {}", raw, e)))?;
    let value = Decimal::try_from_i128_with_scale(units, decimals)
        .map_err(|e| ChartError::parse(format!("Amount '{}' out of range: {}", raw, e)))?;
    Ok(value.normalize().to_string())
}
