//! Address and identifier normalization
//!
//! Upstreams disagree on casing and on whether ids carry a
//! `<chainId>-` prefix. Everything leaving the adapter layer goes through
//! these helpers.

/// Strip a leading `<digits>-` chain prefix, if present.
pub fn strip_chain_prefix(id: &str) -> &str {
    match id.split_once('-') {
        Some((prefix, rest))
            if !prefix.is_empty() && prefix.chars().all(|c| c.is_ascii_digit()) =>
        {
            rest
        }
        _ => id,
    }
}

/// Trim, strip any chain prefix, and lowercase.
pub fn normalize_address(id: &str) -> String {
    strip_chain_prefix(id.trim()).to_lowercase()
}

/// Build the chain-prefixed form used by the checkpoint indexer.
pub fn chain_prefixed(chain_id: u64, address: &str) -> String {
    format!("{}-{}", chain_id, normalize_address(address))
}

/// Whether the string looks like a 20-byte hex address.
pub fn is_hex_address(s: &str) -> bool {
    let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) else {
        return false;
    };
    hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit())
}
