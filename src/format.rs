//! Amount and address formatting helpers.
//!
//! Paid endpoints speak base units (wei for ETH, 6-decimal units for
//! USDC/USDT) as decimal strings. These helpers convert to and from the
//! human-readable form without going through floats.

use crate::error::NoLimitError;
use ethers::types::U256;
use ethers::utils::{format_units, parse_units};

/// Convert a human-readable amount to base units ("1.5" at 18 decimals
/// becomes "1500000000000000000"). Exact, no float rounding.
pub fn parse_amount(amount: &str, decimals: u32) -> Result<String, NoLimitError> {
    let parsed = parse_units(amount, decimals)
        .map_err(|e| NoLimitError::validation(format!("invalid amount '{}': {}", amount, e)))?;
    Ok(parsed.to_string())
}

/// Convert a base-unit amount back to human-readable form, stripping
/// trailing zeros ("1100000" at 6 decimals becomes "1.1").
pub fn format_amount(raw: &str, decimals: u32) -> Result<String, NoLimitError> {
    let value = U256::from_dec_str(raw).map_err(|e| {
        NoLimitError::validation(format!("invalid base-unit amount '{}': {}", raw, e))
    })?;
    let formatted =
        format_units(value, decimals).map_err(|e| NoLimitError::validation(e.to_string()))?;
    Ok(trim_decimal_zeros(&formatted))
}

fn trim_decimal_zeros(s: &str) -> String {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s.to_string()
    }
}

/// Check for the `0x` + 40 hex chars address shape. No checksum validation;
/// the endpoints accept any casing.
pub fn is_valid_address(address: &str) -> bool {
    address.len() == 42
        && address.starts_with("0x")
        && address[2..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Shorten an address for display: `0x742d...aB34` with `chars = 4`.
/// Inputs that are short or not plain ASCII come back unchanged.
pub fn truncate_address(address: &str, chars: usize) -> String {
    if !address.is_ascii() || address.len() <= 2 + chars * 2 {
        return address.to_string();
    }
    format!(
        "{}...{}",
        &address[..2 + chars],
        &address[address.len() - chars..]
    )
}

/// Format a dollar amount with thousands separators: `$1,234.56`.
pub fn format_usd(amount: f64) -> String {
    let cents = format!("{:.2}", amount.abs());
    let (int_part, frac_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));
    let mut grouped = String::new();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{}${}.{}", sign, grouped, frac_part)
}
