//! Built-in token table for Base.
//!
//! The swap and mixer endpoints accept the three tokens below by symbol.
//! Pinning their addresses here prevents callers from passing a wrong
//! address for a common token; anything else must be given as a literal
//! contract address.

use crate::error::NoLimitError;
use crate::format::is_valid_address;

/// Decimals assumed for tokens passed as a literal address (ERC-20 default)
pub const DEFAULT_TOKEN_DECIMALS: u32 = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenInfo {
    pub symbol: &'static str,
    pub name: &'static str,
    pub address: &'static str,
    pub decimals: u32,
}

/// Tokens the noLimit endpoints quote natively
pub static SUPPORTED_TOKENS: [TokenInfo; 3] = [
    TokenInfo {
        symbol: "ETH",
        name: "Ethereum",
        address: "0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee",
        decimals: 18,
    },
    TokenInfo {
        symbol: "USDC",
        name: "USD Coin",
        address: "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913",
        decimals: 6,
    },
    TokenInfo {
        symbol: "USDT",
        name: "Tether USD",
        address: "0xfde4C96c8593536E31F229EA8f37b2ADa2699bb2",
        decimals: 6,
    },
];

/// Look up a built-in token by symbol. Case-insensitive.
pub fn find_token(symbol: &str) -> Option<&'static TokenInfo> {
    SUPPORTED_TOKENS
        .iter()
        .find(|t| t.symbol.eq_ignore_ascii_case(symbol.trim()))
}

/// A token reference resolved to the form the endpoints expect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedToken {
    pub address: String,
    pub decimals: u32,
}

/// Resolve a symbol or literal contract address.
///
/// Known symbols map to their pinned address and decimals. A literal
/// address passes through with [`DEFAULT_TOKEN_DECIMALS`]; anything else
/// is a validation error.
pub fn resolve_token(token: &str) -> Result<ResolvedToken, NoLimitError> {
    let token = token.trim();
    if let Some(info) = find_token(token) {
        return Ok(ResolvedToken {
            address: info.address.to_string(),
            decimals: info.decimals,
        });
    }
    if is_valid_address(token) {
        return Ok(ResolvedToken {
            address: token.to_string(),
            decimals: DEFAULT_TOKEN_DECIMALS,
        });
    }
    Err(NoLimitError::validation(format!(
        "unknown token '{}': use ETH, USDC, USDT, or a 0x contract address",
        token
    )))
}
