//! Rust SDK for the noLimit Base services: pay-per-call AI chat, token
//! swaps, and mixing on Base. Paid endpoints settle over HTTP 402 with
//! payment tokens signed by a local wallet, or skip payment entirely
//! with a prepaid API key.

mod chain;
mod chat;
mod client;
mod config;
mod error;
mod format;
mod http;
mod mixer;
mod swap;
mod tokens;
mod wallet;
mod x402;

pub use chain::{BASE_CHAIN_ID, ChainClient, DEFAULT_RPC_URL, PreparedTransaction};
pub use chat::{
    CHAT_PRICE_USDC, ChatClient, ChatMessage, ChatOptions, ChatResponse, StreamChunk, TokenUsage,
};
pub use client::NoLimitClient;
pub use config::{DEFAULT_SERVER_URL, NoLimitConfig};
pub use error::NoLimitError;
pub use format::{format_amount, format_usd, is_valid_address, parse_amount, truncate_address};
pub use mixer::{
    MIXER_BASE_FEE_USDC, MIXER_FEE_PERCENT, MixParams, MixResult, MixStatus, MixStatusKind,
    MixerClient, WaitOptions, calculate_fee,
};
pub use swap::{SWAP_PRICE_USDC, SwapClient, SwapParams, SwapQuote, SwapResult};
pub use tokens::{
    DEFAULT_TOKEN_DECIMALS, ResolvedToken, SUPPORTED_TOKENS, TokenInfo, find_token, resolve_token,
};
pub use wallet::Wallet;
pub use x402::{
    Paid, PaymentAuthorizer, PaymentPayload, PaymentRequired, PaymentRequirements,
    SignedPaymentPayload, X402Client,
};
