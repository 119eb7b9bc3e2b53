//! Swap client for the noLimit Swap endpoint.
//!
//! The server does the routing and returns prepared calldata; the SDK
//! resolves tokens, converts amounts to base units, pays the service fee
//! through x402, and broadcasts the returned transaction.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::chain::{ChainClient, PreparedTransaction};
use crate::error::NoLimitError;
use crate::format::{is_valid_address, parse_amount};
use crate::tokens::resolve_token;
use crate::wallet::Wallet;
use crate::x402::{Paid, X402Client};

const SWAP_ENDPOINT: &str = "/noLimitSwap";

/// Swap routing fee in USDC, for display
pub const SWAP_PRICE_USDC: f64 = 0.10;

/// Routing plus simulation can be slow
const SWAP_TIMEOUT: Duration = Duration::from_secs(120);

/// Default slippage tolerance in percent
const DEFAULT_SLIPPAGE: f64 = 1.0;

/// Parameters for a quote or swap
#[derive(Debug, Clone, Default)]
pub struct SwapParams {
    /// Source token symbol or contract address
    pub from: String,
    /// Destination token symbol or contract address
    pub to: String,
    /// Amount in human-readable units of the source token
    pub amount: String,
    /// Slippage tolerance percent (default 1)
    pub slippage: Option<f64>,
    /// Recipient override (defaults to the sender)
    pub recipient: Option<String>,
    /// Quote deadline in seconds
    pub deadline: Option<u64>,
}

/// Route quote from the swap endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapQuote {
    #[serde(default)]
    pub from_amount: String,
    pub to_amount: String,
    #[serde(default)]
    pub min_output: String,
    #[serde(default)]
    pub price_impact: f64,
    #[serde(default)]
    pub estimated_gas: String,
    #[serde(default)]
    pub route: Vec<String>,
    #[serde(default)]
    pub valid_until: i64,
}

/// Outcome of an executed swap
#[derive(Debug, Clone)]
pub struct SwapResult {
    /// Hash of the broadcast swap transaction
    pub tx_hash: String,
    /// Input amount in base units
    pub from_amount: String,
    /// Quoted output amount in base units
    pub to_amount: String,
    /// $NL rewards earned, in base units
    pub nl_rewards: String,
    /// Settlement reference when the call went through the payment flow
    pub payment_tx: Option<String>,
    /// Not populated; the SDK returns as soon as the node accepts the tx
    pub gas_used: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SwapRequest {
    chain: String,
    from_token: String,
    to_token: String,
    amount: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_address: Option<String>,
    slippage: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    recipient: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    deadline: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    quote_only: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SwapResponseBody {
    #[serde(default)]
    tx: Option<PreparedTransaction>,
    quote: SwapQuote,
    #[serde(default)]
    nl_earned: Option<String>,
}

/// Client for server-routed token swaps
pub struct SwapClient {
    base_url: String,
    transport: Arc<X402Client>,
    wallet: Option<Arc<Wallet>>,
    chain: Arc<ChainClient>,
    default_timeout: Option<Duration>,
}

impl SwapClient {
    pub(crate) fn new(
        base_url: &str,
        transport: Arc<X402Client>,
        wallet: Option<Arc<Wallet>>,
        chain: Arc<ChainClient>,
        default_timeout: Option<Duration>,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
            wallet,
            chain,
            default_timeout,
        }
    }

    /// Fetch a route quote without preparing or sending a transaction
    pub async fn quote(&self, params: &SwapParams) -> Result<SwapQuote, NoLimitError> {
        let request = self.build_request(params, true)?;
        let url = format!("{}{}", self.base_url, SWAP_ENDPOINT);
        let timeout = self.default_timeout.unwrap_or(SWAP_TIMEOUT);

        let result: Paid<SwapResponseBody> =
            self.transport.post_json(&url, &request, timeout).await?;

        Ok(result.data.quote)
    }

    /// Request routing, pay the service fee, then sign and broadcast the
    /// prepared transaction. Returns once the node accepts it.
    pub async fn execute(&self, params: &SwapParams) -> Result<SwapResult, NoLimitError> {
        let wallet = self.wallet.as_ref().ok_or_else(|| {
            NoLimitError::MissingCredentials(
                "a wallet is required to sign swap transactions".to_string(),
            )
        })?;

        let request = self.build_request(params, false)?;
        let url = format!("{}{}", self.base_url, SWAP_ENDPOINT);
        let timeout = self.default_timeout.unwrap_or(SWAP_TIMEOUT);

        let result: Paid<SwapResponseBody> =
            self.transport.post_json(&url, &request, timeout).await?;

        let tx = result.data.tx.ok_or_else(|| {
            NoLimitError::InvalidResponse("swap response missing prepared transaction".to_string())
        })?;

        log::info!(
            "[Swap] Route ready, quoted output {} (impact {}%)",
            result.data.quote.to_amount,
            result.data.quote.price_impact
        );

        let tx_hash = self.chain.send_prepared(wallet, &tx).await?;

        Ok(SwapResult {
            tx_hash,
            from_amount: request.amount,
            to_amount: result.data.quote.to_amount,
            nl_rewards: result.data.nl_earned.unwrap_or_else(|| "0".to_string()),
            payment_tx: result.payment_tx,
            gas_used: None,
        })
    }

    fn build_request(
        &self,
        params: &SwapParams,
        quote_only: bool,
    ) -> Result<SwapRequest, NoLimitError> {
        let from = resolve_token(&params.from)?;
        let to = resolve_token(&params.to)?;

        if params.amount.trim().starts_with('-') {
            return Err(NoLimitError::validation("amount must be positive"));
        }
        let amount = parse_amount(params.amount.trim(), from.decimals)?;
        if amount == "0" {
            return Err(NoLimitError::validation("amount must be positive"));
        }

        if let Some(recipient) = &params.recipient {
            if !is_valid_address(recipient) {
                return Err(NoLimitError::validation(format!(
                    "invalid recipient address '{}'",
                    recipient
                )));
            }
        }

        Ok(SwapRequest {
            chain: "base".to_string(),
            from_token: from.address,
            to_token: to.address,
            amount,
            user_address: self.wallet.as_ref().map(|w| w.address().to_string()),
            slippage: params.slippage.unwrap_or(DEFAULT_SLIPPAGE),
            recipient: params.recipient.clone(),
            deadline: params.deadline,
            quote_only: if quote_only { Some(true) } else { None },
        })
    }
}
