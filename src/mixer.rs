//! Mixer client for the noLimit Mixer endpoint.
//!
//! A mix is created server-side and funded by the caller: the server
//! hands back a one-time deposit address, the caller sends the tokens
//! there, and the mixed amount lands at the recipient after the hops
//! complete. Only mix creation goes through the payment flow; status
//! and deposit confirmation are free calls.

use ethers::types::U256;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::NoLimitError;
use crate::format::{format_amount, is_valid_address, parse_amount};
use crate::tokens::resolve_token;
use crate::wallet::Wallet;
use crate::x402::{Paid, X402Client};

const MIXER_ENDPOINT: &str = "/noLimitMixer";
const MIXER_STATUS_ENDPOINT: &str = "/mixer/status";
const MIXER_CONFIRM_ENDPOINT: &str = "/mixer/confirm-deposit";
const MIXER_TIMEOUT: Duration = Duration::from_secs(30);

/// Flat service fee in USDC, for display
pub const MIXER_BASE_FEE_USDC: f64 = 0.075;

/// Percentage fee taken from the mixed amount, for display
pub const MIXER_FEE_PERCENT: f64 = 1.0;

/// Percentage fee in basis points, used for the exact math
const MIXER_FEE_BPS: u64 = 100;

const WAIT_TIMEOUT: Duration = Duration::from_secs(600);
const POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Polling knobs for [`MixerClient::wait_for_completion`]
#[derive(Debug, Clone)]
pub struct WaitOptions {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout: WAIT_TIMEOUT,
            poll_interval: POLL_INTERVAL,
        }
    }
}

/// Parameters for a new mix
#[derive(Debug, Clone, Default)]
pub struct MixParams {
    /// Token symbol or contract address
    pub token: String,
    /// Amount to mix, in human-readable units
    pub amount: String,
    /// Address that receives the mixed funds
    pub recipient: String,
    /// Extra payout delay in minutes
    pub delay: Option<u32>,
    /// Optional note stored with the mix
    pub note: Option<String>,
}

/// A created mix, waiting for its deposit
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MixResult {
    pub mix_id: String,
    /// One-time address the caller funds
    pub deposit_address: String,
    /// Exact amount to send to the deposit address
    pub deposit_amount: String,
    pub fee: String,
    /// Amount the recipient receives after fees
    pub output_amount: String,
    /// Deadline for funding the deposit, as an ISO-8601 timestamp
    pub expires_at: String,
    /// Settlement reference, filled by the SDK from the payment flow
    #[serde(skip)]
    pub payment_tx: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MixStatusKind {
    PendingDeposit,
    Deposited,
    Mixing,
    Completed,
    Failed,
    Expired,
}

/// Progress snapshot for a mix
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MixStatus {
    pub mix_id: String,
    pub status: MixStatusKind,
    /// Percent complete, 0 to 100
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub current_hop: u32,
    #[serde(default)]
    pub total_hops: u32,
    /// ISO-8601 completion timestamp, present once the mix finishes
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub output_tx_hash: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MixRequest {
    token: String,
    amount: String,
    recipient_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_address: Option<String>,
    delay_minutes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfirmRequest<'a> {
    mix_id: &'a str,
    tx_hash: &'a str,
}

/// Splits an amount into (fee, output) at the mixer's percentage fee.
/// Both sides come back in human-readable units of the token.
pub fn calculate_fee(token: &str, amount: &str) -> Result<(String, String), NoLimitError> {
    let token = resolve_token(token)?;
    let units = parse_amount(amount, token.decimals)?;
    let value = U256::from_dec_str(&units)
        .map_err(|e| NoLimitError::validation(format!("invalid amount '{}': {}", amount, e)))?;

    let fee = value * U256::from(MIXER_FEE_BPS) / U256::from(10_000u64);
    let output = value - fee;

    Ok((
        format_amount(&fee.to_string(), token.decimals)?,
        format_amount(&output.to_string(), token.decimals)?,
    ))
}

/// Client for the mixing service
pub struct MixerClient {
    base_url: String,
    transport: Arc<X402Client>,
    wallet: Option<Arc<Wallet>>,
    default_timeout: Option<Duration>,
}

impl MixerClient {
    pub(crate) fn new(
        base_url: &str,
        transport: Arc<X402Client>,
        wallet: Option<Arc<Wallet>>,
        default_timeout: Option<Duration>,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
            wallet,
            default_timeout,
        }
    }

    fn request_timeout(&self) -> Duration {
        self.default_timeout.unwrap_or(MIXER_TIMEOUT)
    }

    /// Fee preview for a mix. Pure math, no server call; also available
    /// as the standalone `calculate_fee` function.
    pub fn calculate_fee(
        &self,
        token: &str,
        amount: &str,
    ) -> Result<(String, String), NoLimitError> {
        calculate_fee(token, amount)
    }

    /// Create a mix and get back the deposit address to fund
    pub async fn create(&self, params: &MixParams) -> Result<MixResult, NoLimitError> {
        if !is_valid_address(&params.recipient) {
            return Err(NoLimitError::validation(format!(
                "invalid recipient address '{}'",
                params.recipient
            )));
        }

        let token = resolve_token(&params.token)?;
        if params.amount.trim().starts_with('-') {
            return Err(NoLimitError::validation("amount must be positive"));
        }
        let base_units = parse_amount(params.amount.trim(), token.decimals)?;
        if base_units == "0" {
            return Err(NoLimitError::validation("amount must be positive"));
        }

        let request = MixRequest {
            token: params.token.trim().to_string(),
            amount: params.amount.trim().to_string(),
            recipient_address: params.recipient.clone(),
            user_address: self.wallet.as_ref().map(|w| w.address().to_string()),
            delay_minutes: params.delay.unwrap_or(0),
            note: params.note.clone(),
        };

        let url = format!("{}{}", self.base_url, MIXER_ENDPOINT);
        let paid: Paid<MixResult> = self
            .transport
            .post_json(&url, &request, self.request_timeout())
            .await?;

        let mut result = paid.data;
        result.payment_tx = paid.payment_tx;

        log::info!(
            "[Mixer] Created mix {}, send {} {} to {}",
            result.mix_id,
            result.deposit_amount,
            request.token,
            result.deposit_address
        );

        Ok(result)
    }

    /// Fetch the current status of a mix
    pub async fn get_status(&self, mix_id: &str) -> Result<MixStatus, NoLimitError> {
        let url = format!("{}{}/{}", self.base_url, MIXER_STATUS_ENDPOINT, mix_id);
        self.transport.get_json(&url, self.request_timeout()).await
    }

    /// Tell the server which transaction funded the deposit address
    pub async fn confirm_deposit(&self, mix_id: &str, tx_hash: &str) -> Result<(), NoLimitError> {
        if !tx_hash.starts_with("0x") || tx_hash.len() != 66 {
            return Err(NoLimitError::validation(format!(
                "invalid transaction hash '{}'",
                tx_hash
            )));
        }

        let request = ConfirmRequest { mix_id, tx_hash };
        let url = format!("{}{}", self.base_url, MIXER_CONFIRM_ENDPOINT);
        let _: Paid<serde_json::Value> = self
            .transport
            .post_json(&url, &request, self.request_timeout())
            .await?;

        Ok(())
    }

    /// Poll until the mix completes. Fails on `failed` or `expired`
    /// status, or once the wait timeout passes (default 10 minutes).
    pub async fn wait_for_completion(
        &self,
        mix_id: &str,
        options: WaitOptions,
    ) -> Result<MixStatus, NoLimitError> {
        let deadline = Instant::now() + options.timeout;

        loop {
            let status = self.get_status(mix_id).await?;
            log::debug!(
                "[Mixer] Mix {} at {}% (hop {}/{})",
                mix_id,
                status.progress,
                status.current_hop,
                status.total_hops
            );

            match status.status {
                MixStatusKind::Completed => return Ok(status),
                MixStatusKind::Failed | MixStatusKind::Expired => {
                    let kind = status.status;
                    let reason = match status.error {
                        Some(error) => error,
                        None => format!("mix {} ended in state {:?}", mix_id, kind),
                    };
                    return Err(NoLimitError::Mixer(reason));
                }
                _ => {}
            }

            // No point sleeping past the deadline
            if Instant::now() + options.poll_interval >= deadline {
                return Err(NoLimitError::Mixer(format!(
                    "timed out waiting for mix {}",
                    mix_id
                )));
            }
            tokio::time::sleep(options.poll_interval).await;
        }
    }
}
