//! x402-aware HTTP client

use reqwest::{header, Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::authorizer::PaymentAuthorizer;
use super::types::{
    PaymentRequired, X_API_KEY_HEADER, X_PAYMENT_HEADER, X_PAYMENT_RESPONSE_HEADER,
};
use crate::error::NoLimitError;
use crate::http::shared_client;
use crate::wallet::Wallet;

/// Parsed response body plus the settlement reference, when the call was paid
#[derive(Debug, Clone)]
pub struct Paid<T> {
    pub data: T,
    pub payment_tx: Option<String>,
}

/// Flat error body some endpoints return on failure
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: String,
}

/// HTTP client that handles the x402 payment flow automatically.
///
/// With an API key every request goes out once with X-API-Key and no
/// payment is made. Otherwise the request goes out unpaid first; a 402
/// answer gets authorized and retried exactly once with the X-Payment
/// header.
pub struct X402Client {
    client: Client,
    authorizer: Option<PaymentAuthorizer>,
    api_key: Option<String>,
}

impl X402Client {
    pub fn new(wallet: Option<Arc<Wallet>>, api_key: Option<String>) -> Self {
        let authorizer = wallet.map(PaymentAuthorizer::new);
        if let Some(authorizer) = &authorizer {
            log::info!(
                "[X402] Initialized with wallet address: {}",
                authorizer.address()
            );
        }
        if api_key.is_some() {
            log::info!("[X402] API key configured, payment flow bypassed");
        }
        Self {
            client: shared_client().clone(),
            authorizer,
            api_key,
        }
    }

    /// Payer address, when a wallet is configured
    pub fn wallet_address(&self) -> Option<&str> {
        self.authorizer.as_ref().map(|a| a.address())
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Make a POST request with automatic x402 payment handling.
    /// Returns the final response; the caller parses the body.
    pub async fn post_with_payment<T: Serialize>(
        &self,
        url: &str,
        body: &T,
        timeout: Duration,
    ) -> Result<Response, NoLimitError> {
        if let Some(api_key) = &self.api_key {
            log::info!("[X402] Making request to {} with API key", url);
            let response = self
                .client
                .post(url)
                .header(header::CONTENT_TYPE, "application/json")
                .header(X_API_KEY_HEADER, api_key)
                .json(body)
                .timeout(timeout)
                .send()
                .await?;
            return Ok(response);
        }

        log::info!("[X402] Making request to {}", url);

        // First request without payment
        let initial_response = self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .json(body)
            .timeout(timeout)
            .send()
            .await?;

        if initial_response.status().as_u16() != 402 {
            log::info!(
                "[X402] No payment required, status: {}",
                initial_response.status()
            );
            return Ok(initial_response);
        }

        log::info!("[X402] Received 402 Payment Required");

        let authorizer = self
            .authorizer
            .as_ref()
            .ok_or_else(NoLimitError::missing_credentials)?;

        let challenge: PaymentRequired = initial_response
            .json()
            .await
            .map_err(|e| NoLimitError::InvalidResponse(format!("malformed 402 challenge: {}", e)))?;

        let requirements = challenge
            .accepts
            .first()
            .ok_or_else(|| NoLimitError::payment("402 challenge listed no payment options"))?;

        log::info!(
            "[X402] Payment requirements: {} of {} to {}",
            requirements.max_amount_required,
            requirements.asset,
            requirements.pay_to
        );

        let signed = authorizer.authorize(requirements).await?;
        let token = signed.to_base64()?;

        log::info!("[X402] Signed payment, retrying request with {} header", X_PAYMENT_HEADER);

        // Retry once with payment; a second 402 is surfaced, never re-paid
        let paid_response = self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .header(X_PAYMENT_HEADER, token)
            .json(body)
            .timeout(timeout)
            .send()
            .await?;

        log::info!(
            "[X402] Payment sent, response status: {}",
            paid_response.status()
        );

        Ok(paid_response)
    }

    /// POST and parse the JSON response, attaching the settlement reference
    /// from the X-Payment-Response header when the call was paid.
    pub async fn post_json<B, R>(
        &self,
        url: &str,
        body: &B,
        timeout: Duration,
    ) -> Result<Paid<R>, NoLimitError>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let response = self.post_with_payment(url, body, timeout).await?;

        let payment_tx = response
            .headers()
            .get(X_PAYMENT_RESPONSE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let status = response.status();
        if status.as_u16() == 402 {
            let error_text = response.text().await.unwrap_or_default();
            let required = serde_json::from_str::<PaymentRequired>(&error_text)
                .ok()
                .and_then(|c| c.accepts.into_iter().next());
            return Err(match required {
                Some(req) => NoLimitError::payment_required("payment rejected by server", req),
                None => {
                    NoLimitError::payment(format!("payment rejected by server: {}", error_text))
                }
            });
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            if let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(&error_text) {
                return Err(NoLimitError::api(status.as_u16(), parsed.error));
            }
            return Err(NoLimitError::api(status.as_u16(), error_text));
        }

        let data = response
            .json::<R>()
            .await
            .map_err(|e| NoLimitError::InvalidResponse(format!("failed to parse response: {}", e)))?;

        Ok(Paid { data, payment_tx })
    }

    /// Plain GET for the unpaid endpoints (status polls, stats)
    pub async fn get_json<R: DeserializeOwned>(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<R, NoLimitError> {
        let mut request = self.client.get(url).timeout(timeout);
        if let Some(api_key) = &self.api_key {
            request = request.header(X_API_KEY_HEADER, api_key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            if let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(&error_text) {
                return Err(NoLimitError::api(status.as_u16(), parsed.error));
            }
            return Err(NoLimitError::api(status.as_u16(), error_text));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| NoLimitError::InvalidResponse(format!("failed to parse response: {}", e)))
    }
}
