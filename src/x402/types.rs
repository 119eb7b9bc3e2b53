//! x402 protocol data types

use serde::{Deserialize, Serialize};

use crate::error::NoLimitError;

/// Payment payload schema version
pub const X402_VERSION: &str = "1";

/// Network identifier stamped into every payment payload
pub const NETWORK: &str = "base";

/// Request header carrying the signed payment token
pub const X_PAYMENT_HEADER: &str = "X-Payment";

/// Response header carrying the settlement reference for a paid call
pub const X_PAYMENT_RESPONSE_HEADER: &str = "X-Payment-Response";

/// Request header for enterprise keys that bypass the payment flow
pub const X_API_KEY_HEADER: &str = "X-API-Key";

/// Challenge body of a 402 response
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentRequired {
    pub accepts: Vec<PaymentRequirements>,
}

/// One payment option from a 402 challenge
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirements {
    #[serde(default)]
    pub scheme: String,
    #[serde(default)]
    pub network: String,
    pub max_amount_required: String,
    pub resource: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub mime_type: String,
    pub pay_to: String,
    #[serde(default)]
    pub max_timeout_seconds: u64,
    pub asset: String,
}

/// Payment authorization fields.
///
/// Declaration order is the wire order: serde_json emits struct fields in
/// the order written here, and the verifier reconstructs the signed
/// message from exactly these bytes. Do not reorder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentPayload {
    pub version: String,
    pub network: String,
    pub from: String,
    pub to: String,
    pub amount: String,
    pub asset: String,
    pub resource: String,
    /// Unix milliseconds at signing time
    pub timestamp: i64,
}

impl PaymentPayload {
    /// Canonical JSON bytes that get signed
    pub fn signing_bytes(&self) -> Result<Vec<u8>, NoLimitError> {
        serde_json::to_vec(self).map_err(|e| {
            NoLimitError::Signing(format!("failed to serialize payment payload: {}", e))
        })
    }
}

/// Payload plus the signature over its canonical serialization.
///
/// Flat on the wire: the signature rides next to the payload fields, after
/// them, so the verifier can pop it off and re-serialize the rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedPaymentPayload {
    #[serde(flatten)]
    pub payload: PaymentPayload,
    /// 65-byte r+s+v ECDSA signature as 0x hex
    pub signature: String,
}

impl SignedPaymentPayload {
    /// Encode the payment token for the X-Payment header
    pub fn to_base64(&self) -> Result<String, NoLimitError> {
        let json = serde_json::to_string(self).map_err(|e| {
            NoLimitError::Signing(format!("failed to serialize payment token: {}", e))
        })?;
        Ok(base64::Engine::encode(
            &base64::engine::general_purpose::STANDARD,
            json,
        ))
    }

    /// Decode a payment token back into payload and signature
    pub fn from_base64(encoded: &str) -> Result<Self, NoLimitError> {
        let decoded = base64::Engine::decode(&base64::engine::general_purpose::STANDARD, encoded)
            .map_err(|e| {
                NoLimitError::InvalidResponse(format!("invalid payment token base64: {}", e))
            })?;
        let json = String::from_utf8(decoded).map_err(|e| {
            NoLimitError::InvalidResponse(format!("invalid UTF-8 in payment token: {}", e))
        })?;
        serde_json::from_str(&json).map_err(|e| {
            NoLimitError::InvalidResponse(format!("failed to parse payment token: {}", e))
        })
    }
}
