use crate::x402::PaymentRequirements;
use std::fmt;

/// SDK error covering validation, credentials, payment, and transport failures
#[derive(Debug, Clone)]
pub enum NoLimitError {
    /// A paid endpoint was called without a private key or API key configured
    MissingCredentials(String),
    /// Input rejected before any request was sent
    Validation(String),
    /// Wallet could not sign the payment payload or transaction
    Signing(String),
    /// The x402 payment was rejected or could not be authorized
    Payment {
        message: String,
        /// Requirements from the 402 challenge, when the server sent one
        required: Option<PaymentRequirements>,
    },
    /// Non-402 error status from the server
    Api { status: u16, message: String },
    /// Connection, DNS, or timeout failure before a response arrived
    Network(String),
    /// Mix-specific failure (rejected deposit, failed or timed-out mix)
    Mixer(String),
    /// Response body did not match the expected shape
    InvalidResponse(String),
}

impl NoLimitError {
    /// Canonical error for paid calls with no signing identity
    pub fn missing_credentials() -> Self {
        NoLimitError::MissingCredentials(
            "no private key or API key configured".to_string(),
        )
    }

    pub fn validation(message: impl Into<String>) -> Self {
        NoLimitError::Validation(message.into())
    }

    pub fn payment(message: impl Into<String>) -> Self {
        NoLimitError::Payment {
            message: message.into(),
            required: None,
        }
    }

    pub fn payment_required(message: impl Into<String>, required: PaymentRequirements) -> Self {
        NoLimitError::Payment {
            message: message.into(),
            required: Some(required),
        }
    }

    pub fn api(status: u16, message: impl Into<String>) -> Self {
        NoLimitError::Api {
            status,
            message: message.into(),
        }
    }

    /// HTTP status code when the server produced one
    pub fn status_code(&self) -> Option<u16> {
        match self {
            NoLimitError::Api { status, .. } => Some(*status),
            NoLimitError::Payment { .. } => Some(402),
            _ => None,
        }
    }

    pub fn is_missing_credentials(&self) -> bool {
        matches!(self, NoLimitError::MissingCredentials(_))
    }

    pub fn is_payment(&self) -> bool {
        matches!(self, NoLimitError::Payment { .. })
    }

    /// Check if this is a server error (5xx status code)
    pub fn is_server_error(&self) -> bool {
        self.status_code().map(|c| c >= 500).unwrap_or(false)
    }
}

impl fmt::Display for NoLimitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoLimitError::MissingCredentials(msg) => write!(f, "missing credentials: {}", msg),
            NoLimitError::Validation(msg) => write!(f, "validation failed: {}", msg),
            NoLimitError::Signing(msg) => write!(f, "signing failed: {}", msg),
            NoLimitError::Payment { message, .. } => write!(f, "payment failed: {}", message),
            NoLimitError::Api { status, message } => write!(f, "[HTTP {}] {}", status, message),
            NoLimitError::Network(msg) => write!(f, "network error: {}", msg),
            NoLimitError::Mixer(msg) => write!(f, "mixer error: {}", msg),
            NoLimitError::InvalidResponse(msg) => write!(f, "unexpected response: {}", msg),
        }
    }
}

impl std::error::Error for NoLimitError {}

impl From<reqwest::Error> for NoLimitError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            NoLimitError::Network(format!("request timed out: {}", e))
        } else {
            NoLimitError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for NoLimitError {
    fn from(e: serde_json::Error) -> Self {
        NoLimitError::InvalidResponse(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credentials_message() {
        let err = NoLimitError::missing_credentials();
        assert!(err.is_missing_credentials());
        assert!(err.to_string().contains("no private key or API key"));
    }

    #[test]
    fn test_payment_carries_requirements() {
        let required = PaymentRequirements {
            scheme: "exact".to_string(),
            network: "base".to_string(),
            max_amount_required: "50000".to_string(),
            resource: "https://x402.nolimit.foundation/noLimitLLM".to_string(),
            description: String::new(),
            mime_type: "application/json".to_string(),
            pay_to: "0x0000000000000000000000000000000000000001".to_string(),
            max_timeout_seconds: 300,
            asset: "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913".to_string(),
        };
        let err = NoLimitError::payment_required("payment rejected", required);
        assert!(err.is_payment());
        assert_eq!(err.status_code(), Some(402));
        match err {
            NoLimitError::Payment { required: Some(r), .. } => {
                assert_eq!(r.max_amount_required, "50000");
            }
            _ => panic!("expected payment error with requirements"),
        }
    }

    #[test]
    fn test_api_error_display() {
        let err = NoLimitError::api(500, "internal error");
        assert_eq!(err.to_string(), "[HTTP 500] internal error");
        assert!(err.is_server_error());
    }
}
