//! EIP-191 payment authorization for 402 challenges

use chrono::Utc;
use std::sync::Arc;

use super::types::{
    NETWORK, PaymentPayload, PaymentRequirements, SignedPaymentPayload, X402_VERSION,
};
use crate::error::NoLimitError;
use crate::wallet::Wallet;

/// Builds signed payment payloads from 402 challenge terms
pub struct PaymentAuthorizer {
    wallet: Arc<Wallet>,
}

impl PaymentAuthorizer {
    pub fn new(wallet: Arc<Wallet>) -> Self {
        Self { wallet }
    }

    /// Payer address
    pub fn address(&self) -> &str {
        self.wallet.address()
    }

    /// Authorize one payment option from a 402 challenge.
    ///
    /// The server's terms (payTo, maxAmountRequired, asset, resource) are
    /// copied into the payload verbatim, stamped with the current time,
    /// and signed as an EIP-191 personal message over the payload's
    /// canonical JSON. The fresh timestamp makes every authorization,
    /// and therefore every signature, distinct.
    pub async fn authorize(
        &self,
        requirements: &PaymentRequirements,
    ) -> Result<SignedPaymentPayload, NoLimitError> {
        let payload = PaymentPayload {
            version: X402_VERSION.to_string(),
            network: NETWORK.to_string(),
            from: self.wallet.address().to_string(),
            to: requirements.pay_to.clone(),
            amount: requirements.max_amount_required.clone(),
            asset: requirements.asset.clone(),
            resource: requirements.resource.clone(),
            timestamp: Utc::now().timestamp_millis(),
        };

        let message = payload.signing_bytes()?;
        let signature = self.wallet.sign_message(&message).await?;

        log::debug!(
            "[X402] Authorized payment of {} {} to {}",
            payload.amount,
            payload.asset,
            payload.to
        );

        Ok(SignedPaymentPayload {
            payload,
            signature: format!("0x{}", hex::encode(signature.to_vec())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::types::{Address, Signature};
    use std::str::FromStr;
    use std::time::Duration;

    // Hardhat account #0
    const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const TEST_ADDRESS: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

    fn test_authorizer() -> PaymentAuthorizer {
        let wallet = Wallet::from_private_key(TEST_KEY).unwrap();
        PaymentAuthorizer::new(Arc::new(wallet))
    }

    fn chat_requirements() -> PaymentRequirements {
        PaymentRequirements {
            scheme: "exact".to_string(),
            network: "base".to_string(),
            max_amount_required: "50000".to_string(),
            resource: "https://x402.nolimit.foundation/noLimitLLM".to_string(),
            description: "noLimit LLM chat".to_string(),
            mime_type: "application/json".to_string(),
            pay_to: "0x209693Bc6afc0C5328bA36FaF03C514EF312287C".to_string(),
            max_timeout_seconds: 300,
            asset: "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913".to_string(),
        }
    }

    #[tokio::test]
    async fn test_authorize_copies_challenge_terms_verbatim() {
        let requirements = chat_requirements();
        let signed = test_authorizer().authorize(&requirements).await.unwrap();

        assert_eq!(signed.payload.version, "1");
        assert_eq!(signed.payload.network, "base");
        assert_eq!(signed.payload.from, TEST_ADDRESS);
        assert_eq!(signed.payload.to, requirements.pay_to);
        assert_eq!(signed.payload.amount, requirements.max_amount_required);
        assert_eq!(signed.payload.asset, requirements.asset);
        assert_eq!(signed.payload.resource, requirements.resource);
        assert!(signed.payload.timestamp > 0);
    }

    #[tokio::test]
    async fn test_signature_recovers_payer_over_canonical_bytes() {
        let signed = test_authorizer()
            .authorize(&chat_requirements())
            .await
            .unwrap();

        let message = signed.payload.signing_bytes().unwrap();
        let signature = Signature::from_str(&signed.signature).unwrap();
        let payer = Address::from_str(TEST_ADDRESS).unwrap();
        signature.verify(message, payer).unwrap();
    }

    #[tokio::test]
    async fn test_distinct_timestamps_give_distinct_signatures() {
        let authorizer = test_authorizer();
        let requirements = chat_requirements();

        let first = authorizer.authorize(&requirements).await.unwrap();
        tokio::time::sleep(Duration::from_millis(25)).await;
        let second = authorizer.authorize(&requirements).await.unwrap();

        assert_ne!(first.payload.timestamp, second.payload.timestamp);
        assert_ne!(first.signature, second.signature);
    }

    #[tokio::test]
    async fn test_token_decodes_to_what_was_signed() {
        let signed = test_authorizer()
            .authorize(&chat_requirements())
            .await
            .unwrap();

        let token = signed.to_base64().unwrap();
        let decoded = SignedPaymentPayload::from_base64(&token).unwrap();
        assert_eq!(decoded, signed);

        // The decoded payload re-serializes to the exact signed message
        let message = decoded.payload.signing_bytes().unwrap();
        let signature = Signature::from_str(&decoded.signature).unwrap();
        signature
            .verify(message, Address::from_str(TEST_ADDRESS).unwrap())
            .unwrap();
    }

    #[tokio::test]
    async fn test_signature_encoding_is_65_byte_hex() {
        let signed = test_authorizer()
            .authorize(&chat_requirements())
            .await
            .unwrap();

        let hex_part = signed.signature.strip_prefix("0x").unwrap();
        assert_eq!(hex_part.len(), 130, "expected r+s+v as 65 hex-encoded bytes");
        assert!(hex::decode(hex_part).is_ok());
    }
}
