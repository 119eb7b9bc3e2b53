//! Local signing identity.
//!
//! One wallet signs everything the SDK needs signed: the EIP-191 payment
//! payloads embedded in x402 tokens, and the server-prepared transactions
//! broadcast through [`crate::chain::ChainClient`].

use ethers::core::k256::ecdsa::SigningKey;
use ethers::signers::{LocalWallet, Signer};
use ethers::types::Signature;

use crate::error::NoLimitError;

/// Signing identity derived from a private key
pub struct Wallet {
    inner: LocalWallet,
    address: String,
}

impl Wallet {
    /// Create a wallet from a private key string, with or without `0x` prefix
    pub fn from_private_key(private_key: &str) -> Result<Self, NoLimitError> {
        let key_hex = private_key.strip_prefix("0x").unwrap_or(private_key);

        let key_bytes = hex::decode(key_hex)
            .map_err(|e| NoLimitError::Signing(format!("invalid private key hex: {}", e)))?;
        if key_bytes.len() != 32 {
            return Err(NoLimitError::Signing(format!(
                "private key must be 32 bytes, got {}",
                key_bytes.len()
            )));
        }

        let signing_key = SigningKey::from_bytes(key_bytes.as_slice().into())
            .map_err(|e| NoLimitError::Signing(format!("invalid private key: {}", e)))?;

        let inner = LocalWallet::from(signing_key);
        let address = format!("{:?}", inner.address()).to_lowercase();

        Ok(Self { inner, address })
    }

    /// Lowercase `0x` address of the signing key
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Sign raw bytes as an EIP-191 personal message
    /// ("\x19Ethereum Signed Message:\n" + length prefix, then keccak256)
    pub async fn sign_message(&self, message: &[u8]) -> Result<Signature, NoLimitError> {
        self.inner
            .sign_message(message)
            .await
            .map_err(|e| NoLimitError::Signing(format!("message signing failed: {}", e)))
    }

    /// The underlying ethers wallet, for transaction-signing middleware
    pub fn signer(&self) -> &LocalWallet {
        &self.inner
    }
}
