//! Base chain transaction broadcast.
//!
//! The swap endpoint prepares calldata server-side; the SDK only signs it
//! and hands it to an RPC node. Nonce and gas are filled by the signer
//! middleware at send time.

use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::Signer;
use ethers::types::{Address, Bytes, TransactionRequest, U256};
use serde::Deserialize;
use std::str::FromStr;

use crate::error::NoLimitError;
use crate::wallet::Wallet;

/// Base mainnet chain ID
pub const BASE_CHAIN_ID: u64 = 8453;

/// Default Base RPC endpoint
pub const DEFAULT_RPC_URL: &str = "https://mainnet.base.org";

/// Calldata prepared by the swap endpoint, ready to sign and send
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparedTransaction {
    pub to: String,
    pub data: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub gas_price: Option<String>,
    #[serde(default)]
    pub gas_limit: Option<String>,
}

/// Thin wrapper over a Base JSON-RPC provider
pub struct ChainClient {
    provider: Provider<Http>,
    rpc_url: String,
}

impl ChainClient {
    pub fn new(rpc_url: &str) -> Result<Self, NoLimitError> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| NoLimitError::Network(format!("invalid RPC URL '{}': {}", rpc_url, e)))?;
        Ok(Self {
            provider,
            rpc_url: rpc_url.to_string(),
        })
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    /// Sign and broadcast a server-prepared transaction.
    ///
    /// Returns the transaction hash as soon as the node accepts it,
    /// without waiting for inclusion.
    pub async fn send_prepared(
        &self,
        wallet: &Wallet,
        tx: &PreparedTransaction,
    ) -> Result<String, NoLimitError> {
        let to = Address::from_str(&tx.to).map_err(|e| {
            NoLimitError::validation(format!("invalid transaction target '{}': {}", tx.to, e))
        })?;
        let data = parse_hex_data(&tx.data)?;
        let value = parse_amount_field(tx.value.as_deref())?;

        let mut request = TransactionRequest::new()
            .to(to)
            .data(data)
            .value(value)
            .chain_id(BASE_CHAIN_ID);

        if let Some(gas_price) = &tx.gas_price {
            request = request.gas_price(parse_amount_field(Some(gas_price))?);
        }
        if let Some(gas_limit) = &tx.gas_limit {
            request = request.gas(parse_amount_field(Some(gas_limit))?);
        }

        let signer = wallet.signer().clone().with_chain_id(BASE_CHAIN_ID);
        let client = SignerMiddleware::new(self.provider.clone(), signer);

        let pending = client
            .send_transaction(request, None)
            .await
            .map_err(|e| NoLimitError::Network(format!("broadcast failed: {}", e)))?;

        let tx_hash = format!("{:?}", *pending);
        log::info!("[Chain] Broadcast transaction {}", tx_hash);

        Ok(tx_hash)
    }
}

fn parse_hex_data(data: &str) -> Result<Bytes, NoLimitError> {
    let hex_str = data.strip_prefix("0x").unwrap_or(data);
    let bytes = hex::decode(hex_str)
        .map_err(|e| NoLimitError::validation(format!("invalid calldata hex: {}", e)))?;
    Ok(Bytes::from(bytes))
}

/// Numeric transaction fields arrive as decimal or 0x-hex strings
/// depending on which path the server prepared them on
fn parse_amount_field(value: Option<&str>) -> Result<U256, NoLimitError> {
    let v = match value {
        Some(v) if !v.is_empty() => v,
        _ => return Ok(U256::zero()),
    };
    if let Some(hex_str) = v.strip_prefix("0x") {
        return U256::from_str_radix(hex_str, 16).map_err(|e| {
            NoLimitError::validation(format!("invalid transaction value '{}': {}", v, e))
        });
    }
    U256::from_dec_str(v)
        .map_err(|e| NoLimitError::validation(format!("invalid transaction value '{}': {}", v, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount_field() {
        assert_eq!(parse_amount_field(None).unwrap(), U256::zero());
        assert_eq!(parse_amount_field(Some("")).unwrap(), U256::zero());
        assert_eq!(parse_amount_field(Some("0")).unwrap(), U256::zero());
        assert_eq!(
            parse_amount_field(Some("1000000")).unwrap(),
            U256::from(1_000_000u64)
        );
        assert_eq!(parse_amount_field(Some("0x0f4240")).unwrap(), U256::from(1_000_000u64));
        assert!(parse_amount_field(Some("1.5")).is_err());
    }

    #[test]
    fn test_parse_hex_data() {
        assert_eq!(
            parse_hex_data("0xdeadbeef").unwrap(),
            Bytes::from(vec![0xde, 0xad, 0xbe, 0xef])
        );
        assert_eq!(
            parse_hex_data("deadbeef").unwrap(),
            Bytes::from(vec![0xde, 0xad, 0xbe, 0xef])
        );
        assert!(parse_hex_data("0xzz").is_err());
    }

    #[test]
    fn test_prepared_transaction_parses_camel_case() {
        let tx: PreparedTransaction = serde_json::from_value(serde_json::json!({
            "to": "0x2626664c2603336E57B271c5C0b26F421741e481",
            "data": "0x04e45aaf",
            "value": "100000000000000000",
            "gasPrice": "15000000",
            "gasLimit": "210000"
        }))
        .unwrap();

        assert_eq!(tx.to, "0x2626664c2603336E57B271c5C0b26F421741e481");
        assert_eq!(tx.value.as_deref(), Some("100000000000000000"));
        assert_eq!(tx.gas_price.as_deref(), Some("15000000"));
        assert_eq!(tx.gas_limit.as_deref(), Some("210000"));
    }

    #[test]
    fn test_prepared_transaction_value_optional() {
        let tx: PreparedTransaction = serde_json::from_value(serde_json::json!({
            "to": "0x2626664c2603336E57B271c5C0b26F421741e481",
            "data": "0x"
        }))
        .unwrap();
        assert!(tx.value.is_none());
    }

    #[tokio::test]
    async fn test_send_prepared_rejects_bad_target() {
        let chain = ChainClient::new(DEFAULT_RPC_URL).unwrap();
        let wallet = Wallet::from_private_key(
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
        )
        .unwrap();

        let tx = PreparedTransaction {
            to: "not an address".to_string(),
            data: "0x".to_string(),
            value: None,
            gas_price: None,
            gas_limit: None,
        };

        let err = chain.send_prepared(&wallet, &tx).await.unwrap_err();
        assert!(matches!(err, NoLimitError::Validation(_)));
    }
}
