//! Top-level client tying the service clients together.

use std::sync::Arc;
use std::time::Duration;

use crate::chain::ChainClient;
use crate::chat::ChatClient;
use crate::config::NoLimitConfig;
use crate::error::NoLimitError;
use crate::mixer::MixerClient;
use crate::swap::SwapClient;
use crate::wallet::Wallet;
use crate::x402::X402Client;

const STATS_ENDPOINT: &str = "/api/stats";
const STATS_TIMEOUT: Duration = Duration::from_secs(30);

/// Entry point for the SDK.
///
/// Build one with a private key for pay-per-call usage, with an API key
/// for prepaid usage, or with neither to reach only free endpoints. The
/// service clients hang off it and share one transport.
pub struct NoLimitClient {
    server_url: String,
    wallet: Option<Arc<Wallet>>,
    transport: Arc<X402Client>,
    timeout: Option<Duration>,
    chat: ChatClient,
    swap: SwapClient,
    mixer: MixerClient,
}

impl NoLimitClient {
    pub fn new(config: NoLimitConfig) -> Result<Self, NoLimitError> {
        let server_url = config.server_url.trim_end_matches('/').to_string();

        let wallet = match &config.private_key {
            Some(key) => Some(Arc::new(Wallet::from_private_key(key)?)),
            None => None,
        };

        let transport = Arc::new(X402Client::new(wallet.clone(), config.api_key.clone()));
        let chain = Arc::new(ChainClient::new(&config.rpc_url)?);

        let chat = ChatClient::new(&server_url, Arc::clone(&transport), config.timeout);
        let swap = SwapClient::new(
            &server_url,
            Arc::clone(&transport),
            wallet.clone(),
            Arc::clone(&chain),
            config.timeout,
        );
        let mixer = MixerClient::new(
            &server_url,
            Arc::clone(&transport),
            wallet.clone(),
            config.timeout,
        );

        Ok(Self {
            server_url,
            wallet,
            transport,
            timeout: config.timeout,
            chat,
            swap,
            mixer,
        })
    }

    /// Pay-per-call client against the hosted service
    pub fn with_private_key(private_key: &str) -> Result<Self, NoLimitError> {
        Self::new(NoLimitConfig {
            private_key: Some(private_key.to_string()),
            ..Default::default()
        })
    }

    /// Prepaid client against the hosted service
    pub fn with_api_key(api_key: &str) -> Result<Self, NoLimitError> {
        Self::new(NoLimitConfig {
            api_key: Some(api_key.to_string()),
            ..Default::default()
        })
    }

    pub fn chat(&self) -> &ChatClient {
        &self.chat
    }

    pub fn swap(&self) -> &SwapClient {
        &self.swap
    }

    pub fn mixer(&self) -> &MixerClient {
        &self.mixer
    }

    /// Address of the paying wallet, when one is configured
    pub fn address(&self) -> Option<&str> {
        self.wallet.as_ref().map(|w| w.address())
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Service statistics as reported by the server. The shape is
    /// server-defined, so it comes back as raw JSON.
    pub async fn stats(&self) -> Result<serde_json::Value, NoLimitError> {
        let url = format!("{}{}", self.server_url, STATS_ENDPOINT);
        let timeout = self.timeout.unwrap_or(STATS_TIMEOUT);
        self.transport.get_json(&url, timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // Hardhat account #0
    const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_private_key_client_derives_address() {
        let client = NoLimitClient::with_private_key(TEST_KEY).unwrap();
        assert_eq!(
            client.address(),
            Some("0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266")
        );
        assert_eq!(client.server_url(), "https://x402.nolimit.foundation");
    }

    #[test]
    fn test_client_without_credentials_has_no_address() {
        let client = NoLimitClient::new(NoLimitConfig::default()).unwrap();
        assert!(client.address().is_none());
    }

    #[test]
    fn test_invalid_private_key_rejected() {
        // Matched on the Result directly; the client itself is not Debug
        assert!(matches!(
            NoLimitClient::with_private_key("0xnot-hex"),
            Err(NoLimitError::Signing(_))
        ));
    }

    #[tokio::test]
    async fn test_stats_fetches_server_json() {
        let mut server = mockito::Server::new_async().await;

        server
            .mock("GET", "/api/stats")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "totalRequests": 18234,
                    "activeMixes": 7
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = NoLimitClient::new(NoLimitConfig {
            server_url: server.url(),
            ..Default::default()
        })
        .unwrap();

        let stats = client.stats().await.unwrap();
        assert_eq!(stats["totalRequests"], 18234);
        assert_eq!(stats["activeMixes"], 7);
    }
}
