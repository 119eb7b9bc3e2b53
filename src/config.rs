use std::env;
use std::time::Duration;

use crate::chain::DEFAULT_RPC_URL;

/// Hosted noLimit API
pub const DEFAULT_SERVER_URL: &str = "https://x402.nolimit.foundation";

/// SDK configuration. Either credential is optional: a private key pays
/// per call through the payment flow, an API key uses prepaid credit,
/// and with neither the client can only reach free endpoints.
#[derive(Clone)]
pub struct NoLimitConfig {
    /// Hex private key of the paying wallet
    pub private_key: Option<String>,
    /// Prepaid API key, bypasses the payment flow
    pub api_key: Option<String>,
    pub server_url: String,
    /// Base RPC node used to broadcast swap transactions
    pub rpc_url: String,
    /// Overrides the per-endpoint request timeouts when set
    pub timeout: Option<Duration>,
}

impl Default for NoLimitConfig {
    fn default() -> Self {
        Self {
            private_key: None,
            api_key: None,
            server_url: DEFAULT_SERVER_URL.to_string(),
            rpc_url: DEFAULT_RPC_URL.to_string(),
            timeout: None,
        }
    }
}

impl NoLimitConfig {
    pub fn from_env() -> Self {
        Self {
            private_key: env_opt("NOLIMIT_PRIVATE_KEY").or_else(|| env_opt("PRIVATE_KEY")),
            api_key: env_opt("NOLIMIT_API_KEY"),
            server_url: env_opt("NOLIMIT_SERVER_URL")
                .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string()),
            rpc_url: env_opt("NOLIMIT_RPC_URL").unwrap_or_else(|| DEFAULT_RPC_URL.to_string()),
            timeout: None,
        }
    }
}

/// Empty values count as unset
fn env_opt(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_point_at_hosted_service() {
        let config = NoLimitConfig::default();
        assert!(config.private_key.is_none());
        assert!(config.api_key.is_none());
        assert_eq!(config.server_url, "https://x402.nolimit.foundation");
        assert_eq!(config.rpc_url, "https://mainnet.base.org");
    }

    #[test]
    fn test_from_env_ignores_empty_values() {
        unsafe {
            env::set_var("NOLIMIT_PRIVATE_KEY", "");
            env::set_var("NOLIMIT_SERVER_URL", "http://localhost:4021");
        }

        let config = NoLimitConfig::from_env();
        assert!(config.private_key.is_none());
        assert_eq!(config.server_url, "http://localhost:4021");

        unsafe {
            env::remove_var("NOLIMIT_PRIVATE_KEY");
            env::remove_var("NOLIMIT_SERVER_URL");
        }
    }
}
