//! Wallet configuration

use crate::error::WalletError;
use crate::network::{StacksNetwork, TransactionVersion};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAINNET_API_URL: &str = "https://stacks-node-api.mainnet.stacks.co";
pub const DEFAULT_TESTNET_API_URL: &str = "https://stacks-node-api.testnet.stacks.co";

/// Host-supplied configuration. Every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletConfig {
    /// Core API of the default mainnet network
    #[serde(default = "default_mainnet_api_url")]
    pub mainnet_api_url: String,
    /// Core API of the default testnet network
    #[serde(default = "default_testnet_api_url")]
    pub testnet_api_url: String,
}

fn default_mainnet_api_url() -> String {
    DEFAULT_MAINNET_API_URL.to_string()
}

fn default_testnet_api_url() -> String {
    DEFAULT_TESTNET_API_URL.to_string()
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            mainnet_api_url: default_mainnet_api_url(),
            testnet_api_url: default_testnet_api_url(),
        }
    }
}

impl WalletConfig {
    pub fn from_json(json: &str) -> Result<Self, WalletError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Default network for a transaction version
    pub fn default_network(&self, version: TransactionVersion) -> StacksNetwork {
        match version {
            TransactionVersion::Mainnet => StacksNetwork::new(version, &self.mainnet_api_url),
            TransactionVersion::Testnet => StacksNetwork::new(version, &self.testnet_api_url),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = WalletConfig::from_json(r#"{ "testnetApiUrl": "http://localhost:3999" }"#)
            .unwrap();
        assert_eq!(config.mainnet_api_url, DEFAULT_MAINNET_API_URL);
        assert_eq!(
            config.default_network(TransactionVersion::Testnet).broadcast_url(),
            "http://localhost:3999/v2/transactions"
        );
    }

    #[test]
    fn test_empty_config() {
        assert_eq!(WalletConfig::from_json("{}").unwrap(), WalletConfig::default());
    }
}
