//! Stacks node API client
//!
//! `NodeClient` is the only place the core performs I/O. `HttpNodeClient`
//! talks to a node's v2 API over `reqwest` (browser `fetch` on wasm32);
//! tests substitute canned implementations.

use crate::error::WalletError;
use crate::network::StacksNetwork;
use async_trait::async_trait;
use num_bigint::BigUint;
use serde::Deserialize;

/// Raw response to a transaction submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeResponse {
    pub status: u16,
    pub body: String,
}

impl NodeResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait(?Send)]
pub trait NodeClient {
    /// POST raw transaction bytes. Transport failures are errors; HTTP
    /// rejections come back as a non-success `NodeResponse`.
    async fn post_transaction(&self, url: &str, bytes: &[u8]) -> Result<NodeResponse, WalletError>;

    /// Next nonce the node expects from `address`
    async fn account_nonce(
        &self,
        network: &StacksNetwork,
        address: &str,
    ) -> Result<BigUint, WalletError>;

    /// Fee rate in micro-STX per byte
    async fn fee_rate(&self, network: &StacksNetwork) -> Result<u64, WalletError>;
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    nonce: u64,
}

pub struct HttpNodeClient {
    client: reqwest::Client,
}

impl HttpNodeClient {
    pub fn new() -> Self {
        HttpNodeClient {
            client: reqwest::Client::new(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, WalletError> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(WalletError::Network(format!(
                "GET {} failed {}: {}",
                url, status, error_text
            )));
        }

        Ok(response.json().await?)
    }
}

impl Default for HttpNodeClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl NodeClient for HttpNodeClient {
    async fn post_transaction(&self, url: &str, bytes: &[u8]) -> Result<NodeResponse, WalletError> {
        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/octet-stream")
            .body(bytes.to_vec())
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(NodeResponse { status, body })
    }

    async fn account_nonce(
        &self,
        network: &StacksNetwork,
        address: &str,
    ) -> Result<BigUint, WalletError> {
        let account: AccountResponse = self.get_json(&network.account_url(address)).await?;
        Ok(BigUint::from(account.nonce))
    }

    async fn fee_rate(&self, network: &StacksNetwork) -> Result<u64, WalletError> {
        self.get_json(&network.fee_estimate_url()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_success_range() {
        let ok = NodeResponse {
            status: 200,
            body: "\"abc\"".to_string(),
        };
        let rejected = NodeResponse {
            status: 400,
            body: String::new(),
        };
        assert!(ok.is_success());
        assert!(!rejected.is_success());
    }

    #[test]
    fn test_account_response_ignores_extra_fields() {
        let account: AccountResponse =
            serde_json::from_str(r#"{ "balance": "0x00", "nonce": 12, "balance_proof": "" }"#)
                .unwrap();
        assert_eq!(account.nonce, 12);
    }
}
