use crate::client::{NodeClient, NodeResponse};
use crate::error::WalletError;
use crate::network::StacksNetwork;
use async_trait::async_trait;
use num_bigint::BigUint;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};

/// In-memory node for tests and offline tooling.
///
/// Submissions are answered from a queue of canned responses and recorded;
/// nonces default to zero for unknown accounts.
#[derive(Default)]
pub struct MockNodeClient {
    responses: RefCell<VecDeque<Result<NodeResponse, WalletError>>>,
    nonces: RefCell<HashMap<String, BigUint>>,
    fee_rate: Cell<u64>,
    posted: RefCell<Vec<(String, Vec<u8>)>>,
}

impl MockNodeClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fee_rate(self, rate: u64) -> Self {
        self.fee_rate.set(rate);
        self
    }

    pub fn set_nonce(&self, address: &str, nonce: u64) {
        self.nonces
            .borrow_mut()
            .insert(address.to_string(), BigUint::from(nonce));
    }

    pub fn push_response(&self, status: u16, body: &str) {
        self.responses.borrow_mut().push_back(Ok(NodeResponse {
            status,
            body: body.to_string(),
        }));
    }

    /// Queue an accepted submission; the node answers with a quoted txid
    pub fn accept(&self, txid: &str) {
        self.push_response(200, &format!("\"{}\"", txid));
    }

    /// Queue a structured rejection
    pub fn reject(&self, error: &str, reason: &str) {
        let body = serde_json::json!({ "error": error, "reason": reason }).to_string();
        self.push_response(400, &body);
    }

    pub fn push_transport_error(&self, message: &str) {
        self.responses
            .borrow_mut()
            .push_back(Err(WalletError::Network(message.to_string())));
    }

    /// Every submission so far, as (url, bytes)
    pub fn posted(&self) -> Vec<(String, Vec<u8>)> {
        self.posted.borrow().clone()
    }
}

#[async_trait(?Send)]
impl NodeClient for MockNodeClient {
    async fn post_transaction(&self, url: &str, bytes: &[u8]) -> Result<NodeResponse, WalletError> {
        self.posted
            .borrow_mut()
            .push((url.to_string(), bytes.to_vec()));
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(WalletError::Network("no response queued".to_string())))
    }

    async fn account_nonce(
        &self,
        _network: &StacksNetwork,
        address: &str,
    ) -> Result<BigUint, WalletError> {
        Ok(self
            .nonces
            .borrow()
            .get(address)
            .cloned()
            .unwrap_or_default())
    }

    async fn fee_rate(&self, _network: &StacksNetwork) -> Result<u64, WalletError> {
        Ok(self.fee_rate.get())
    }
}
