//! Transaction broadcast and response classification
//!
//! One submission per call. The node answers either with a quoted txid or
//! with a JSON rejection body; everything else is unclassified.

use crate::client::NodeClient;
use crate::error::WalletError;
use crate::network::StacksNetwork;
use crate::transaction::SignedTransaction;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

/// Reason a node gave for rejecting a transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    ConflictingNonceInMempool,
    BadNonce,
    NotEnoughFunds,
    FeeTooLow,
    /// Any reason this wallet has no dedicated handling for
    Other(String),
}

impl RejectionReason {
    pub fn parse(reason: &str) -> Self {
        match reason {
            "ConflictingNonceInMempool" => RejectionReason::ConflictingNonceInMempool,
            "BadNonce" => RejectionReason::BadNonce,
            "NotEnoughFunds" => RejectionReason::NotEnoughFunds,
            "FeeTooLow" => RejectionReason::FeeTooLow,
            other => RejectionReason::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RejectionReason::ConflictingNonceInMempool => "ConflictingNonceInMempool",
            RejectionReason::BadNonce => "BadNonce",
            RejectionReason::NotEnoughFunds => "NotEnoughFunds",
            RejectionReason::FeeTooLow => "FeeTooLow",
            RejectionReason::Other(reason) => reason,
        }
    }

    /// Fixed user-facing message
    pub fn user_message(&self) -> &'static str {
        match self {
            RejectionReason::ConflictingNonceInMempool => "Nonce conflict, try again soon.",
            RejectionReason::BadNonce => "Incorrect nonce.",
            RejectionReason::NotEnoughFunds => "Not enough funds.",
            RejectionReason::FeeTooLow => "Fee is too low.",
            RejectionReason::Other(_) => GENERIC_FAILURE_MESSAGE,
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong";

/// Accepted submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastOutcome {
    /// `0x`-prefixed transaction id reported by the node
    pub transaction_id: String,
    /// `0x`-prefixed serialized transaction as submitted
    pub raw_hex: String,
}

#[derive(Debug, Deserialize)]
struct RejectionBody {
    error: String,
    reason: String,
    #[serde(default)]
    reason_data: Option<serde_json::Value>,
}

/// Submit a signed transaction once and classify the node's answer.
pub async fn broadcast_transaction<C: NodeClient + ?Sized>(
    client: &C,
    transaction: &SignedTransaction,
    network: &StacksNetwork,
) -> Result<BroadcastOutcome, WalletError> {
    let raw_hex = transaction.to_hex();
    let url = network.broadcast_url();

    let response = client
        .post_transaction(&url, transaction.to_bytes())
        .await
        .map_err(|e| WalletError::BroadcastUnclassified(e.to_string()))?;

    if response.is_success() {
        let txid = response.body.trim().trim_matches('"');
        let txid = txid.strip_prefix("0x").unwrap_or(txid);
        if txid.is_empty() {
            return Err(WalletError::BroadcastUnclassified(
                "empty transaction id".to_string(),
            ));
        }
        let transaction_id = format!("0x{}", txid);
        info!(txid = %transaction_id, "Transaction broadcast");
        return Ok(BroadcastOutcome {
            transaction_id,
            raw_hex,
        });
    }

    match serde_json::from_str::<RejectionBody>(&response.body) {
        Ok(body) => {
            warn!(error = %body.error, reason = %body.reason, "Transaction rejected");
            Err(WalletError::BroadcastRejected {
                error: body.error,
                reason: RejectionReason::parse(&body.reason),
                reason_data: body.reason_data,
            })
        }
        Err(_) => {
            warn!(status = response.status, "Transaction rejected without reason");
            Err(WalletError::BroadcastUnclassified(format!(
                "node returned status {}",
                response.status
            )))
        }
    }
}

/// User-facing message for a failed broadcast
pub fn failure_message(err: &WalletError) -> &'static str {
    err.rejection_reason()
        .map(RejectionReason::user_message)
        .unwrap_or(GENERIC_FAILURE_MESSAGE)
}
