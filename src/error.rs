//! Error types for wasm-stacks

use thiserror::Error;
use wasm_bindgen::prelude::*;

use crate::broadcast::RejectionReason;

/// Fixed message for requests no wallet account can authorize.
///
/// Callers branch on this text, so it must not change.
pub const UNAUTHORIZED_MESSAGE: &str =
    "The transaction request provided is not signed by this wallet.";

/// Main error type for wasm-stacks operations
#[derive(Debug, Clone, Error)]
pub enum WalletError {
    /// Malformed hex, Clarity value, post-condition or token segment
    #[error("Decode error: {0}")]
    Decode(String),
    /// `txType` outside contract_call / smart_contract / token_transfer
    #[error("Invalid transaction type: {0}")]
    InvalidTransactionType(String),
    /// Network descriptor with a version that is neither mainnet nor testnet
    #[error("Invalid network version: {0}")]
    InvalidNetworkVersion(String),
    /// Request token signature did not verify
    #[error("Unsigned request: {0}")]
    UnsignedRequest(String),
    /// No wallet account matches the request
    #[error("{}", UNAUTHORIZED_MESSAGE)]
    Unauthorized,
    /// More than one account derives the requesting app key
    #[error("Ambiguous request: accounts {first} and {second} share the app key")]
    AmbiguousAccount { first: u32, second: u32 },
    /// Node rejected the transaction with a structured reason
    #[error("{error} - {reason}")]
    BroadcastRejected {
        error: String,
        reason: RejectionReason,
        reason_data: Option<serde_json::Value>,
    },
    /// Node rejected without a structured reason, or the transport failed
    #[error("Unable to submit transaction: {0}")]
    BroadcastUnclassified(String),
    /// Invalid c32check address or principal
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    /// Invalid private/public key material
    #[error("Invalid key: {0}")]
    InvalidKey(String),
    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// Node query failed (nonce or fee inference)
    #[error("Network error: {0}")]
    Network(String),
}

impl WalletError {
    pub fn decode(msg: impl Into<String>) -> Self {
        WalletError::Decode(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        WalletError::InvalidInput(msg.into())
    }

    /// Rejection reason when the node refused the transaction
    pub fn rejection_reason(&self) -> Option<&RejectionReason> {
        match self {
            WalletError::BroadcastRejected { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

impl From<hex::FromHexError> for WalletError {
    fn from(err: hex::FromHexError) -> Self {
        WalletError::Decode(format!("Invalid hex: {}", err))
    }
}

impl From<serde_json::Error> for WalletError {
    fn from(err: serde_json::Error) -> Self {
        WalletError::Decode(format!("Invalid JSON: {}", err))
    }
}

impl From<bip32::Error> for WalletError {
    fn from(err: bip32::Error) -> Self {
        WalletError::InvalidKey(format!("BIP32 error: {}", err))
    }
}

impl From<k256::ecdsa::Error> for WalletError {
    fn from(err: k256::ecdsa::Error) -> Self {
        WalletError::InvalidKey(format!("ECDSA error: {}", err))
    }
}

impl From<reqwest::Error> for WalletError {
    fn from(err: reqwest::Error) -> Self {
        WalletError::Network(err.to_string())
    }
}

// REQUIRED: Converts to JS Error with stack trace
impl From<WalletError> for JsValue {
    fn from(err: WalletError) -> Self {
        js_sys::Error::new(&err.to_string()).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = WalletError::InvalidTransactionType("coinbase".to_string());
        assert_eq!(err.to_string(), "Invalid transaction type: coinbase");
    }

    #[test]
    fn test_unauthorized_message_is_verbatim() {
        assert_eq!(
            WalletError::Unauthorized.to_string(),
            "The transaction request provided is not signed by this wallet."
        );
    }

    #[test]
    fn test_rejection_display() {
        let err = WalletError::BroadcastRejected {
            error: "transaction rejected".to_string(),
            reason: RejectionReason::BadNonce,
            reason_data: None,
        };
        assert_eq!(err.to_string(), "transaction rejected - BadNonce");
        assert_eq!(err.rejection_reason(), Some(&RejectionReason::BadNonce));
    }

    #[test]
    fn test_from_hex_error() {
        let err: WalletError = hex::decode("zz").unwrap_err().into();
        assert!(matches!(err, WalletError::Decode(_)));
    }
}
