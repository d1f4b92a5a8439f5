//! Wire-level transaction payloads
//!
//! This is the shape an app sends inside a request token (and the shape the
//! UI hands to the builder): arguments and post-conditions may still be
//! hex strings, amounts may be strings. See `normalize` for the typed form.

use crate::error::WalletError;
use crate::network::NetworkDescriptor;
use crate::post_condition::{FungibleConditionCode, NonFungibleConditionCode, PostConditionMode};
use crate::transaction::AnchorMode;
use serde::{Deserialize, Serialize};

pub const TX_TYPE_CONTRACT_CALL: &str = "contract_call";
pub const TX_TYPE_CONTRACT_DEPLOY: &str = "smart_contract";
pub const TX_TYPE_STX_TRANSFER: &str = "token_transfer";

/// Transaction request payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPayload {
    /// Target network, as a tag or a full descriptor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkDescriptor>,
    /// Signer (app) public key, hex encoded compressed SEC1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    /// Account the request is addressed to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stx_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_condition_mode: Option<PostConditionMode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub post_conditions: Vec<PostConditionInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor_mode: Option<AnchorMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_details: Option<AppDetails>,
    #[serde(flatten)]
    pub kind: TransactionKind,
}

/// Kind-specific payload fields, discriminated by `txType`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "txType")]
pub enum TransactionKind {
    #[serde(rename = "contract_call", rename_all = "camelCase")]
    ContractCall {
        contract_address: String,
        contract_name: String,
        function_name: String,
        /// Hex-encoded serialized Clarity values
        #[serde(default)]
        function_args: Vec<String>,
    },
    #[serde(rename = "smart_contract", rename_all = "camelCase")]
    ContractDeploy {
        contract_name: String,
        code_body: String,
    },
    #[serde(rename = "token_transfer", rename_all = "camelCase")]
    StxTransfer {
        recipient: String,
        /// Micro-STX, decimal
        amount: WireAmount,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        memo: Option<String>,
    },
}

impl TransactionKind {
    pub fn tx_type(&self) -> &'static str {
        match self {
            TransactionKind::ContractCall { .. } => TX_TYPE_CONTRACT_CALL,
            TransactionKind::ContractDeploy { .. } => TX_TYPE_CONTRACT_DEPLOY,
            TransactionKind::StxTransfer { .. } => TX_TYPE_STX_TRANSFER,
        }
    }
}

/// Requesting app metadata, shown by the UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppDetails {
    pub name: String,
    #[serde(default)]
    pub icon: String,
}

/// An amount that is either a JSON number or a string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireAmount {
    Number(u64),
    Text(String),
}

/// A post-condition as sent by the app: pre-serialized hex or structured
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PostConditionInput {
    Hex(String),
    Structured(StructuredPostCondition),
}

/// Structured post-condition. String amounts are base-16.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StructuredPostCondition {
    #[serde(rename_all = "camelCase")]
    Stx {
        /// "origin", an address, or `address.contract`
        principal: String,
        condition_code: FungibleConditionCode,
        amount: WireAmount,
    },
    #[serde(rename_all = "camelCase")]
    Fungible {
        principal: String,
        asset: AssetJson,
        condition_code: FungibleConditionCode,
        amount: WireAmount,
    },
    #[serde(rename_all = "camelCase")]
    NonFungible {
        principal: String,
        asset: AssetJson,
        /// Hex-encoded Clarity value identifying the token
        asset_value: String,
        condition_code: NonFungibleConditionCode,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetJson {
    pub contract_address: String,
    pub contract_name: String,
    pub asset_name: String,
}

impl TransactionPayload {
    /// Decode a payload, rejecting unknown `txType` tags by name
    pub fn from_json(value: serde_json::Value) -> Result<Self, WalletError> {
        let tag = value
            .get("txType")
            .ok_or_else(|| WalletError::decode("Missing txType"))?;
        let tag = tag
            .as_str()
            .ok_or_else(|| WalletError::InvalidTransactionType(tag.to_string()))?;

        if ![
            TX_TYPE_CONTRACT_CALL,
            TX_TYPE_CONTRACT_DEPLOY,
            TX_TYPE_STX_TRANSFER,
        ]
        .contains(&tag)
        {
            return Err(WalletError::InvalidTransactionType(tag.to_string()));
        }

        Ok(serde_json::from_value(value)?)
    }

    pub fn from_json_str(json: &str) -> Result<Self, WalletError> {
        Self::from_json(serde_json::from_str(json)?)
    }

    pub fn tx_type(&self) -> &'static str {
        self.kind.tx_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_contract_call() {
        let json = r#"{
            "txType": "contract_call",
            "contractAddress": "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7",
            "contractName": "counter",
            "functionName": "increment",
            "functionArgs": ["0100000000000000000000000000000001"],
            "publicKey": "02aa",
            "network": "testnet",
            "postConditions": [
                "000105",
                { "type": "stx", "principal": "origin", "conditionCode": "lte", "amount": "3e8" }
            ]
        }"#;

        let payload = TransactionPayload::from_json_str(json).unwrap();
        assert_eq!(payload.tx_type(), TX_TYPE_CONTRACT_CALL);
        assert_eq!(payload.post_conditions.len(), 2);
        assert!(matches!(payload.post_conditions[0], PostConditionInput::Hex(_)));
        assert!(matches!(
            payload.post_conditions[1],
            PostConditionInput::Structured(StructuredPostCondition::Stx { .. })
        ));
        match payload.kind {
            TransactionKind::ContractCall { function_args, .. } => {
                assert_eq!(function_args.len(), 1);
            }
            _ => panic!("Expected ContractCall"),
        }
    }

    #[test]
    fn test_deserialize_transfer() {
        let json = r#"{
            "txType": "token_transfer",
            "recipient": "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7",
            "amount": "1000000",
            "memo": "hello"
        }"#;
        let payload = TransactionPayload::from_json_str(json).unwrap();
        match payload.kind {
            TransactionKind::StxTransfer { amount, memo, .. } => {
                assert_eq!(amount, WireAmount::Text("1000000".to_string()));
                assert_eq!(memo.as_deref(), Some("hello"));
            }
            _ => panic!("Expected StxTransfer"),
        }
    }

    #[test]
    fn test_modes_as_wire_bytes_or_names() {
        let json = r#"{
            "txType": "token_transfer",
            "recipient": "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7",
            "amount": 10,
            "postConditionMode": 1,
            "anchorMode": 3
        }"#;
        let payload = TransactionPayload::from_json_str(json).unwrap();
        assert_eq!(payload.post_condition_mode, Some(PostConditionMode::Allow));
        assert_eq!(payload.anchor_mode, Some(AnchorMode::Any));

        let json = r#"{
            "txType": "token_transfer",
            "recipient": "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7",
            "amount": 10,
            "postConditionMode": "deny",
            "anchorMode": "onChainOnly"
        }"#;
        let payload = TransactionPayload::from_json_str(json).unwrap();
        assert_eq!(payload.post_condition_mode, Some(PostConditionMode::Deny));
        assert_eq!(payload.anchor_mode, Some(AnchorMode::OnChainOnly));
    }

    #[test]
    fn test_out_of_range_mode_rejected() {
        let json = r#"{
            "txType": "token_transfer",
            "recipient": "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7",
            "amount": 10,
            "anchorMode": 4
        }"#;
        assert!(matches!(
            TransactionPayload::from_json_str(json),
            Err(WalletError::Decode(_))
        ));
    }

    #[test]
    fn test_unknown_tx_type() {
        let json = r#"{ "txType": "coinbase", "payload": "00" }"#;
        match TransactionPayload::from_json_str(json) {
            Err(WalletError::InvalidTransactionType(tag)) => assert_eq!(tag, "coinbase"),
            other => panic!("Expected InvalidTransactionType, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_tx_type() {
        assert!(matches!(
            TransactionPayload::from_json_str(r#"{ "recipient": "x" }"#),
            Err(WalletError::Decode(_))
        ));
    }

    #[test]
    fn test_serialize_roundtrip_keeps_tag() {
        let payload = TransactionPayload {
            network: None,
            public_key: None,
            stx_address: None,
            post_condition_mode: None,
            post_conditions: Vec::new(),
            anchor_mode: None,
            app_details: None,
            kind: TransactionKind::ContractDeploy {
                contract_name: "hello".to_string(),
                code_body: "(define-public (hi) (ok u1))".to_string(),
            },
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["txType"], "smart_contract");
        assert_eq!(value["codeBody"], "(define-public (hi) (ok u1))");
        assert_eq!(TransactionPayload::from_json(value).unwrap(), payload);
    }
}
