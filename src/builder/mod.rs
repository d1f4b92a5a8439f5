//! Transaction building from payloads
//!
//! buildTransaction(payload, key, nonce?): normalize the payload, resolve
//! the network, infer nonce and fee from the node when not given, then
//! construct and sign. Signing is part of construction; there is no
//! separate unsigned result.

pub mod calls;
pub mod types;

use crate::address::StacksAddress;
use crate::client::NodeClient;
use crate::config::WalletConfig;
use crate::error::WalletError;
use crate::network::{NetworkDescriptor, StacksNetwork, TransactionVersion};
use crate::normalize::{normalize_payload, NormalizedPayload};
use crate::payload::TransactionPayload;
use crate::post_condition::amount_to_u64;
use crate::transaction::{SignedTransaction, SpendingCondition, StacksTransaction};
use k256::ecdsa::SigningKey;
use num_bigint::BigUint;
use tracing::debug;
use types::TxOptions;

/// Pick the network a payload is built for.
///
/// A descriptor that can estimate fees is used as given. A bare tag, or a
/// descriptor without a fee-estimate endpoint, is replaced by the configured
/// default network for its version. Without any descriptor, mainnet.
pub fn resolve_network(
    descriptor: Option<&NetworkDescriptor>,
    config: &WalletConfig,
) -> Result<StacksNetwork, WalletError> {
    match descriptor {
        Some(descriptor) if descriptor.has_fee_estimate() => {
            StacksNetwork::from_descriptor(descriptor)
        }
        Some(descriptor) => {
            let version = descriptor.transaction_version()?;
            debug!(?version, "Substituting default network");
            Ok(config.default_network(version))
        }
        None => Ok(config.default_network(TransactionVersion::Mainnet)),
    }
}

/// Build and sign a transaction, inferring the nonce when `nonce` is `None`
pub async fn build_transaction<C: NodeClient + ?Sized>(
    payload: &TransactionPayload,
    signing_key: &SigningKey,
    nonce: Option<BigUint>,
    client: &C,
    config: &WalletConfig,
) -> Result<SignedTransaction, WalletError> {
    let options = TxOptions { nonce, fee: None };
    build_transaction_with_options(payload, signing_key, options, client, config).await
}

/// Build and sign a transaction; missing nonce and fee come from the node
pub async fn build_transaction_with_options<C: NodeClient + ?Sized>(
    payload: &TransactionPayload,
    signing_key: &SigningKey,
    options: TxOptions,
    client: &C,
    config: &WalletConfig,
) -> Result<SignedTransaction, WalletError> {
    let normalized = normalize_payload(payload)?;
    let network = resolve_network(normalized.network.as_ref(), config)?;

    let nonce = match options.nonce {
        Some(nonce) => nonce,
        None => {
            let sender = sender_address(signing_key, network.version);
            let nonce = client.account_nonce(&network, &sender).await?;
            debug!(%sender, %nonce, "Inferred nonce");
            nonce
        }
    };

    let fee = match options.fee {
        Some(fee) => fee,
        None => {
            let rate = client.fee_rate(&network).await?;
            let unsigned = build_unsigned(&normalized, &network, signing_key, &nonce, &BigUint::ZERO)?;
            let length = unsigned.serialize()?.len() as u64;
            debug!(rate, length, "Estimated fee");
            BigUint::from(rate) * length
        }
    };

    let signed = build_signed(
        &normalized,
        &network,
        signing_key,
        &TxOptions {
            nonce: Some(nonce),
            fee: Some(fee),
        },
    )?;
    debug!(txid = %signed.txid(), tx_type = payload.tx_type(), "Built transaction");
    Ok(signed)
}

/// Construct and sign without touching the node. Missing nonce or fee is zero.
pub fn build_signed(
    normalized: &NormalizedPayload,
    network: &StacksNetwork,
    signing_key: &SigningKey,
    options: &TxOptions,
) -> Result<SignedTransaction, WalletError> {
    let zero = BigUint::ZERO;
    let nonce = options.nonce.as_ref().unwrap_or(&zero);
    let fee = options.fee.as_ref().unwrap_or(&zero);

    let mut tx = build_unsigned(normalized, network, signing_key, nonce, fee)?;
    tx.sign(signing_key)?;
    tx.into_signed()
}

fn build_unsigned(
    normalized: &NormalizedPayload,
    network: &StacksNetwork,
    signing_key: &SigningKey,
    nonce: &BigUint,
    fee: &BigUint,
) -> Result<StacksTransaction, WalletError> {
    let payload = calls::build_payload(&normalized.kind)?;
    let auth = SpendingCondition::new(
        signing_key.verifying_key(),
        amount_to_u64(nonce)?,
        amount_to_u64(fee)?,
    );

    Ok(StacksTransaction {
        version: network.version,
        chain_id: network.chain_id,
        auth,
        anchor_mode: normalized.anchor_mode,
        post_condition_mode: normalized.post_condition_mode,
        post_conditions: normalized.post_conditions.clone(),
        payload,
    })
}

/// c32 address of the key's single-sig account on `version`
pub fn sender_address(signing_key: &SigningKey, version: TransactionVersion) -> String {
    let public_key = signing_key.verifying_key().to_sec1_bytes();
    StacksAddress::from_public_key(&public_key, version).to_c32()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockNodeClient;
    use crate::network::{RawVersion, CHAIN_ID_TESTNET};
    use crate::transaction::TxPayload;

    fn key() -> SigningKey {
        SigningKey::from_slice(&[11u8; 32]).unwrap()
    }

    fn payload(json: serde_json::Value) -> TransactionPayload {
        TransactionPayload::from_json(json).unwrap()
    }

    fn transfer_json() -> serde_json::Value {
        serde_json::json!({
            "txType": "token_transfer",
            "network": "testnet",
            "recipient": "ST2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKQ9H6DPR",
            "amount": "2500",
            "memo": "rent"
        })
    }

    #[test]
    fn test_tag_resolves_to_default_network() {
        let config = WalletConfig::default();
        let descriptor = NetworkDescriptor::tag(RawVersion::Name("testnet".to_string()));
        let network = resolve_network(Some(&descriptor), &config).unwrap();
        assert_eq!(network, config.default_network(TransactionVersion::Testnet));
    }

    #[test]
    fn test_capable_descriptor_passes_through() {
        let descriptor: NetworkDescriptor = serde_json::from_value(serde_json::json!({
            "version": 128,
            "chainId": 42,
            "coreApiUrl": "http://localhost:3999",
            "transferFeeEstimateEndpoint": "/custom/fees"
        }))
        .unwrap();
        let network = resolve_network(Some(&descriptor), &WalletConfig::default()).unwrap();
        assert_eq!(network.chain_id, 42);
        assert_eq!(network.fee_estimate_url(), "http://localhost:3999/custom/fees");
    }

    #[test]
    fn test_descriptor_without_fee_endpoint_is_replaced() {
        let descriptor: NetworkDescriptor = serde_json::from_value(serde_json::json!({
            "version": "testnet",
            "coreApiUrl": "http://ignored"
        }))
        .unwrap();
        let config = WalletConfig::default();
        let network = resolve_network(Some(&descriptor), &config).unwrap();
        assert_eq!(network.core_api_url, config.testnet_api_url);
    }

    #[test]
    fn test_unknown_version_fails() {
        let descriptor = NetworkDescriptor::tag(RawVersion::Number(3));
        assert!(matches!(
            resolve_network(Some(&descriptor), &WalletConfig::default()),
            Err(WalletError::InvalidNetworkVersion(_))
        ));
    }

    #[tokio::test]
    async fn test_nonce_and_fee_inferred() {
        let key = key();
        let client = MockNodeClient::new().with_fee_rate(2);
        client.set_nonce(&sender_address(&key, TransactionVersion::Testnet), 7);

        let signed = build_transaction(
            &payload(transfer_json()),
            &key,
            None,
            &client,
            &WalletConfig::default(),
        )
        .await
        .unwrap();

        let tx = signed.decode().unwrap();
        assert_eq!(tx.auth.nonce, 7);
        assert_eq!(tx.auth.fee, 2 * signed.to_bytes().len() as u64);
        assert_eq!(tx.chain_id, CHAIN_ID_TESTNET);
        assert!(tx.verify_origin().is_ok());
        match tx.payload {
            TxPayload::TokenTransfer { amount, .. } => assert_eq!(amount, BigUint::from(2500u32)),
            other => panic!("Expected TokenTransfer, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_explicit_nonce_wins() {
        let key = key();
        let client = MockNodeClient::new().with_fee_rate(1);
        client.set_nonce(&sender_address(&key, TransactionVersion::Testnet), 7);

        let signed = build_transaction(
            &payload(transfer_json()),
            &key,
            Some(BigUint::from(42u32)),
            &client,
            &WalletConfig::default(),
        )
        .await
        .unwrap();
        assert_eq!(signed.nonce(), &BigUint::from(42u32));
    }

    #[tokio::test]
    async fn test_contract_call_dispatch() {
        let json = serde_json::json!({
            "txType": "contract_call",
            "network": "mainnet",
            "contractAddress": "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7",
            "contractName": "counter",
            "functionName": "add",
            "functionArgs": ["0x0100000000000000000000000000000005"],
            "postConditionMode": "allow",
            "postConditions": [
                { "type": "stx", "principal": "origin", "conditionCode": "eq", "amount": "ff" }
            ]
        });
        let options = TxOptions::default().with_nonce(1u32).with_fee(300u32);
        let signed = build_transaction_with_options(
            &payload(json),
            &key(),
            options,
            &MockNodeClient::new(),
            &WalletConfig::default(),
        )
        .await
        .unwrap();

        let tx = signed.decode().unwrap();
        assert_eq!(tx.version, TransactionVersion::Mainnet);
        assert_eq!(tx.post_conditions.len(), 1);
        assert!(matches!(tx.payload, TxPayload::ContractCall { .. }));
        assert_eq!(tx.auth.fee, 300);
    }

    #[tokio::test]
    async fn test_nonce_beyond_64_bits_rejected() {
        let result = build_transaction(
            &payload(transfer_json()),
            &key(),
            Some(BigUint::from(u64::MAX) + 1u32),
            &MockNodeClient::new(),
            &WalletConfig::default(),
        )
        .await;
        assert!(matches!(result, Err(WalletError::InvalidInput(_))));
    }

    #[test]
    fn test_build_signed_offline() {
        let normalized = normalize_payload(&payload(transfer_json())).unwrap();
        let network = WalletConfig::default().default_network(TransactionVersion::Testnet);
        let signed = build_signed(&normalized, &network, &key(), &TxOptions::default()).unwrap();
        assert_eq!(signed.fee(), &BigUint::ZERO);
        assert!(signed.decode().unwrap().verify_origin().is_ok());
    }
}
