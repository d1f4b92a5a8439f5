//! WASM bindings for wasm-stacks
//!
//! This module contains thin wrappers with #[wasm_bindgen] that delegate
//! to the core Rust implementations.

pub mod broadcast;
pub mod builder;
pub mod transaction;
pub mod try_into_js_value;
pub mod verifier;

// Re-export WASM types
pub use broadcast::BroadcastNamespace;
pub use builder::BuilderNamespace;
pub use transaction::WasmSignedTransaction;
pub use verifier::VerifierNamespace;

use crate::config::WalletConfig;
use crate::payload::TransactionPayload;
use crate::wallet::parse_private_key;
use k256::ecdsa::SigningKey;
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// Decode a JS payload object, rejecting unknown `txType` by name
pub(crate) fn parse_payload(payload: JsValue) -> Result<TransactionPayload, JsValue> {
    let json: serde_json::Value = serde_wasm_bindgen::from_value(payload)
        .map_err(|e| JsValue::from_str(&format!("Invalid payload: {}", e)))?;
    Ok(TransactionPayload::from_json(json)?)
}

pub(crate) fn parse_signing_key(hex: &str) -> Result<SigningKey, JsValue> {
    Ok(parse_private_key(hex)?)
}

/// Configuration from JS; `undefined` means defaults
pub(crate) fn parse_config(config: JsValue) -> Result<WalletConfig, JsValue> {
    if config.is_undefined() || config.is_null() {
        return Ok(WalletConfig::default());
    }
    serde_wasm_bindgen::from_value(config)
        .map_err(|e| JsValue::from_str(&format!("Invalid config: {}", e)))
}

/// Serialize to plain JS objects (not `Map`s)
pub(crate) fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}
