//! WASM bindings for transaction building
//!
//! BuilderNamespace provides the entry point for building Stacks transactions.
//! Pattern: buildTransaction(payload, privateKey, options?, config?)

use crate::builder::{build_signed, build_transaction_with_options, resolve_network, types::TxOptions};
use crate::client::HttpNodeClient;
use crate::config::WalletConfig;
use crate::normalize::normalize_payload;
use crate::wasm::transaction::WasmSignedTransaction;
use crate::wasm::{parse_config, parse_payload, parse_signing_key};
use wasm_bindgen::prelude::*;

/// Namespace for building operations
#[wasm_bindgen]
pub struct BuilderNamespace;

#[wasm_bindgen]
impl BuilderNamespace {
    /// Build and sign a transaction from a request payload
    ///
    /// Nonce and fee not given in `options` are fetched from the payload's
    /// network (or the configured default network).
    ///
    /// # Arguments
    /// * `payload` - Transaction payload (JSON object with txType field)
    /// * `private_key` - Hex-encoded secp256k1 private key
    /// * `options` - Optional `{ nonce?, fee? }`, numbers or decimal strings
    /// * `config` - Optional `{ mainnetApiUrl?, testnetApiUrl? }`
    ///
    /// # Example Payload (contract call)
    /// ```json
    /// {
    ///   "txType": "contract_call",
    ///   "network": "testnet",
    ///   "contractAddress": "ST2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKQ9H6DPR",
    ///   "contractName": "counter",
    ///   "functionName": "increment",
    ///   "functionArgs": ["0x0100000000000000000000000000000001"],
    ///   "postConditions": []
    /// }
    /// ```
    ///
    /// # Transaction Types
    /// - `contract_call`: contractAddress, contractName, functionName, functionArgs
    /// - `smart_contract`: contractName, codeBody
    /// - `token_transfer`: recipient, amount, memo
    #[wasm_bindgen(js_name = buildTransaction)]
    pub async fn build_transaction_wasm(
        payload: JsValue,
        private_key: String,
        options: JsValue,
        config: JsValue,
    ) -> Result<WasmSignedTransaction, JsValue> {
        let payload = parse_payload(payload)?;
        let signing_key = parse_signing_key(&private_key)?;
        let options = parse_options(options)?;
        let config = parse_config(config)?;

        let client = HttpNodeClient::new();
        let signed =
            build_transaction_with_options(&payload, &signing_key, options, &client, &config)
                .await?;
        Ok(WasmSignedTransaction::from_inner(signed))
    }

    /// Build and sign without contacting a node; missing nonce or fee is zero
    #[wasm_bindgen(js_name = buildTransactionOffline)]
    pub fn build_transaction_offline(
        payload: JsValue,
        private_key: &str,
        options: JsValue,
        config: JsValue,
    ) -> Result<WasmSignedTransaction, JsValue> {
        let payload = parse_payload(payload)?;
        let signing_key = parse_signing_key(private_key)?;
        let options = parse_options(options)?;
        let config = parse_config(config)?;

        let normalized = normalize_payload(&payload)?;
        let network = resolve_network(normalized.network.as_ref(), &config)?;
        let signed = build_signed(&normalized, &network, &signing_key, &options)?;
        Ok(WasmSignedTransaction::from_inner(signed))
    }

    /// Network the payload would be built for
    #[wasm_bindgen(js_name = resolveNetwork)]
    pub fn resolve_network_wasm(payload: JsValue, config: JsValue) -> Result<JsValue, JsValue> {
        let payload = parse_payload(payload)?;
        let config: WalletConfig = parse_config(config)?;
        let network = resolve_network(payload.network.as_ref(), &config)?;
        crate::wasm::to_js(&network)
    }
}

fn parse_options(options: JsValue) -> Result<TxOptions, JsValue> {
    if options.is_undefined() || options.is_null() {
        return Ok(TxOptions::default());
    }
    serde_wasm_bindgen::from_value(options)
        .map_err(|e| JsValue::from_str(&format!("Invalid options: {}", e)))
}
