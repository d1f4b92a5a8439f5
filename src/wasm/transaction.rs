//! WASM bindings for SignedTransaction
//!
//! Thin wrapper around the core signed transaction with #[wasm_bindgen]

use crate::codec::decode_hex;
use crate::js_obj;
use crate::payload::{TX_TYPE_CONTRACT_CALL, TX_TYPE_CONTRACT_DEPLOY, TX_TYPE_STX_TRANSFER};
use crate::transaction::{SignedTransaction, StacksTransaction, TxPayload};
use wasm_bindgen::prelude::*;

/// WASM-exposed signed transaction
#[wasm_bindgen]
pub struct WasmSignedTransaction {
    inner: SignedTransaction,
}

impl WasmSignedTransaction {
    pub(crate) fn from_inner(inner: SignedTransaction) -> Self {
        WasmSignedTransaction { inner }
    }
}

#[wasm_bindgen]
impl WasmSignedTransaction {
    /// Load serialized transaction bytes. The origin signature must verify.
    #[wasm_bindgen(constructor)]
    pub fn new(bytes: &[u8]) -> Result<WasmSignedTransaction, JsValue> {
        let tx = StacksTransaction::deserialize(bytes)?;
        tx.verify_origin()?;
        Ok(WasmSignedTransaction {
            inner: tx.into_signed()?,
        })
    }

    /// Load from a hex string (with or without `0x`)
    #[wasm_bindgen(js_name = fromHex)]
    pub fn from_hex(hex: &str) -> Result<WasmSignedTransaction, JsValue> {
        Self::new(&decode_hex(hex)?)
    }

    /// Transaction id, `0x`-prefixed
    #[wasm_bindgen(getter)]
    pub fn id(&self) -> String {
        self.inner.txid()
    }

    /// Serialized bytes, `0x`-prefixed hex
    #[wasm_bindgen(js_name = toHex)]
    pub fn to_hex(&self) -> String {
        self.inner.to_hex()
    }

    #[wasm_bindgen(js_name = toBytes)]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.inner.to_bytes().to_vec()
    }

    /// Account nonce as BigInt
    #[wasm_bindgen(getter)]
    pub fn nonce(&self) -> Result<JsValue, JsValue> {
        use crate::wasm::try_into_js_value::TryIntoJsValue;
        Ok(self.inner.nonce().try_to_js_value()?)
    }

    /// Fee in micro-STX as BigInt
    #[wasm_bindgen(getter)]
    pub fn fee(&self) -> Result<JsValue, JsValue> {
        use crate::wasm::try_into_js_value::TryIntoJsValue;
        Ok(self.inner.fee().try_to_js_value()?)
    }

    /// Decoded summary: id, txType, version, chainId, nonce, fee and
    /// post-condition count
    #[wasm_bindgen(js_name = toJSON)]
    pub fn to_json(&self) -> Result<JsValue, JsValue> {
        let tx = self.inner.decode()?;
        let tx_type = match tx.payload {
            TxPayload::ContractCall { .. } => TX_TYPE_CONTRACT_CALL,
            TxPayload::SmartContract { .. } => TX_TYPE_CONTRACT_DEPLOY,
            TxPayload::TokenTransfer { .. } => TX_TYPE_STX_TRANSFER,
        };
        let post_conditions = tx.post_conditions.len() as u32;

        Ok(js_obj!(
            "id" => self.inner.txid(),
            "txType" => tx_type,
            "version" => tx.version.byte() as u32,
            "chainId" => tx.chain_id,
            "nonce" => tx.auth.nonce,
            "fee" => tx.auth.fee,
            "postConditions" => post_conditions,
            "hex" => self.inner.to_hex(),
        )?)
    }
}
