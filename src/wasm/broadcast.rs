//! WASM bindings for broadcasting

use crate::broadcast::{broadcast_transaction, RejectionReason};
use crate::client::HttpNodeClient;
use crate::codec::decode_hex;
use crate::network::StacksNetwork;
use crate::transaction::StacksTransaction;
use crate::wasm::to_js;
use wasm_bindgen::prelude::*;

/// Namespace for broadcast operations
#[wasm_bindgen]
pub struct BroadcastNamespace;

#[wasm_bindgen]
impl BroadcastNamespace {
    /// Submit a signed transaction once
    ///
    /// # Arguments
    /// * `tx_hex` - Serialized signed transaction (from `WasmSignedTransaction.toHex()`)
    /// * `network` - Resolved network (from `BuilderNamespace.resolveNetwork`)
    ///
    /// # Returns
    /// `{ transactionId, rawHex }`; rejections throw with `"{error} - {reason}"`
    #[wasm_bindgen(js_name = broadcastTransaction)]
    pub async fn broadcast_transaction_wasm(
        tx_hex: String,
        network: JsValue,
    ) -> Result<JsValue, JsValue> {
        let network: StacksNetwork = serde_wasm_bindgen::from_value(network)
            .map_err(|e| JsValue::from_str(&format!("Invalid network: {}", e)))?;
        let signed = StacksTransaction::deserialize(&decode_hex(&tx_hex)?)?.into_signed()?;

        let client = HttpNodeClient::new();
        let outcome = broadcast_transaction(&client, &signed, &network).await?;
        to_js(&outcome)
    }

    /// User-facing message for a rejection reason name
    #[wasm_bindgen(js_name = rejectionMessage)]
    pub fn rejection_message(reason: &str) -> String {
        RejectionReason::parse(reason).user_message().to_string()
    }
}
