//! WASM bindings for request verification

use crate::request::sign_request;
use crate::verifier::verify_request;
use crate::wallet::{Account, Wallet};
use crate::wasm::{parse_payload, parse_signing_key, to_js};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

/// Stored account key material as the extension keeps it
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountJs {
    index: u32,
    stx_private_key: String,
    apps_key: String,
    salt: String,
}

fn parse_wallet(accounts: JsValue) -> Result<Wallet, JsValue> {
    let accounts: Vec<AccountJs> = serde_wasm_bindgen::from_value(accounts)
        .map_err(|e| JsValue::from_str(&format!("Invalid accounts: {}", e)))?;
    let accounts = accounts
        .into_iter()
        .map(|a| Account::from_parts(a.index, &a.stx_private_key, &a.apps_key, &a.salt))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Wallet::new(accounts))
}

/// Namespace for request verification
#[wasm_bindgen]
pub struct VerifierNamespace;

#[wasm_bindgen]
impl VerifierNamespace {
    /// Verify a signed transaction request against the wallet's accounts
    ///
    /// # Arguments
    /// * `token` - Compact ES256K token from the app
    /// * `accounts` - `[{ index, stxPrivateKey, appsKey, salt }]`, in wallet order
    /// * `domain` - Requesting app's origin
    ///
    /// # Returns
    /// The decoded transaction payload
    #[wasm_bindgen(js_name = verifyRequest)]
    pub fn verify_request_wasm(
        token: &str,
        accounts: JsValue,
        domain: &str,
    ) -> Result<JsValue, JsValue> {
        let wallet = parse_wallet(accounts)?;
        let payload = verify_request(token, &wallet, domain)?;
        to_js(&payload)
    }

    /// Sign a payload with an app private key (hex)
    #[wasm_bindgen(js_name = signRequest)]
    pub fn sign_request_wasm(payload: JsValue, app_private_key: &str) -> Result<String, JsValue> {
        let payload = parse_payload(payload)?;
        let key = parse_signing_key(app_private_key)?;
        Ok(sign_request(&payload, &key)?)
    }
}
