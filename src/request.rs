//! Signed request tokens
//!
//! Apps hand the wallet a compact JWT (`header.payload.signature`, each
//! base64url without padding) signed with ES256K: ECDSA over secp256k1 and
//! SHA-256, signature as raw 64-byte r ‖ s.

use crate::codec::decode_hex;
use crate::error::WalletError;
use crate::payload::TransactionPayload;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use k256::ecdsa::signature::{Signer, Verifier};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};

pub const TOKEN_ALGORITHM: &str = "ES256K";
pub const TOKEN_TYPE: &str = "JWT";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHeader {
    pub typ: String,
    pub alg: String,
}

impl Default for TokenHeader {
    fn default() -> Self {
        TokenHeader {
            typ: TOKEN_TYPE.to_string(),
            alg: TOKEN_ALGORITHM.to_string(),
        }
    }
}

/// A structurally valid token whose signature has not been checked
#[derive(Debug, Clone)]
pub struct DecodedToken {
    pub header: TokenHeader,
    pub payload: serde_json::Value,
    signing_input: String,
    signature: Vec<u8>,
}

impl DecodedToken {
    /// Check the signature against a SEC1 public key (hex, optional `0x`)
    pub fn verify(&self, public_key_hex: &str) -> Result<(), WalletError> {
        if self.header.alg != TOKEN_ALGORITHM {
            return Err(WalletError::UnsignedRequest(format!(
                "Unsupported algorithm: {}",
                self.header.alg
            )));
        }

        let key_bytes = decode_hex(public_key_hex)
            .map_err(|e| WalletError::UnsignedRequest(format!("Invalid public key: {}", e)))?;
        let verifying_key = VerifyingKey::from_sec1_bytes(&key_bytes)
            .map_err(|e| WalletError::UnsignedRequest(format!("Invalid public key: {}", e)))?;
        let signature = Signature::from_slice(&self.signature)
            .map_err(|e| WalletError::UnsignedRequest(format!("Invalid signature: {}", e)))?;

        verifying_key
            .verify(self.signing_input.as_bytes(), &signature)
            .map_err(|_| WalletError::UnsignedRequest("Signature verification failed".to_string()))
    }

    /// Interpret the claims as a transaction payload
    pub fn transaction_payload(&self) -> Result<TransactionPayload, WalletError> {
        TransactionPayload::from_json(self.payload.clone())
    }
}

/// Split and decode a token without trusting it
pub fn decode_token(token: &str) -> Result<DecodedToken, WalletError> {
    let mut parts = token.trim().split('.');
    let (header_b64, payload_b64, signature_b64) =
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(h), Some(p), Some(s), None) => (h, p, s),
            _ => return Err(WalletError::decode("Token must have three segments")),
        };

    let header: TokenHeader = serde_json::from_slice(&decode_segment(header_b64)?)?;
    let payload: serde_json::Value = serde_json::from_slice(&decode_segment(payload_b64)?)?;
    if !payload.is_object() {
        return Err(WalletError::decode("Token payload is not an object"));
    }
    let signature = decode_segment(signature_b64)?;

    Ok(DecodedToken {
        header,
        payload,
        signing_input: format!("{}.{}", header_b64, payload_b64),
        signature,
    })
}

/// Sign a payload as the app holding `app_key`. The payload's `publicKey`
/// is set to the key's compressed public key.
pub fn sign_request(
    payload: &TransactionPayload,
    app_key: &SigningKey,
) -> Result<String, WalletError> {
    let mut payload = payload.clone();
    payload.public_key = Some(hex::encode(app_key.verifying_key().to_sec1_bytes()));

    let header = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&TokenHeader::default())?);
    let claims = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&payload)?);
    let signing_input = format!("{}.{}", header, claims);

    let signature: Signature = app_key.sign(signing_input.as_bytes());
    Ok(format!(
        "{}.{}",
        signing_input,
        URL_SAFE_NO_PAD.encode(signature.to_bytes())
    ))
}

fn decode_segment(segment: &str) -> Result<Vec<u8>, WalletError> {
    URL_SAFE_NO_PAD
        .decode(segment.trim_end_matches('='))
        .map_err(|e| WalletError::decode(format!("Invalid base64url segment: {}", e)))
}
