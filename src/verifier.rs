//! Transaction request verification
//!
//! A request is accepted only when its token verifies against the declared
//! signer key and some account of this wallet derives that key as its app
//! key for the requesting domain. Everything happens locally.

use crate::codec::decode_hex;
use crate::error::WalletError;
use crate::network::{NetworkDescriptor, TransactionVersion};
use crate::payload::TransactionPayload;
use crate::request::decode_token;
use crate::wallet::{Account, Wallet};
use k256::ecdsa::VerifyingKey;
use tracing::debug;

/// Verify a request token and return its payload.
///
/// Fails with `InvalidNetworkVersion` before any signature work when the
/// declared network is unrecognized, `UnsignedRequest` when the signature
/// does not verify, and `Unauthorized` when no account matches.
pub fn verify_request(
    token: &str,
    wallet: &Wallet,
    domain: &str,
) -> Result<TransactionPayload, WalletError> {
    let decoded = decode_token(token)?;

    let public_key = decoded
        .payload
        .get("publicKey")
        .and_then(|v| v.as_str())
        .ok_or_else(|| WalletError::decode("Request has no publicKey"))?
        .to_string();
    let target = match decoded.payload.get("stxAddress") {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(address)) => Some(address.clone()),
        Some(other) => {
            return Err(WalletError::decode(format!("Invalid stxAddress: {}", other)));
        }
    };
    let version = network_version(decoded.payload.get("network"))?;

    decoded.verify(&public_key)?;

    let signer_key = compressed_key(&public_key)?;
    let account = find_authorizing_account(
        wallet.accounts(),
        domain,
        &signer_key,
        target.as_deref(),
        version,
    )?;
    debug!(account = account.index, domain, "Request authorized");

    decoded.transaction_payload()
}

/// Find the account whose app key for `domain` is `signer_key` and, when a
/// target address is given, whose address on `version` equals it.
///
/// Scans in order and stops at the first match; the remaining accounts are
/// then checked so that a second account passing both gates fails closed.
pub fn find_authorizing_account<'a>(
    accounts: &'a [Account],
    domain: &str,
    signer_key: &[u8],
    target: Option<&str>,
    version: TransactionVersion,
) -> Result<&'a Account, WalletError> {
    let authorizes = |account: &Account| -> Result<bool, WalletError> {
        if account.app_public_key(domain)? != signer_key {
            return Ok(false);
        }
        match target {
            Some(target) if account.address(version).to_c32() != target => {
                debug!(account = account.index, "App key matched, address did not");
                Ok(false)
            }
            _ => Ok(true),
        }
    };

    for (position, account) in accounts.iter().enumerate() {
        if !authorizes(account)? {
            continue;
        }

        for other in &accounts[position + 1..] {
            if authorizes(other)? {
                return Err(WalletError::AmbiguousAccount {
                    first: account.index,
                    second: other.index,
                });
            }
        }
        return Ok(account);
    }

    Err(WalletError::Unauthorized)
}

fn network_version(network: Option<&serde_json::Value>) -> Result<TransactionVersion, WalletError> {
    match network {
        None | Some(serde_json::Value::Null) => Ok(TransactionVersion::Mainnet),
        Some(value) => {
            let descriptor: NetworkDescriptor = serde_json::from_value(value.clone())?;
            descriptor.transaction_version()
        }
    }
}

fn compressed_key(public_key_hex: &str) -> Result<Vec<u8>, WalletError> {
    let bytes = decode_hex(public_key_hex)?;
    let key = VerifyingKey::from_sec1_bytes(&bytes)
        .map_err(|e| WalletError::UnsignedRequest(format!("Invalid public key: {}", e)))?;
    Ok(key.to_sec1_bytes().to_vec())
}
