//! Core Stacks transaction types, wire serialization and single-sig signing

use crate::address::{hash160, Principal, StacksAddress};
use crate::clarity::{read_address, write_address, ClarityValue};
use crate::codec::{
    decode_hex, to_prefixed_hex, write_long_bytes, write_name, ByteOrName, ByteReader,
};
use crate::error::WalletError;
use crate::network::TransactionVersion;
use crate::post_condition::{amount_to_u64, PostCondition, PostConditionMode};
use k256::ecdsa::signature::hazmat::PrehashSigner;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use num_bigint::BigUint;
use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha512_256};

/// Memo field width for token transfers
pub const MEMO_LENGTH: usize = 34;
/// Recoverable signature: recovery id, r, s
pub const RECOVERABLE_SIGNATURE_LENGTH: usize = 65;

const AUTH_STANDARD: u8 = 0x04;
const HASH_MODE_P2PKH: u8 = 0x00;
const KEY_ENCODING_COMPRESSED: u8 = 0x00;

mod payload_id {
    pub const TOKEN_TRANSFER: u8 = 0x00;
    pub const SMART_CONTRACT: u8 = 0x01;
    pub const CONTRACT_CALL: u8 = 0x02;
}

/// Which blocks the transaction may be mined in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AnchorMode {
    OnChainOnly = 0x01,
    OffChainOnly = 0x02,
    #[default]
    Any = 0x03,
}

impl AnchorMode {
    fn from_byte(byte: u8) -> Result<Self, WalletError> {
        match byte {
            0x01 => Ok(AnchorMode::OnChainOnly),
            0x02 => Ok(AnchorMode::OffChainOnly),
            0x03 => Ok(AnchorMode::Any),
            other => Err(WalletError::decode(format!("Invalid anchor mode: {}", other))),
        }
    }
}

impl<'de> Deserialize<'de> for AnchorMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ByteOrName {
            expecting: "anchor mode",
            names: &[
                ("onChainOnly", AnchorMode::OnChainOnly),
                ("offChainOnly", AnchorMode::OffChainOnly),
                ("any", AnchorMode::Any),
            ],
            from_byte: AnchorMode::from_byte,
        })
    }
}

/// Transaction body, one variant per supported kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxPayload {
    TokenTransfer {
        recipient: Principal,
        amount: BigUint,
        memo: [u8; MEMO_LENGTH],
    },
    SmartContract {
        contract_name: String,
        code_body: String,
    },
    ContractCall {
        contract_address: StacksAddress,
        contract_name: String,
        function_name: String,
        function_args: Vec<ClarityValue>,
    },
}

/// Pad a memo string into the fixed-width memo field
pub fn encode_memo(memo: &str) -> Result<[u8; MEMO_LENGTH], WalletError> {
    let bytes = memo.as_bytes();
    if bytes.len() > MEMO_LENGTH {
        return Err(WalletError::invalid_input(format!(
            "Memo must be at most {} bytes, got {}",
            MEMO_LENGTH,
            bytes.len()
        )));
    }
    let mut out = [0u8; MEMO_LENGTH];
    out[..bytes.len()].copy_from_slice(bytes);
    Ok(out)
}

/// Single-signature (P2PKH) spending condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpendingCondition {
    pub signer: [u8; 20],
    pub nonce: u64,
    pub fee: u64,
    pub signature: [u8; RECOVERABLE_SIGNATURE_LENGTH],
}

impl SpendingCondition {
    pub fn new(public_key: &VerifyingKey, nonce: u64, fee: u64) -> Self {
        SpendingCondition {
            signer: hash160(&public_key.to_sec1_bytes()),
            nonce,
            fee,
            signature: [0u8; RECOVERABLE_SIGNATURE_LENGTH],
        }
    }

    /// Condition as it appears in the initial sighash: no nonce, fee or signature
    fn cleared(&self) -> Self {
        SpendingCondition {
            signer: self.signer,
            nonce: 0,
            fee: 0,
            signature: [0u8; RECOVERABLE_SIGNATURE_LENGTH],
        }
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        out.push(HASH_MODE_P2PKH);
        out.extend_from_slice(&self.signer);
        out.extend_from_slice(&self.nonce.to_be_bytes());
        out.extend_from_slice(&self.fee.to_be_bytes());
        out.push(KEY_ENCODING_COMPRESSED);
        out.extend_from_slice(&self.signature);
    }

    fn read_from(reader: &mut ByteReader<'_>) -> Result<Self, WalletError> {
        let hash_mode = reader.read_u8()?;
        if hash_mode != HASH_MODE_P2PKH {
            return Err(WalletError::decode(format!(
                "Unsupported hash mode: 0x{:02x}",
                hash_mode
            )));
        }
        let signer = reader.read_array::<20>()?;
        let nonce = reader.read_u64()?;
        let fee = reader.read_u64()?;
        let key_encoding = reader.read_u8()?;
        if key_encoding != KEY_ENCODING_COMPRESSED {
            return Err(WalletError::decode(format!(
                "Unsupported key encoding: 0x{:02x}",
                key_encoding
            )));
        }
        let signature = reader.read_array::<RECOVERABLE_SIGNATURE_LENGTH>()?;
        Ok(SpendingCondition {
            signer,
            nonce,
            fee,
            signature,
        })
    }
}

/// A Stacks transaction with standard single-sig authorization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StacksTransaction {
    pub version: TransactionVersion,
    pub chain_id: u32,
    pub auth: SpendingCondition,
    pub anchor_mode: AnchorMode,
    pub post_condition_mode: PostConditionMode,
    pub post_conditions: Vec<PostCondition>,
    pub payload: TxPayload,
}

impl StacksTransaction {
    /// Serialize to wire bytes
    pub fn serialize(&self) -> Result<Vec<u8>, WalletError> {
        self.serialize_with_auth(&self.auth)
    }

    fn serialize_with_auth(&self, auth: &SpendingCondition) -> Result<Vec<u8>, WalletError> {
        let mut out = Vec::new();
        out.push(self.version.byte());
        out.extend_from_slice(&self.chain_id.to_be_bytes());
        out.push(AUTH_STANDARD);
        auth.write_to(&mut out);
        out.push(self.anchor_mode as u8);
        out.push(self.post_condition_mode as u8);

        let count = u32::try_from(self.post_conditions.len())
            .map_err(|_| WalletError::invalid_input("Too many post-conditions"))?;
        out.extend_from_slice(&count.to_be_bytes());
        for pc in &self.post_conditions {
            pc.write_to(&mut out)?;
        }

        write_payload(&mut out, &self.payload)?;
        Ok(out)
    }

    /// Parse wire bytes; the buffer must hold exactly one transaction
    pub fn deserialize(bytes: &[u8]) -> Result<Self, WalletError> {
        let mut reader = ByteReader::new(bytes);

        let version = TransactionVersion::from_byte(reader.read_u8()?)?;
        let chain_id = reader.read_u32()?;

        let auth_type = reader.read_u8()?;
        if auth_type != AUTH_STANDARD {
            return Err(WalletError::decode(format!(
                "Unsupported authorization type: 0x{:02x}",
                auth_type
            )));
        }
        let auth = SpendingCondition::read_from(&mut reader)?;
        let anchor_mode = AnchorMode::from_byte(reader.read_u8()?)?;
        let post_condition_mode = PostConditionMode::from_byte(reader.read_u8()?)?;

        let count = reader.read_u32()? as usize;
        if count > reader.remaining() {
            return Err(WalletError::decode(format!(
                "Post-condition count {} exceeds input",
                count
            )));
        }
        let mut post_conditions = Vec::with_capacity(count);
        for _ in 0..count {
            post_conditions.push(PostCondition::read_from(&mut reader)?);
        }

        let payload = read_payload(&mut reader)?;
        reader.expect_end()?;

        Ok(StacksTransaction {
            version,
            chain_id,
            auth,
            anchor_mode,
            post_condition_mode,
            post_conditions,
            payload,
        })
    }

    pub fn from_hex(s: &str) -> Result<Self, WalletError> {
        Self::deserialize(&decode_hex(s)?)
    }

    /// Transaction id: SHA-512/256 of the serialized bytes
    pub fn txid(&self) -> Result<[u8; 32], WalletError> {
        Ok(sha512_256(&self.serialize()?))
    }

    /// Sighash over the transaction with the spending condition cleared
    pub fn initial_sighash(&self) -> Result<[u8; 32], WalletError> {
        let bytes = self.serialize_with_auth(&self.auth.cleared())?;
        Ok(sha512_256(&bytes))
    }

    /// Digest the origin actually signs
    fn presign_sighash(&self) -> Result<[u8; 32], WalletError> {
        let mut data = Vec::with_capacity(32 + 1 + 8 + 8);
        data.extend_from_slice(&self.initial_sighash()?);
        data.push(AUTH_STANDARD);
        data.extend_from_slice(&self.auth.fee.to_be_bytes());
        data.extend_from_slice(&self.auth.nonce.to_be_bytes());
        Ok(sha512_256(&data))
    }

    /// Sign as origin. The key must hash to the spending condition's signer.
    pub fn sign(&mut self, signing_key: &SigningKey) -> Result<(), WalletError> {
        let public_key = signing_key.verifying_key().to_sec1_bytes();
        if hash160(&public_key) != self.auth.signer {
            return Err(WalletError::InvalidKey(
                "Signing key does not match the transaction signer".to_string(),
            ));
        }

        let presign = self.presign_sighash()?;
        let (signature, recovery_id): (Signature, RecoveryId) = signing_key
            .sign_prehash(&presign)
            .map_err(|e| WalletError::InvalidKey(format!("Signing failed: {}", e)))?;

        let mut vrs = [0u8; RECOVERABLE_SIGNATURE_LENGTH];
        vrs[0] = recovery_id.to_byte();
        vrs[1..].copy_from_slice(&signature.to_bytes());
        self.auth.signature = vrs;
        Ok(())
    }

    /// Recover the origin key from the signature and check it against the signer hash
    pub fn verify_origin(&self) -> Result<VerifyingKey, WalletError> {
        let presign = self.presign_sighash()?;
        let recovery_id = RecoveryId::from_byte(self.auth.signature[0])
            .ok_or_else(|| WalletError::decode("Invalid recovery id"))?;
        let signature = Signature::from_slice(&self.auth.signature[1..])?;
        let recovered = VerifyingKey::recover_from_prehash(&presign, &signature, recovery_id)?;

        if hash160(&recovered.to_sec1_bytes()) != self.auth.signer {
            return Err(WalletError::InvalidKey(
                "Signature does not match the transaction signer".to_string(),
            ));
        }
        Ok(recovered)
    }

    /// Freeze into a broadcastable transaction
    pub fn into_signed(self) -> Result<SignedTransaction, WalletError> {
        let bytes = self.serialize()?;
        let txid = sha512_256(&bytes);
        Ok(SignedTransaction {
            nonce: BigUint::from(self.auth.nonce),
            fee: BigUint::from(self.auth.fee),
            bytes,
            txid,
        })
    }
}

/// An immutable, signed transaction and its canonical bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    bytes: Vec<u8>,
    txid: [u8; 32],
    nonce: BigUint,
    fee: BigUint,
}

impl SignedTransaction {
    pub fn to_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Serialized bytes as `0x`-prefixed hex
    pub fn to_hex(&self) -> String {
        to_prefixed_hex(&self.bytes)
    }

    /// Transaction id as `0x`-prefixed hex
    pub fn txid(&self) -> String {
        to_prefixed_hex(&self.txid)
    }

    pub fn nonce(&self) -> &BigUint {
        &self.nonce
    }

    pub fn fee(&self) -> &BigUint {
        &self.fee
    }

    /// Decode the bytes back into the structured form
    pub fn decode(&self) -> Result<StacksTransaction, WalletError> {
        StacksTransaction::deserialize(&self.bytes)
    }
}

fn write_payload(out: &mut Vec<u8>, payload: &TxPayload) -> Result<(), WalletError> {
    match payload {
        TxPayload::TokenTransfer {
            recipient,
            amount,
            memo,
        } => {
            out.push(payload_id::TOKEN_TRANSFER);
            ClarityValue::Principal(recipient.clone()).write_to(out)?;
            out.extend_from_slice(&amount_to_u64(amount)?.to_be_bytes());
            out.extend_from_slice(memo);
        }
        TxPayload::SmartContract {
            contract_name,
            code_body,
        } => {
            out.push(payload_id::SMART_CONTRACT);
            write_name(out, contract_name)?;
            write_long_bytes(out, code_body.as_bytes())?;
        }
        TxPayload::ContractCall {
            contract_address,
            contract_name,
            function_name,
            function_args,
        } => {
            out.push(payload_id::CONTRACT_CALL);
            write_address(out, contract_address);
            write_name(out, contract_name)?;
            write_name(out, function_name)?;
            let count = u32::try_from(function_args.len())
                .map_err(|_| WalletError::invalid_input("Too many function arguments"))?;
            out.extend_from_slice(&count.to_be_bytes());
            for arg in function_args {
                arg.write_to(out)?;
            }
        }
    }
    Ok(())
}

fn read_payload(reader: &mut ByteReader<'_>) -> Result<TxPayload, WalletError> {
    match reader.read_u8()? {
        payload_id::TOKEN_TRANSFER => {
            let recipient = match ClarityValue::read_from(reader)? {
                ClarityValue::Principal(p) => p,
                other => {
                    return Err(WalletError::decode(format!(
                        "Token transfer recipient is not a principal: {:?}",
                        other
                    )))
                }
            };
            let amount = BigUint::from(reader.read_u64()?);
            let memo = reader.read_array::<MEMO_LENGTH>()?;
            Ok(TxPayload::TokenTransfer {
                recipient,
                amount,
                memo,
            })
        }
        payload_id::SMART_CONTRACT => {
            let contract_name = reader.read_name()?;
            let code_body = String::from_utf8(reader.read_long_bytes()?.to_vec())
                .map_err(|e| WalletError::decode(format!("Invalid code body: {}", e)))?;
            Ok(TxPayload::SmartContract {
                contract_name,
                code_body,
            })
        }
        payload_id::CONTRACT_CALL => {
            let contract_address = read_address(reader)?;
            let contract_name = reader.read_name()?;
            let function_name = reader.read_name()?;
            let count = reader.read_u32()? as usize;
            if count > reader.remaining() {
                return Err(WalletError::decode(format!("Argument count {} exceeds input", count)));
            }
            let mut function_args = Vec::with_capacity(count);
            for _ in 0..count {
                function_args.push(ClarityValue::read_from(reader)?);
            }
            Ok(TxPayload::ContractCall {
                contract_address,
                contract_name,
                function_name,
                function_args,
            })
        }
        other => Err(WalletError::decode(format!(
            "Unsupported payload type: 0x{:02x}",
            other
        ))),
    }
}

/// SHA-512/256 hash
fn sha512_256(data: &[u8]) -> [u8; 32] {
    let result = Sha512_256::digest(data);
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::CHAIN_ID_TESTNET;

    fn key() -> SigningKey {
        SigningKey::from_slice(&[7u8; 32]).unwrap()
    }

    fn transfer(nonce: u64, fee: u64) -> StacksTransaction {
        let key = key();
        StacksTransaction {
            version: TransactionVersion::Testnet,
            chain_id: CHAIN_ID_TESTNET,
            auth: SpendingCondition::new(key.verifying_key(), nonce, fee),
            anchor_mode: AnchorMode::Any,
            post_condition_mode: PostConditionMode::Deny,
            post_conditions: Vec::new(),
            payload: TxPayload::TokenTransfer {
                recipient: "ST2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKQ9H6DPR".parse().unwrap(),
                amount: BigUint::from(12_345u32),
                memo: encode_memo("thanks").unwrap(),
            },
        }
    }

    #[test]
    fn test_serialize_header_layout() {
        let bytes = transfer(3, 180).serialize().unwrap();
        assert_eq!(bytes[0], 0x80);
        assert_eq!(&bytes[1..5], &CHAIN_ID_TESTNET.to_be_bytes());
        assert_eq!(bytes[5], AUTH_STANDARD);
        assert_eq!(bytes[6], HASH_MODE_P2PKH);
        // nonce follows the 20-byte signer hash
        assert_eq!(&bytes[27..35], &3u64.to_be_bytes());
        assert_eq!(&bytes[35..43], &180u64.to_be_bytes());
    }

    #[test]
    fn test_sign_and_recover() {
        let mut tx = transfer(1, 200);
        tx.sign(&key()).unwrap();
        assert_ne!(tx.auth.signature, [0u8; RECOVERABLE_SIGNATURE_LENGTH]);
        let recovered = tx.verify_origin().unwrap();
        assert_eq!(recovered, *key().verifying_key());
    }

    #[test]
    fn test_initial_sighash_ignores_nonce_and_fee() {
        let a = transfer(1, 200);
        let b = transfer(9, 999);
        assert_eq!(a.initial_sighash().unwrap(), b.initial_sighash().unwrap());
        assert_ne!(a.txid().unwrap(), b.txid().unwrap());
    }

    #[test]
    fn test_sign_rejects_foreign_key() {
        let mut tx = transfer(0, 0);
        let other = SigningKey::from_slice(&[9u8; 32]).unwrap();
        assert!(matches!(tx.sign(&other), Err(WalletError::InvalidKey(_))));
    }

    #[test]
    fn test_deserialize_signed_transaction() {
        let mut tx = transfer(4, 300);
        tx.sign(&key()).unwrap();
        let signed = tx.clone().into_signed().unwrap();
        assert!(signed.to_hex().starts_with("0x80"));
        assert_eq!(signed.decode().unwrap(), tx);
        assert_eq!(signed.nonce(), &BigUint::from(4u32));
        assert_eq!(signed.txid().len(), 66);
    }

    #[test]
    fn test_memo_too_long() {
        assert!(encode_memo(&"x".repeat(35)).is_err());
        assert_eq!(encode_memo("").unwrap(), [0u8; MEMO_LENGTH]);
    }
}
