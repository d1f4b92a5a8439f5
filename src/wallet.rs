//! Wallet accounts and key derivation
//!
//! Each account owns an STX signing key and an "apps" extended key. Apps
//! key plus salt plus an app's domain deterministically yields the app-scoped
//! key pair the app signs its requests with.

use crate::address::StacksAddress;
use crate::codec::decode_hex;
use crate::error::WalletError;
use crate::network::TransactionVersion;
use bip32::{ChildNumber, DerivationPath, Prefix, XPrv};
use k256::ecdsa::SigningKey;
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// STX key path prefix; the account index is the last component
pub const STX_DERIVATION_PATH: &str = "m/44'/5757'/0'/0";
/// Root of the identity (app key) tree
pub const IDENTITY_DERIVATION_PATH: &str = "m/888'/0'";

#[derive(Clone)]
pub struct Account {
    pub index: u32,
    stx_private_key: SigningKey,
    apps_key: XPrv,
    salt: String,
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("index", &self.index)
            .field("salt", &self.salt)
            .finish_non_exhaustive()
    }
}

impl Account {
    pub fn new(index: u32, stx_private_key: SigningKey, apps_key: XPrv, salt: String) -> Self {
        Account {
            index,
            stx_private_key,
            apps_key,
            salt,
        }
    }

    /// Build from stored key material: hex STX key, base58 apps key, hex salt
    pub fn from_parts(
        index: u32,
        stx_private_key_hex: &str,
        apps_key_base58: &str,
        salt: &str,
    ) -> Result<Self, WalletError> {
        let stx_private_key = parse_private_key(stx_private_key_hex)?;
        let apps_key = XPrv::from_str(apps_key_base58)?;
        Ok(Account::new(index, stx_private_key, apps_key, salt.to_string()))
    }

    pub fn stx_private_key(&self) -> &SigningKey {
        &self.stx_private_key
    }

    /// Compressed SEC1 public key of the STX key
    pub fn stx_public_key(&self) -> Vec<u8> {
        self.stx_private_key.verifying_key().to_sec1_bytes().to_vec()
    }

    pub fn address(&self, version: TransactionVersion) -> StacksAddress {
        StacksAddress::from_public_key(&self.stx_public_key(), version)
    }

    pub fn apps_key_base58(&self) -> String {
        self.apps_key.to_string(Prefix::XPRV).as_str().to_owned()
    }

    pub fn salt(&self) -> &str {
        &self.salt
    }

    /// Key pair the app at `domain` uses to sign its requests
    pub fn app_private_key(&self, domain: &str) -> Result<SigningKey, WalletError> {
        let index = app_index(domain, &self.salt);
        let child = ChildNumber::new(index, true)
            .map_err(|_| WalletError::InvalidKey("Invalid app index".to_string()))?;
        let app_key = self.apps_key.derive_child(child)?;
        Ok(app_key.private_key().clone())
    }

    /// Compressed SEC1 public key of the app-scoped key
    pub fn app_public_key(&self, domain: &str) -> Result<Vec<u8>, WalletError> {
        Ok(self
            .app_private_key(domain)?
            .verifying_key()
            .to_sec1_bytes()
            .to_vec())
    }
}

/// Parse a hex private key, with or without the trailing compressed-key marker
pub fn parse_private_key(hex: &str) -> Result<SigningKey, WalletError> {
    let key_bytes = decode_hex(hex)?;
    let key_bytes = match key_bytes.len() {
        33 if key_bytes[32] == 0x01 => &key_bytes[..32],
        _ => &key_bytes[..],
    };
    Ok(SigningKey::from_slice(key_bytes)?)
}

/// Child index of the app key: hash of hex(sha256(domain ‖ salt))
pub fn app_index(domain: &str, salt: &str) -> u32 {
    let digest = Sha256::digest(format!("{}{}", domain, salt).as_bytes());
    hash_code(&hex::encode(digest))
}

/// 31-multiplier string hash over UTF-16 units, 32-bit wrapping, masked to 31 bits
pub fn hash_code(s: &str) -> u32 {
    let hash = s
        .encode_utf16()
        .fold(0i32, |hash, unit| {
            (hash << 5).wrapping_sub(hash).wrapping_add(unit as i32)
        });
    (hash & 0x7fff_ffff) as u32
}

/// Ordered set of accounts
#[derive(Debug, Clone, Default)]
pub struct Wallet {
    accounts: Vec<Account>,
}

impl Wallet {
    pub fn new(accounts: Vec<Account>) -> Self {
        Wallet { accounts }
    }

    /// Derive `count` accounts from a BIP32 seed
    pub fn from_seed(seed: &[u8], count: u32) -> Result<Self, WalletError> {
        let root = XPrv::new(seed)?;
        let identities = derive_path(&root, IDENTITY_DERIVATION_PATH)?;
        let salt = hex::encode(Sha256::digest(
            hex::encode(identities.public_key().to_bytes()).as_bytes(),
        ));

        let accounts = (0..count)
            .map(|index| -> Result<Account, WalletError> {
                let stx_key = derive_path(&root, &format!("{}/{}", STX_DERIVATION_PATH, index))?;
                let identity = identities.derive_child(hardened(index)?)?;
                let apps_key = identity.derive_child(hardened(0)?)?;
                Ok(Account::new(
                    index,
                    stx_key.private_key().clone(),
                    apps_key,
                    salt.clone(),
                ))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Wallet { accounts })
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn account(&self, index: usize) -> Option<&Account> {
        self.accounts.get(index)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Same wallet without the account at `index`
    pub fn without_account(&self, index: u32) -> Self {
        Wallet {
            accounts: self
                .accounts
                .iter()
                .filter(|account| account.index != index)
                .cloned()
                .collect(),
        }
    }
}

fn hardened(index: u32) -> Result<ChildNumber, WalletError> {
    ChildNumber::new(index, true)
        .map_err(|_| WalletError::InvalidKey(format!("Invalid child number: {}", index)))
}

fn derive_path(root: &XPrv, path: &str) -> Result<XPrv, WalletError> {
    let path = DerivationPath::from_str(path)
        .map_err(|e| WalletError::InvalidKey(format!("Invalid derivation path: {}", e)))?;
    let mut current = root.clone();
    for child in path {
        current = current.derive_child(child)?;
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: [u8; 32] = [0x42; 32];

    #[test]
    fn test_hash_code() {
        assert_eq!(hash_code(""), 0);
        assert_eq!(hash_code("a"), 97);
        assert_eq!(hash_code("ab"), 97 * 31 + 98);
        // long inputs overflow 32 bits and must still land in 31
        let h = hash_code(&"f".repeat(64));
        assert!(h < 0x8000_0000);
    }

    #[test]
    fn test_app_key_is_domain_scoped() {
        let wallet = Wallet::from_seed(&SEED, 1).unwrap();
        let account = wallet.account(0).unwrap();
        let a = account.app_public_key("https://app.example").unwrap();
        let b = account.app_public_key("https://other.example").unwrap();
        assert_eq!(a, account.app_public_key("https://app.example").unwrap());
        assert_ne!(a, b);
        assert_eq!(a.len(), 33);
    }

    #[test]
    fn test_accounts_are_distinct() {
        let wallet = Wallet::from_seed(&SEED, 3).unwrap();
        assert_eq!(wallet.len(), 3);
        let a0 = wallet.account(0).unwrap();
        let a1 = wallet.account(1).unwrap();
        assert_ne!(a0.stx_public_key(), a1.stx_public_key());
        assert_ne!(
            a0.app_public_key("https://app.example").unwrap(),
            a1.app_public_key("https://app.example").unwrap()
        );
        assert_eq!(a0.salt(), a1.salt());
    }

    #[test]
    fn test_stx_key_path() {
        let wallet = Wallet::from_seed(&SEED, 2).unwrap();
        let root = XPrv::new(SEED).unwrap();
        let expected = derive_path(&root, "m/44'/5757'/0'/0/1").unwrap();
        assert_eq!(
            wallet.account(1).unwrap().stx_private_key().to_bytes(),
            expected.private_key().to_bytes()
        );
    }

    #[test]
    fn test_from_parts_roundtrip() {
        let wallet = Wallet::from_seed(&SEED, 1).unwrap();
        let account = wallet.account(0).unwrap();
        let restored = Account::from_parts(
            0,
            &format!("{}01", hex::encode(account.stx_private_key().to_bytes())),
            &account.apps_key_base58(),
            account.salt(),
        )
        .unwrap();
        assert_eq!(
            restored.app_public_key("https://app.example").unwrap(),
            account.app_public_key("https://app.example").unwrap()
        );
        assert_eq!(
            restored.address(TransactionVersion::Mainnet),
            account.address(TransactionVersion::Mainnet)
        );
    }

    #[test]
    fn test_without_account() {
        let wallet = Wallet::from_seed(&SEED, 3).unwrap();
        let trimmed = wallet.without_account(1);
        let indexes: Vec<u32> = trimmed.accounts().iter().map(|a| a.index).collect();
        assert_eq!(indexes, vec![0, 2]);
    }
}
