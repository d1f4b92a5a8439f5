//! c32check address encoding and decoding for Stacks
//!
//! A Stacks address is `S` + c32(version) + c32(hash160 || checksum), where the
//! checksum is the first 4 bytes of double-SHA256 over `version || hash160`.
//! See: https://github.com/stacks-network/c32check

use crate::error::WalletError;
use crate::network::TransactionVersion;
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Crockford base32 alphabet used by c32
const C32_ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Single-sig (P2PKH) address versions
pub const ADDRESS_VERSION_MAINNET_SINGLE_SIG: u8 = 22;
pub const ADDRESS_VERSION_TESTNET_SINGLE_SIG: u8 = 26;
/// Multi-sig (P2SH) address versions
pub const ADDRESS_VERSION_MAINNET_MULTI_SIG: u8 = 20;
pub const ADDRESS_VERSION_TESTNET_MULTI_SIG: u8 = 21;

/// Address version for a single-sig account on the given network
pub fn single_sig_version(version: TransactionVersion) -> u8 {
    match version {
        TransactionVersion::Mainnet => ADDRESS_VERSION_MAINNET_SINGLE_SIG,
        TransactionVersion::Testnet => ADDRESS_VERSION_TESTNET_SINGLE_SIG,
    }
}

/// RIPEMD160(SHA256(data))
pub fn hash160(data: &[u8]) -> [u8; 20] {
    let sha = Sha256::digest(data);
    let ripe = Ripemd160::digest(sha);
    let mut out = [0u8; 20];
    out.copy_from_slice(&ripe);
    out
}

/// Version byte plus 20-byte hash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StacksAddress {
    version: u8,
    hash160: [u8; 20],
}

impl StacksAddress {
    pub fn new(version: u8, hash160: [u8; 20]) -> Result<Self, WalletError> {
        if version >= 32 {
            return Err(WalletError::InvalidAddress(format!(
                "Address version must be below 32, got {}",
                version
            )));
        }
        Ok(StacksAddress { version, hash160 })
    }

    /// Single-sig address for a compressed or uncompressed SEC1 public key
    pub fn from_public_key(public_key: &[u8], version: TransactionVersion) -> Self {
        StacksAddress {
            version: single_sig_version(version),
            hash160: hash160(public_key),
        }
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn hash160(&self) -> &[u8; 20] {
        &self.hash160
    }

    /// Encode as a c32check address string
    pub fn to_c32(&self) -> String {
        let mut data = self.hash160.to_vec();
        data.extend_from_slice(&checksum(self.version, &self.hash160));
        format!(
            "S{}{}",
            C32_ALPHABET[self.version as usize] as char,
            c32_encode(&data)
        )
    }
}

impl fmt::Display for StacksAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_c32())
    }
}

impl FromStr for StacksAddress {
    type Err = WalletError;

    fn from_str(address: &str) -> Result<Self, Self::Err> {
        decode_c32_address(address)
    }
}

/// Decode a c32check address to version and hash160
pub fn decode_c32_address(address: &str) -> Result<StacksAddress, WalletError> {
    let rest = address
        .strip_prefix('S')
        .ok_or_else(|| WalletError::InvalidAddress(format!("Missing 'S' prefix: {}", address)))?;

    let mut chars = rest.chars();
    let version_char = chars
        .next()
        .ok_or_else(|| WalletError::InvalidAddress("Address too short".to_string()))?;
    let version = c32_digit(version_char as u8)
        .ok_or_else(|| WalletError::InvalidAddress(format!("Invalid version: {}", version_char)))?;

    let data = c32_decode(chars.as_str())?;
    if data.len() != 24 {
        return Err(WalletError::InvalidAddress(format!(
            "Invalid payload length: {}",
            data.len()
        )));
    }

    let mut hash = [0u8; 20];
    hash.copy_from_slice(&data[..20]);

    if data[20..] != checksum(version, &hash) {
        return Err(WalletError::InvalidAddress("Invalid checksum".to_string()));
    }

    StacksAddress::new(version, hash)
}

/// Validate a c32check address, optionally against an expected version
pub fn validate_address(address: &str, expected_version: Option<u8>) -> bool {
    match decode_c32_address(address) {
        Ok(decoded) => expected_version.map_or(true, |expected| decoded.version() == expected),
        Err(_) => false,
    }
}

/// A standard (account) or contract principal
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Principal {
    Standard(StacksAddress),
    Contract(StacksAddress, String),
}

impl Principal {
    pub fn address(&self) -> &StacksAddress {
        match self {
            Principal::Standard(addr) | Principal::Contract(addr, _) => addr,
        }
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Principal::Standard(addr) => write!(f, "{}", addr),
            Principal::Contract(addr, name) => write!(f, "{}.{}", addr, name),
        }
    }
}

impl FromStr for Principal {
    type Err = WalletError;

    /// Parse `SP...` or `SP....contract-name`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('.') {
            Some((address, name)) => {
                if name.is_empty() || name.len() > 128 {
                    return Err(WalletError::InvalidAddress(format!(
                        "Invalid contract name in principal: {}",
                        s
                    )));
                }
                Ok(Principal::Contract(address.parse()?, name.to_string()))
            }
            None => Ok(Principal::Standard(s.parse()?)),
        }
    }
}

fn checksum(version: u8, hash: &[u8; 20]) -> [u8; 4] {
    let mut data = Vec::with_capacity(21);
    data.push(version);
    data.extend_from_slice(hash);
    let first = Sha256::digest(&data);
    let second = Sha256::digest(first);
    let mut out = [0u8; 4];
    out.copy_from_slice(&second[..4]);
    out
}

/// Map a c32 character to its value, accepting lowercase and the
/// Crockford aliases (O -> 0, I/L -> 1)
fn c32_digit(c: u8) -> Option<u8> {
    let c = match c.to_ascii_uppercase() {
        b'O' => b'0',
        b'I' | b'L' => b'1',
        other => other,
    };
    C32_ALPHABET.iter().position(|&a| a == c).map(|p| p as u8)
}

/// Encode bytes as c32, preserving leading zero bytes as '0' digits
fn c32_encode(input: &[u8]) -> String {
    let mut digits: Vec<u8> = Vec::with_capacity(input.len() * 8 / 5 + 1);
    let mut carry: u16 = 0;
    let mut carry_bits = 0u32;

    for &byte in input.iter().rev() {
        carry |= (byte as u16) << carry_bits;
        carry_bits += 8;
        while carry_bits >= 5 {
            digits.push((carry & 0x1f) as u8);
            carry >>= 5;
            carry_bits -= 5;
        }
    }
    if carry_bits > 0 {
        digits.push((carry & 0x1f) as u8);
    }

    // digits are little-endian; drop high zero digits
    while digits.last() == Some(&0) {
        digits.pop();
    }
    for &byte in input {
        if byte != 0 {
            break;
        }
        digits.push(0);
    }

    digits
        .iter()
        .rev()
        .map(|&d| C32_ALPHABET[d as usize] as char)
        .collect()
}

/// Decode a c32 string, preserving leading '0' digits as zero bytes
fn c32_decode(input: &str) -> Result<Vec<u8>, WalletError> {
    let digits = input
        .bytes()
        .map(|c| {
            c32_digit(c)
                .ok_or_else(|| WalletError::InvalidAddress(format!("Invalid c32 character: {}", c as char)))
        })
        .collect::<Result<Vec<u8>, _>>()?;

    let mut bytes: Vec<u8> = Vec::with_capacity(digits.len() * 5 / 8 + 1);
    let mut carry: u16 = 0;
    let mut carry_bits = 0u32;

    for &digit in digits.iter().rev() {
        carry |= (digit as u16) << carry_bits;
        carry_bits += 5;
        if carry_bits >= 8 {
            bytes.push((carry & 0xff) as u8);
            carry >>= 8;
            carry_bits -= 8;
        }
    }
    if carry_bits > 0 {
        bytes.push(carry as u8);
    }

    while bytes.last() == Some(&0) {
        bytes.pop();
    }
    for &digit in &digits {
        if digit != 0 {
            break;
        }
        bytes.push(0);
    }

    bytes.reverse();
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Known vector from the c32check reference implementation
    const HASH: &str = "a46ff88886c2ef9762d970b4d2c63678835bd39d";

    fn hash_bytes() -> [u8; 20] {
        let mut h = [0u8; 20];
        h.copy_from_slice(&hex::decode(HASH).unwrap());
        h
    }

    #[test]
    fn test_known_addresses() {
        let mainnet = StacksAddress::new(22, hash_bytes()).unwrap();
        assert_eq!(mainnet.to_c32(), "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7");

        let testnet = StacksAddress::new(26, hash_bytes()).unwrap();
        assert_eq!(testnet.to_c32(), "ST2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKQ9H6DPR");
    }

    #[test]
    fn test_version_out_of_c32_range() {
        assert!(matches!(
            StacksAddress::new(32, hash_bytes()),
            Err(WalletError::InvalidAddress(_))
        ));
        let addr = StacksAddress::new(31, hash_bytes()).unwrap();
        assert!(addr.to_c32().starts_with("SZ"));
    }

    #[test]
    fn test_decode_roundtrip() {
        let decoded: StacksAddress = "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7".parse().unwrap();
        assert_eq!(decoded.version(), 22);
        assert_eq!(hex::encode(decoded.hash160()), HASH);
    }

    #[test]
    fn test_leading_zero_hash() {
        let addr = StacksAddress::new(22, [0u8; 20]).unwrap();
        let encoded = addr.to_c32();
        let decoded: StacksAddress = encoded.parse().unwrap();
        assert_eq!(decoded, addr);
    }

    #[test]
    fn test_bad_checksum() {
        // last character altered
        assert!("SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ8"
            .parse::<StacksAddress>()
            .is_err());
        assert!(!validate_address("not-an-address", None));
    }

    #[test]
    fn test_validate_address_version() {
        let addr = "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7";
        assert!(validate_address(addr, Some(ADDRESS_VERSION_MAINNET_SINGLE_SIG)));
        assert!(!validate_address(addr, Some(ADDRESS_VERSION_TESTNET_SINGLE_SIG)));
    }

    #[test]
    fn test_contract_principal() {
        let p: Principal = "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7.my-token"
            .parse()
            .unwrap();
        match &p {
            Principal::Contract(_, name) => assert_eq!(name, "my-token"),
            _ => panic!("Expected contract principal"),
        }
        assert_eq!(
            p.to_string(),
            "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7.my-token"
        );
    }
}
