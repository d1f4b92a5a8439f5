//! Byte-level helpers shared by the Stacks wire formats
//!
//! All integers on the wire are big-endian. Names (contract, function, asset)
//! carry a 1-byte length prefix; bodies and lists carry a 4-byte one.

use crate::error::WalletError;
use num_bigint::BigUint;
use serde::de::{self, Visitor};
use std::fmt;

/// Cursor over a byte buffer that never reads past the end
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    bytes: &'a [u8],
    cursor: usize,
}

impl<'a> ByteReader<'a> {
    /// Create a reader positioned at offset 0
    pub fn new(bytes: &'a [u8]) -> Self {
        ByteReader { bytes, cursor: 0 }
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Read exactly `len` bytes
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], WalletError> {
        if self.remaining() < len {
            return Err(WalletError::decode(format!(
                "Unexpected end of input at offset {}: need {} bytes, have {}",
                self.cursor,
                len,
                self.remaining()
            )));
        }
        let slice = &self.bytes[self.cursor..self.cursor + len];
        self.cursor += len;
        Ok(slice)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], WalletError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, WalletError> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u32(&mut self) -> Result<u32, WalletError> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    pub fn read_u64(&mut self) -> Result<u64, WalletError> {
        Ok(u64::from_be_bytes(self.read_array()?))
    }

    pub fn read_u128(&mut self) -> Result<u128, WalletError> {
        Ok(u128::from_be_bytes(self.read_array()?))
    }

    pub fn read_i128(&mut self) -> Result<i128, WalletError> {
        Ok(i128::from_be_bytes(self.read_array()?))
    }

    /// Read a 1-byte length-prefixed ASCII name
    pub fn read_name(&mut self) -> Result<String, WalletError> {
        let len = self.read_u8()? as usize;
        let bytes = self.read_bytes(len)?;
        if !bytes.is_ascii() {
            return Err(WalletError::decode("Name is not ASCII"));
        }
        String::from_utf8(bytes.to_vec()).map_err(|e| WalletError::decode(e.to_string()))
    }

    /// Read a 4-byte length-prefixed byte body
    pub fn read_long_bytes(&mut self) -> Result<&'a [u8], WalletError> {
        let len = self.read_u32()? as usize;
        self.read_bytes(len)
    }

    /// Fail if any bytes are left unread
    pub fn expect_end(&self) -> Result<(), WalletError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(WalletError::decode(format!(
                "{} trailing bytes after offset {}",
                self.remaining(),
                self.cursor
            )))
        }
    }
}

/// Write a 1-byte length-prefixed name
pub fn write_name(out: &mut Vec<u8>, name: &str) -> Result<(), WalletError> {
    let len = u8::try_from(name.len())
        .map_err(|_| WalletError::invalid_input(format!("Name too long: {}", name.len())))?;
    out.push(len);
    out.extend_from_slice(name.as_bytes());
    Ok(())
}

/// Write a 4-byte length-prefixed byte body
pub fn write_long_bytes(out: &mut Vec<u8>, bytes: &[u8]) -> Result<(), WalletError> {
    let len = u32::try_from(bytes.len())
        .map_err(|_| WalletError::invalid_input(format!("Body too long: {}", bytes.len())))?;
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(bytes);
    Ok(())
}

/// Decode a hex string with or without `0x` prefix
pub fn decode_hex(s: &str) -> Result<Vec<u8>, WalletError> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    Ok(hex::decode(s)?)
}

/// Encode bytes as `0x`-prefixed hex
pub fn to_prefixed_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Parse an unsigned integer made only of digits in `radix`.
///
/// Signs, separators and whitespace are rejected.
pub fn parse_uint(digits: &str, radix: u32) -> Option<BigUint> {
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    BigUint::parse_bytes(digits.as_bytes(), radix)
}

/// Deserializes a one-byte enum from either its wire byte or its name
pub(crate) struct ByteOrName<T: 'static> {
    pub expecting: &'static str,
    pub names: &'static [(&'static str, T)],
    pub from_byte: fn(u8) -> Result<T, WalletError>,
}

impl<'de, T: Copy + 'static> Visitor<'de> for ByteOrName<T> {
    type Value = T;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.expecting)
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<T, E> {
        let byte = u8::try_from(value)
            .map_err(|_| E::custom(format!("invalid {}: {}", self.expecting, value)))?;
        (self.from_byte)(byte).map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<T, E> {
        let value = u64::try_from(value)
            .map_err(|_| E::custom(format!("invalid {}: {}", self.expecting, value)))?;
        self.visit_u64(value)
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<T, E> {
        // JS numbers arrive as f64 through serde-wasm-bindgen
        if value >= 0.0 && value.fract() == 0.0 && value <= u8::MAX as f64 {
            self.visit_u64(value as u64)
        } else {
            Err(E::custom(format!("invalid {}: {}", self.expecting, value)))
        }
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<T, E> {
        self.names
            .iter()
            .find(|(name, _)| *name == value)
            .map(|(_, v)| *v)
            .ok_or_else(|| E::custom(format!("invalid {}: {}", self.expecting, value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_integers() {
        let bytes = [0x01, 0x00, 0x00, 0x00, 0x02, 0xff];
        let mut reader = ByteReader::new(&bytes);
        assert_eq!(reader.read_u8().unwrap(), 1);
        assert_eq!(reader.read_u32().unwrap(), 2);
        assert_eq!(reader.remaining(), 1);
        assert!(reader.read_u32().is_err());
        // failed read does not advance
        assert_eq!(reader.position(), 5);
    }

    #[test]
    fn test_name_roundtrip() {
        let mut out = Vec::new();
        write_name(&mut out, "my-contract").unwrap();
        assert_eq!(out[0], 11);
        let mut reader = ByteReader::new(&out);
        assert_eq!(reader.read_name().unwrap(), "my-contract");
        assert!(reader.expect_end().is_ok());
    }

    #[test]
    fn test_name_too_long() {
        let long = "a".repeat(256);
        assert!(write_name(&mut Vec::new(), &long).is_err());
    }

    #[test]
    fn test_trailing_bytes() {
        let bytes = [0x00, 0x01];
        let mut reader = ByteReader::new(&bytes);
        reader.read_u8().unwrap();
        assert!(matches!(reader.expect_end(), Err(WalletError::Decode(_))));
    }

    #[test]
    fn test_decode_hex_prefix() {
        assert_eq!(decode_hex("0x0a0b").unwrap(), vec![0x0a, 0x0b]);
        assert_eq!(decode_hex("0a0b").unwrap(), vec![0x0a, 0x0b]);
        assert!(decode_hex("0xzz").is_err());
        assert_eq!(to_prefixed_hex(&[0xab]), "0xab");
    }

    #[test]
    fn test_parse_uint_digits_only() {
        assert_eq!(parse_uint("1000", 10), Some(BigUint::from(1000u32)));
        assert_eq!(parse_uint("ff", 16), Some(BigUint::from(255u32)));
        assert_eq!(parse_uint("1_000", 10), None);
        assert_eq!(parse_uint("+5", 10), None);
        assert_eq!(parse_uint(" 5", 10), None);
        assert_eq!(parse_uint("", 10), None);
        assert_eq!(parse_uint("ff", 10), None);
    }
}
