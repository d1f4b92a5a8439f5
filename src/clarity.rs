//! Clarity values and their consensus serialization
//!
//! Function arguments of contract calls and non-fungible asset identifiers
//! travel as serialized Clarity values: a 1-byte type prefix followed by the
//! type-specific body.

use crate::address::{Principal, StacksAddress};
use crate::codec::{decode_hex, write_long_bytes, write_name, ByteReader};
use crate::error::WalletError;
use std::collections::BTreeMap;

/// Maximum nesting of lists, tuples, optionals and responses
pub const MAX_VALUE_DEPTH: usize = 32;

mod type_id {
    pub const INT: u8 = 0x00;
    pub const UINT: u8 = 0x01;
    pub const BUFFER: u8 = 0x02;
    pub const TRUE: u8 = 0x03;
    pub const FALSE: u8 = 0x04;
    pub const PRINCIPAL_STANDARD: u8 = 0x05;
    pub const PRINCIPAL_CONTRACT: u8 = 0x06;
    pub const RESPONSE_OK: u8 = 0x07;
    pub const RESPONSE_ERR: u8 = 0x08;
    pub const OPTIONAL_NONE: u8 = 0x09;
    pub const OPTIONAL_SOME: u8 = 0x0a;
    pub const LIST: u8 = 0x0b;
    pub const TUPLE: u8 = 0x0c;
    pub const STRING_ASCII: u8 = 0x0d;
    pub const STRING_UTF8: u8 = 0x0e;
}

/// A typed Clarity value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClarityValue {
    Int(i128),
    UInt(u128),
    Buffer(Vec<u8>),
    Bool(bool),
    Principal(Principal),
    ResponseOk(Box<ClarityValue>),
    ResponseErr(Box<ClarityValue>),
    OptionalNone,
    OptionalSome(Box<ClarityValue>),
    List(Vec<ClarityValue>),
    Tuple(BTreeMap<String, ClarityValue>),
    StringAscii(String),
    StringUtf8(String),
}

impl ClarityValue {
    /// Serialize to consensus bytes
    pub fn serialize(&self) -> Result<Vec<u8>, WalletError> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        Ok(out)
    }

    pub fn to_hex(&self) -> Result<String, WalletError> {
        Ok(hex::encode(self.serialize()?))
    }

    /// Append consensus bytes to `out`
    pub fn write_to(&self, out: &mut Vec<u8>) -> Result<(), WalletError> {
        match self {
            ClarityValue::Int(v) => {
                out.push(type_id::INT);
                out.extend_from_slice(&v.to_be_bytes());
            }
            ClarityValue::UInt(v) => {
                out.push(type_id::UINT);
                out.extend_from_slice(&v.to_be_bytes());
            }
            ClarityValue::Buffer(bytes) => {
                out.push(type_id::BUFFER);
                write_long_bytes(out, bytes)?;
            }
            ClarityValue::Bool(true) => out.push(type_id::TRUE),
            ClarityValue::Bool(false) => out.push(type_id::FALSE),
            ClarityValue::Principal(Principal::Standard(addr)) => {
                out.push(type_id::PRINCIPAL_STANDARD);
                write_address(out, addr);
            }
            ClarityValue::Principal(Principal::Contract(addr, name)) => {
                out.push(type_id::PRINCIPAL_CONTRACT);
                write_address(out, addr);
                write_name(out, name)?;
            }
            ClarityValue::ResponseOk(inner) => {
                out.push(type_id::RESPONSE_OK);
                inner.write_to(out)?;
            }
            ClarityValue::ResponseErr(inner) => {
                out.push(type_id::RESPONSE_ERR);
                inner.write_to(out)?;
            }
            ClarityValue::OptionalNone => out.push(type_id::OPTIONAL_NONE),
            ClarityValue::OptionalSome(inner) => {
                out.push(type_id::OPTIONAL_SOME);
                inner.write_to(out)?;
            }
            ClarityValue::List(items) => {
                out.push(type_id::LIST);
                out.extend_from_slice(&list_len(items.len())?.to_be_bytes());
                for item in items {
                    item.write_to(out)?;
                }
            }
            ClarityValue::Tuple(fields) => {
                out.push(type_id::TUPLE);
                out.extend_from_slice(&list_len(fields.len())?.to_be_bytes());
                for (name, value) in fields {
                    write_name(out, name)?;
                    value.write_to(out)?;
                }
            }
            ClarityValue::StringAscii(s) => {
                if !s.is_ascii() {
                    return Err(WalletError::invalid_input("string-ascii contains non-ASCII"));
                }
                out.push(type_id::STRING_ASCII);
                write_long_bytes(out, s.as_bytes())?;
            }
            ClarityValue::StringUtf8(s) => {
                out.push(type_id::STRING_UTF8);
                write_long_bytes(out, s.as_bytes())?;
            }
        }
        Ok(())
    }

    /// Deserialize a single value that must span the whole buffer
    pub fn deserialize(bytes: &[u8]) -> Result<Self, WalletError> {
        let mut reader = ByteReader::new(bytes);
        let value = Self::read_from(&mut reader)?;
        reader.expect_end()?;
        Ok(value)
    }

    /// Deserialize from a hex string (with or without `0x`)
    pub fn from_hex(s: &str) -> Result<Self, WalletError> {
        Self::deserialize(&decode_hex(s)?)
    }

    /// Read one value from the reader, leaving it positioned after the value
    pub fn read_from(reader: &mut ByteReader<'_>) -> Result<Self, WalletError> {
        read_value(reader, 0)
    }
}

fn list_len(len: usize) -> Result<u32, WalletError> {
    u32::try_from(len).map_err(|_| WalletError::invalid_input("Too many elements"))
}

pub(crate) fn write_address(out: &mut Vec<u8>, addr: &StacksAddress) {
    out.push(addr.version());
    out.extend_from_slice(addr.hash160());
}

pub(crate) fn read_address(reader: &mut ByteReader<'_>) -> Result<StacksAddress, WalletError> {
    let version = reader.read_u8()?;
    let hash = reader.read_array::<20>()?;
    StacksAddress::new(version, hash).map_err(|e| WalletError::decode(e.to_string()))
}

fn read_value(reader: &mut ByteReader<'_>, depth: usize) -> Result<ClarityValue, WalletError> {
    if depth > MAX_VALUE_DEPTH {
        return Err(WalletError::decode("Clarity value nested too deeply"));
    }

    let prefix = reader.read_u8()?;
    let value = match prefix {
        type_id::INT => ClarityValue::Int(reader.read_i128()?),
        type_id::UINT => ClarityValue::UInt(reader.read_u128()?),
        type_id::BUFFER => ClarityValue::Buffer(reader.read_long_bytes()?.to_vec()),
        type_id::TRUE => ClarityValue::Bool(true),
        type_id::FALSE => ClarityValue::Bool(false),
        type_id::PRINCIPAL_STANDARD => {
            ClarityValue::Principal(Principal::Standard(read_address(reader)?))
        }
        type_id::PRINCIPAL_CONTRACT => {
            let addr = read_address(reader)?;
            let name = reader.read_name()?;
            ClarityValue::Principal(Principal::Contract(addr, name))
        }
        type_id::RESPONSE_OK => ClarityValue::ResponseOk(Box::new(read_value(reader, depth + 1)?)),
        type_id::RESPONSE_ERR => {
            ClarityValue::ResponseErr(Box::new(read_value(reader, depth + 1)?))
        }
        type_id::OPTIONAL_NONE => ClarityValue::OptionalNone,
        type_id::OPTIONAL_SOME => {
            ClarityValue::OptionalSome(Box::new(read_value(reader, depth + 1)?))
        }
        type_id::LIST => {
            let len = reader.read_u32()? as usize;
            // each element takes at least one byte
            if len > reader.remaining() {
                return Err(WalletError::decode(format!("List length {} exceeds input", len)));
            }
            let mut items = Vec::with_capacity(len);
            for _ in 0..len {
                items.push(read_value(reader, depth + 1)?);
            }
            ClarityValue::List(items)
        }
        type_id::TUPLE => {
            let len = reader.read_u32()? as usize;
            let mut fields = BTreeMap::new();
            for _ in 0..len {
                let name = reader.read_name()?;
                let value = read_value(reader, depth + 1)?;
                if fields.insert(name.clone(), value).is_some() {
                    return Err(WalletError::decode(format!("Duplicate tuple field: {}", name)));
                }
            }
            ClarityValue::Tuple(fields)
        }
        type_id::STRING_ASCII => {
            let bytes = reader.read_long_bytes()?;
            if !bytes.is_ascii() {
                return Err(WalletError::decode("string-ascii contains non-ASCII"));
            }
            ClarityValue::StringAscii(String::from_utf8_lossy(bytes).into_owned())
        }
        type_id::STRING_UTF8 => {
            let bytes = reader.read_long_bytes()?;
            let s = String::from_utf8(bytes.to_vec())
                .map_err(|e| WalletError::decode(format!("Invalid string-utf8: {}", e)))?;
            ClarityValue::StringUtf8(s)
        }
        other => {
            return Err(WalletError::decode(format!(
                "Unknown Clarity type prefix: 0x{:02x}",
                other
            )))
        }
    };
    Ok(value)
}
