//! Typed post-conditions and their wire format

use crate::address::StacksAddress;
use crate::clarity::{read_address, write_address, ClarityValue};
use crate::codec::{decode_hex, write_name, ByteOrName, ByteReader};
use crate::error::WalletError;
use num_bigint::BigUint;
use serde::{Deserialize, Deserializer, Serialize};

mod type_id {
    pub const STX: u8 = 0x00;
    pub const FUNGIBLE: u8 = 0x01;
    pub const NON_FUNGIBLE: u8 = 0x02;

    pub const PRINCIPAL_ORIGIN: u8 = 0x01;
    pub const PRINCIPAL_STANDARD: u8 = 0x02;
    pub const PRINCIPAL_CONTRACT: u8 = 0x03;
}

/// Whether post-conditions not listed are allowed or denied.
///
/// Deserializes from `"allow"`/`"deny"` or the wire byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PostConditionMode {
    Allow = 0x01,
    #[default]
    Deny = 0x02,
}

impl PostConditionMode {
    pub fn from_byte(byte: u8) -> Result<Self, WalletError> {
        match byte {
            0x01 => Ok(PostConditionMode::Allow),
            0x02 => Ok(PostConditionMode::Deny),
            other => Err(WalletError::decode(format!("Invalid post-condition mode: {}", other))),
        }
    }
}

impl<'de> Deserialize<'de> for PostConditionMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ByteOrName {
            expecting: "post-condition mode",
            names: &[("allow", PostConditionMode::Allow), ("deny", PostConditionMode::Deny)],
            from_byte: PostConditionMode::from_byte,
        })
    }
}

/// Principal a post-condition applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostConditionPrincipal {
    /// The transaction origin, whatever account signs it
    Origin,
    Standard(StacksAddress),
    Contract(StacksAddress, String),
}

impl std::str::FromStr for PostConditionPrincipal {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "origin" {
            return Ok(PostConditionPrincipal::Origin);
        }
        match s.parse()? {
            crate::address::Principal::Standard(addr) => Ok(PostConditionPrincipal::Standard(addr)),
            crate::address::Principal::Contract(addr, name) => {
                Ok(PostConditionPrincipal::Contract(addr, name))
            }
        }
    }
}

/// Comparison applied to STX and fungible token amounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FungibleConditionCode {
    #[serde(rename = "eq")]
    Equal = 0x01,
    #[serde(rename = "gt")]
    Greater = 0x02,
    #[serde(rename = "gte")]
    GreaterEqual = 0x03,
    #[serde(rename = "lt")]
    Less = 0x04,
    #[serde(rename = "lte")]
    LessEqual = 0x05,
}

impl FungibleConditionCode {
    fn from_byte(byte: u8) -> Result<Self, WalletError> {
        match byte {
            0x01 => Ok(FungibleConditionCode::Equal),
            0x02 => Ok(FungibleConditionCode::Greater),
            0x03 => Ok(FungibleConditionCode::GreaterEqual),
            0x04 => Ok(FungibleConditionCode::Less),
            0x05 => Ok(FungibleConditionCode::LessEqual),
            other => Err(WalletError::decode(format!("Invalid fungible condition code: {}", other))),
        }
    }
}

/// Whether a non-fungible asset leaves the principal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NonFungibleConditionCode {
    Sent = 0x10,
    NotSent = 0x11,
}

impl NonFungibleConditionCode {
    fn from_byte(byte: u8) -> Result<Self, WalletError> {
        match byte {
            0x10 => Ok(NonFungibleConditionCode::Sent),
            0x11 => Ok(NonFungibleConditionCode::NotSent),
            other => Err(WalletError::decode(format!(
                "Invalid non-fungible condition code: {}",
                other
            ))),
        }
    }
}

/// Fully qualified asset identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetInfo {
    pub contract_address: StacksAddress,
    pub contract_name: String,
    pub asset_name: String,
}

/// A normalized post-condition; amounts are arbitrary precision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostCondition {
    Stx {
        principal: PostConditionPrincipal,
        code: FungibleConditionCode,
        amount: BigUint,
    },
    Fungible {
        principal: PostConditionPrincipal,
        asset: AssetInfo,
        code: FungibleConditionCode,
        amount: BigUint,
    },
    NonFungible {
        principal: PostConditionPrincipal,
        asset: AssetInfo,
        asset_value: ClarityValue,
        code: NonFungibleConditionCode,
    },
}

impl PostCondition {
    pub fn write_to(&self, out: &mut Vec<u8>) -> Result<(), WalletError> {
        match self {
            PostCondition::Stx {
                principal,
                code,
                amount,
            } => {
                out.push(type_id::STX);
                write_principal(out, principal)?;
                out.push(*code as u8);
                out.extend_from_slice(&amount_to_u64(amount)?.to_be_bytes());
            }
            PostCondition::Fungible {
                principal,
                asset,
                code,
                amount,
            } => {
                out.push(type_id::FUNGIBLE);
                write_principal(out, principal)?;
                write_asset_info(out, asset)?;
                out.push(*code as u8);
                out.extend_from_slice(&amount_to_u64(amount)?.to_be_bytes());
            }
            PostCondition::NonFungible {
                principal,
                asset,
                asset_value,
                code,
            } => {
                out.push(type_id::NON_FUNGIBLE);
                write_principal(out, principal)?;
                write_asset_info(out, asset)?;
                asset_value.write_to(out)?;
                out.push(*code as u8);
            }
        }
        Ok(())
    }

    pub fn serialize(&self) -> Result<Vec<u8>, WalletError> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        Ok(out)
    }

    /// Read one post-condition, leaving the reader after it
    pub fn read_from(reader: &mut ByteReader<'_>) -> Result<Self, WalletError> {
        let kind = reader.read_u8()?;
        match kind {
            type_id::STX => {
                let principal = read_principal(reader)?;
                let code = FungibleConditionCode::from_byte(reader.read_u8()?)?;
                let amount = BigUint::from(reader.read_u64()?);
                Ok(PostCondition::Stx {
                    principal,
                    code,
                    amount,
                })
            }
            type_id::FUNGIBLE => {
                let principal = read_principal(reader)?;
                let asset = read_asset_info(reader)?;
                let code = FungibleConditionCode::from_byte(reader.read_u8()?)?;
                let amount = BigUint::from(reader.read_u64()?);
                Ok(PostCondition::Fungible {
                    principal,
                    asset,
                    code,
                    amount,
                })
            }
            type_id::NON_FUNGIBLE => {
                let principal = read_principal(reader)?;
                let asset = read_asset_info(reader)?;
                let asset_value = ClarityValue::read_from(reader)?;
                let code = NonFungibleConditionCode::from_byte(reader.read_u8()?)?;
                Ok(PostCondition::NonFungible {
                    principal,
                    asset,
                    asset_value,
                    code,
                })
            }
            other => Err(WalletError::decode(format!(
                "Unknown post-condition type: 0x{:02x}",
                other
            ))),
        }
    }

    /// Decode a hex-serialized post-condition.
    ///
    /// The reader starts at offset 0 and must consume the whole buffer;
    /// trailing bytes are rejected.
    pub fn from_hex(s: &str) -> Result<Self, WalletError> {
        let bytes = decode_hex(s)?;
        let mut reader = ByteReader::new(&bytes);
        let condition = Self::read_from(&mut reader)?;
        reader.expect_end()?;
        Ok(condition)
    }
}

/// Narrow an arbitrary-precision amount to the 64-bit wire field
pub fn amount_to_u64(amount: &BigUint) -> Result<u64, WalletError> {
    u64::try_from(amount)
        .map_err(|_| WalletError::invalid_input(format!("Amount {} exceeds 64 bits", amount)))
}

fn write_principal(out: &mut Vec<u8>, principal: &PostConditionPrincipal) -> Result<(), WalletError> {
    match principal {
        PostConditionPrincipal::Origin => out.push(type_id::PRINCIPAL_ORIGIN),
        PostConditionPrincipal::Standard(addr) => {
            out.push(type_id::PRINCIPAL_STANDARD);
            write_address(out, addr);
        }
        PostConditionPrincipal::Contract(addr, name) => {
            out.push(type_id::PRINCIPAL_CONTRACT);
            write_address(out, addr);
            write_name(out, name)?;
        }
    }
    Ok(())
}

fn read_principal(reader: &mut ByteReader<'_>) -> Result<PostConditionPrincipal, WalletError> {
    match reader.read_u8()? {
        type_id::PRINCIPAL_ORIGIN => Ok(PostConditionPrincipal::Origin),
        type_id::PRINCIPAL_STANDARD => Ok(PostConditionPrincipal::Standard(read_address(reader)?)),
        type_id::PRINCIPAL_CONTRACT => {
            let addr = read_address(reader)?;
            let name = reader.read_name()?;
            Ok(PostConditionPrincipal::Contract(addr, name))
        }
        other => Err(WalletError::decode(format!(
            "Unknown post-condition principal: 0x{:02x}",
            other
        ))),
    }
}

fn write_asset_info(out: &mut Vec<u8>, asset: &AssetInfo) -> Result<(), WalletError> {
    write_address(out, &asset.contract_address);
    write_name(out, &asset.contract_name)?;
    write_name(out, &asset.asset_name)
}

fn read_asset_info(reader: &mut ByteReader<'_>) -> Result<AssetInfo, WalletError> {
    Ok(AssetInfo {
        contract_address: read_address(reader)?,
        contract_name: reader.read_name()?,
        asset_name: reader.read_name()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> StacksAddress {
        "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7".parse().unwrap()
    }

    fn asset() -> AssetInfo {
        AssetInfo {
            contract_address: address(),
            contract_name: "nft-collection".to_string(),
            asset_name: "punk".to_string(),
        }
    }

    #[test]
    fn test_stx_post_condition_bytes() {
        let pc = PostCondition::Stx {
            principal: PostConditionPrincipal::Origin,
            code: FungibleConditionCode::LessEqual,
            amount: BigUint::from(1000u32),
        };
        assert_eq!(
            hex::encode(pc.serialize().unwrap()),
            "00010500000000000003e8"
        );
    }

    #[test]
    fn test_non_fungible_from_hex() {
        let pc = PostCondition::NonFungible {
            principal: PostConditionPrincipal::Standard(address()),
            asset: asset(),
            asset_value: ClarityValue::UInt(42),
            code: NonFungibleConditionCode::Sent,
        };
        let hex = hex::encode(pc.serialize().unwrap());
        assert_eq!(PostCondition::from_hex(&hex).unwrap(), pc);
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let pc = PostCondition::Fungible {
            principal: PostConditionPrincipal::Contract(address(), "vault".to_string()),
            asset: asset(),
            code: FungibleConditionCode::GreaterEqual,
            amount: BigUint::from(5u32),
        };
        let mut bytes = pc.serialize().unwrap();
        bytes.push(0x00);
        assert!(matches!(
            PostCondition::from_hex(&hex::encode(bytes)),
            Err(WalletError::Decode(_))
        ));
    }

    #[test]
    fn test_amount_overflow() {
        let pc = PostCondition::Stx {
            principal: PostConditionPrincipal::Origin,
            code: FungibleConditionCode::Equal,
            amount: BigUint::from(u64::MAX) + 1u32,
        };
        assert!(pc.serialize().is_err());
    }

    #[test]
    fn test_principal_from_str() {
        assert_eq!(
            "origin".parse::<PostConditionPrincipal>().unwrap(),
            PostConditionPrincipal::Origin
        );
        assert!(matches!(
            "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7.vault".parse::<PostConditionPrincipal>(),
            Ok(PostConditionPrincipal::Contract(_, _))
        ));
    }
}
