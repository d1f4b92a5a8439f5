//! Stacks network types
//!
//! `NetworkDescriptor` is what arrives inside a payload: either a bare tag
//! ("mainnet", "testnet", 0, 128) or a full network object. `StacksNetwork`
//! is the resolved form the builder and broadcaster work with.

use crate::error::WalletError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BROADCAST_ENDPOINT: &str = "/v2/transactions";
pub const DEFAULT_FEE_ESTIMATE_ENDPOINT: &str = "/v2/fees/transfer";
pub const DEFAULT_ACCOUNT_ENDPOINT: &str = "/v2/accounts";

pub const CHAIN_ID_MAINNET: u32 = 0x0000_0001;
pub const CHAIN_ID_TESTNET: u32 = 0x8000_0000;

/// Transaction version byte (also the network version tag)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TransactionVersion {
    Mainnet = 0x00,
    Testnet = 0x80,
}

impl TransactionVersion {
    pub fn byte(self) -> u8 {
        self as u8
    }

    pub fn from_byte(byte: u8) -> Result<Self, WalletError> {
        match byte {
            0x00 => Ok(TransactionVersion::Mainnet),
            0x80 => Ok(TransactionVersion::Testnet),
            other => Err(WalletError::InvalidNetworkVersion(other.to_string())),
        }
    }

    pub fn default_chain_id(self) -> u32 {
        match self {
            TransactionVersion::Mainnet => CHAIN_ID_MAINNET,
            TransactionVersion::Testnet => CHAIN_ID_TESTNET,
        }
    }
}

/// Network version as it appears on the wire, not yet validated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawVersion {
    Number(u64),
    Name(String),
}

impl RawVersion {
    /// Resolve to a recognized version, or fail with `InvalidNetworkVersion`
    pub fn resolve(&self) -> Result<TransactionVersion, WalletError> {
        match self {
            RawVersion::Number(0) => Ok(TransactionVersion::Mainnet),
            RawVersion::Number(0x80) => Ok(TransactionVersion::Testnet),
            RawVersion::Number(n) => Err(WalletError::InvalidNetworkVersion(n.to_string())),
            RawVersion::Name(name) => match name.to_lowercase().as_str() {
                "mainnet" => Ok(TransactionVersion::Mainnet),
                "testnet" => Ok(TransactionVersion::Testnet),
                _ => Err(WalletError::InvalidNetworkVersion(name.clone())),
            },
        }
    }
}

impl From<TransactionVersion> for RawVersion {
    fn from(version: TransactionVersion) -> Self {
        RawVersion::Number(version.byte() as u64)
    }
}

/// Network descriptor carried by a transaction payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "DescriptorRepr")]
pub struct NetworkDescriptor {
    pub version: RawVersion,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core_api_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub broadcast_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transfer_fee_estimate_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_endpoint: Option<String>,
}

/// Accepted input shapes for a network descriptor
#[derive(Deserialize)]
#[serde(untagged)]
enum DescriptorRepr {
    Tag(RawVersion),
    Object {
        version: RawVersion,
        #[serde(default, rename = "chainId")]
        chain_id: Option<u32>,
        #[serde(default, rename = "coreApiUrl")]
        core_api_url: Option<String>,
        #[serde(default, rename = "broadcastEndpoint")]
        broadcast_endpoint: Option<String>,
        #[serde(default, rename = "transferFeeEstimateEndpoint")]
        transfer_fee_estimate_endpoint: Option<String>,
        #[serde(default, rename = "accountEndpoint")]
        account_endpoint: Option<String>,
    },
}

impl From<DescriptorRepr> for NetworkDescriptor {
    fn from(repr: DescriptorRepr) -> Self {
        match repr {
            DescriptorRepr::Tag(version) => NetworkDescriptor::tag(version),
            DescriptorRepr::Object {
                version,
                chain_id,
                core_api_url,
                broadcast_endpoint,
                transfer_fee_estimate_endpoint,
                account_endpoint,
            } => NetworkDescriptor {
                version,
                chain_id,
                core_api_url,
                broadcast_endpoint,
                transfer_fee_estimate_endpoint,
                account_endpoint,
            },
        }
    }
}

impl NetworkDescriptor {
    /// Descriptor that only names the network
    pub fn tag(version: impl Into<RawVersion>) -> Self {
        NetworkDescriptor {
            version: version.into(),
            chain_id: None,
            core_api_url: None,
            broadcast_endpoint: None,
            transfer_fee_estimate_endpoint: None,
            account_endpoint: None,
        }
    }

    /// Whether the descriptor is complete enough to estimate fees against
    pub fn has_fee_estimate(&self) -> bool {
        self.core_api_url.is_some() && self.transfer_fee_estimate_endpoint.is_some()
    }

    pub fn transaction_version(&self) -> Result<TransactionVersion, WalletError> {
        self.version.resolve()
    }
}

/// A fully resolved network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StacksNetwork {
    #[serde(with = "version_serde")]
    pub version: TransactionVersion,
    pub chain_id: u32,
    pub core_api_url: String,
    pub broadcast_endpoint: String,
    pub transfer_fee_estimate_endpoint: String,
    pub account_endpoint: String,
}

impl StacksNetwork {
    pub fn new(version: TransactionVersion, core_api_url: &str) -> Self {
        StacksNetwork {
            version,
            chain_id: version.default_chain_id(),
            core_api_url: core_api_url.trim_end_matches('/').to_string(),
            broadcast_endpoint: DEFAULT_BROADCAST_ENDPOINT.to_string(),
            transfer_fee_estimate_endpoint: DEFAULT_FEE_ESTIMATE_ENDPOINT.to_string(),
            account_endpoint: DEFAULT_ACCOUNT_ENDPOINT.to_string(),
        }
    }

    /// Adopt a descriptor that already carries a fee-estimate endpoint
    pub fn from_descriptor(descriptor: &NetworkDescriptor) -> Result<Self, WalletError> {
        let version = descriptor.transaction_version()?;
        let core_api_url = descriptor.core_api_url.as_deref().ok_or_else(|| {
            WalletError::invalid_input("Network descriptor has no coreApiUrl")
        })?;
        let mut network = StacksNetwork::new(version, core_api_url);
        if let Some(chain_id) = descriptor.chain_id {
            network.chain_id = chain_id;
        }
        if let Some(endpoint) = &descriptor.broadcast_endpoint {
            network.broadcast_endpoint = endpoint.clone();
        }
        if let Some(endpoint) = &descriptor.transfer_fee_estimate_endpoint {
            network.transfer_fee_estimate_endpoint = endpoint.clone();
        }
        if let Some(endpoint) = &descriptor.account_endpoint {
            network.account_endpoint = endpoint.clone();
        }
        Ok(network)
    }

    pub fn broadcast_url(&self) -> String {
        format!("{}{}", self.core_api_url, self.broadcast_endpoint)
    }

    pub fn fee_estimate_url(&self) -> String {
        format!("{}{}", self.core_api_url, self.transfer_fee_estimate_endpoint)
    }

    pub fn account_url(&self, address: &str) -> String {
        format!("{}{}/{}?proof=0", self.core_api_url, self.account_endpoint, address)
    }
}

mod version_serde {
    use super::TransactionVersion;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &TransactionVersion, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u8(v.byte())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<TransactionVersion, D::Error> {
        let byte = u8::deserialize(d)?;
        TransactionVersion::from_byte(byte).map_err(de::Error::custom)
    }
}
