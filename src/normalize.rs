//! Payload normalization
//!
//! Turns a wire-level [`TransactionPayload`] into typed values: Clarity
//! arguments and post-conditions are decoded from hex, amounts become
//! arbitrary-precision integers. No network or key access happens here.

use crate::address::{Principal, StacksAddress};
use crate::clarity::ClarityValue;
use crate::codec::parse_uint;
use crate::error::WalletError;
use crate::network::NetworkDescriptor;
use crate::payload::{
    AssetJson, PostConditionInput, StructuredPostCondition, TransactionKind, TransactionPayload,
    WireAmount,
};
use crate::post_condition::{AssetInfo, PostCondition, PostConditionMode, PostConditionPrincipal};
use crate::transaction::AnchorMode;
use num_bigint::BigUint;

/// A payload whose arguments, post-conditions and amounts are typed
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedPayload {
    pub network: Option<NetworkDescriptor>,
    pub public_key: Option<String>,
    pub stx_address: Option<String>,
    pub post_condition_mode: PostConditionMode,
    pub post_conditions: Vec<PostCondition>,
    pub anchor_mode: AnchorMode,
    pub kind: NormalizedKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizedKind {
    ContractCall {
        contract_address: StacksAddress,
        contract_name: String,
        function_name: String,
        function_args: Vec<ClarityValue>,
    },
    ContractDeploy {
        contract_name: String,
        code_body: String,
    },
    StxTransfer {
        recipient: Principal,
        amount: BigUint,
        memo: String,
    },
}

/// Normalize a wire payload. The input is left untouched.
pub fn normalize_payload(payload: &TransactionPayload) -> Result<NormalizedPayload, WalletError> {
    let post_conditions = payload
        .post_conditions
        .iter()
        .map(normalize_post_condition)
        .collect::<Result<Vec<_>, _>>()?;

    let kind = match &payload.kind {
        TransactionKind::ContractCall {
            contract_address,
            contract_name,
            function_name,
            function_args,
        } => NormalizedKind::ContractCall {
            contract_address: contract_address.parse()?,
            contract_name: contract_name.clone(),
            function_name: function_name.clone(),
            function_args: function_args
                .iter()
                .map(|arg| ClarityValue::from_hex(arg))
                .collect::<Result<Vec<_>, _>>()?,
        },
        TransactionKind::ContractDeploy {
            contract_name,
            code_body,
        } => NormalizedKind::ContractDeploy {
            contract_name: contract_name.clone(),
            code_body: code_body.clone(),
        },
        TransactionKind::StxTransfer {
            recipient,
            amount,
            memo,
        } => NormalizedKind::StxTransfer {
            recipient: recipient.parse()?,
            amount: parse_amount(amount, 10)?,
            memo: memo.clone().unwrap_or_default(),
        },
    };

    Ok(NormalizedPayload {
        network: payload.network.clone(),
        public_key: payload.public_key.clone(),
        stx_address: payload.stx_address.clone(),
        post_condition_mode: payload.post_condition_mode.unwrap_or_default(),
        post_conditions,
        anchor_mode: payload.anchor_mode.unwrap_or_default(),
        kind,
    })
}

/// Decode one post-condition. Hex input must hold exactly one condition.
pub fn normalize_post_condition(input: &PostConditionInput) -> Result<PostCondition, WalletError> {
    match input {
        PostConditionInput::Hex(hex) => PostCondition::from_hex(hex),
        PostConditionInput::Structured(pc) => normalize_structured(pc),
    }
}

fn normalize_structured(pc: &StructuredPostCondition) -> Result<PostCondition, WalletError> {
    match pc {
        StructuredPostCondition::Stx {
            principal,
            condition_code,
            amount,
        } => Ok(PostCondition::Stx {
            principal: parse_principal(principal)?,
            code: *condition_code,
            amount: parse_amount(amount, 16)?,
        }),
        StructuredPostCondition::Fungible {
            principal,
            asset,
            condition_code,
            amount,
        } => Ok(PostCondition::Fungible {
            principal: parse_principal(principal)?,
            asset: asset_info(asset)?,
            code: *condition_code,
            amount: parse_amount(amount, 16)?,
        }),
        StructuredPostCondition::NonFungible {
            principal,
            asset,
            asset_value,
            condition_code,
        } => Ok(PostCondition::NonFungible {
            principal: parse_principal(principal)?,
            asset: asset_info(asset)?,
            asset_value: ClarityValue::from_hex(asset_value)?,
            code: *condition_code,
        }),
    }
}

fn parse_principal(s: &str) -> Result<PostConditionPrincipal, WalletError> {
    s.parse()
}

fn asset_info(asset: &AssetJson) -> Result<AssetInfo, WalletError> {
    Ok(AssetInfo {
        contract_address: asset.contract_address.parse()?,
        contract_name: asset.contract_name.clone(),
        asset_name: asset.asset_name.clone(),
    })
}

/// Parse a wire amount. Numbers are taken as-is, strings in `radix`.
pub fn parse_amount(amount: &WireAmount, radix: u32) -> Result<BigUint, WalletError> {
    match amount {
        WireAmount::Number(n) => Ok(BigUint::from(*n)),
        WireAmount::Text(text) => {
            let digits = if radix == 16 {
                text.strip_prefix("0x").unwrap_or(text)
            } else {
                text.as_str()
            };
            if digits.is_empty() {
                return Err(WalletError::decode("Empty amount"));
            }
            parse_uint(digits, radix)
                .ok_or_else(|| WalletError::decode(format!("Invalid amount: {}", text)))
        }
    }
}
