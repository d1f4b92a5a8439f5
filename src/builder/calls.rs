//! Per-kind transaction payload construction

use crate::address::{Principal, StacksAddress};
use crate::clarity::ClarityValue;
use crate::error::WalletError;
use crate::normalize::NormalizedKind;
use crate::transaction::{encode_memo, TxPayload};
use num_bigint::BigUint;

/// Longest contract or function name the chain accepts
pub const MAX_NAME_LENGTH: usize = 128;

/// Build the transaction body for a normalized payload kind
pub fn build_payload(kind: &NormalizedKind) -> Result<TxPayload, WalletError> {
    match kind {
        NormalizedKind::ContractCall {
            contract_address,
            contract_name,
            function_name,
            function_args,
        } => build_contract_call(contract_address, contract_name, function_name, function_args),
        NormalizedKind::ContractDeploy {
            contract_name,
            code_body,
        } => build_contract_deploy(contract_name, code_body),
        NormalizedKind::StxTransfer {
            recipient,
            amount,
            memo,
        } => build_token_transfer(recipient, amount, memo),
    }
}

fn build_contract_call(
    contract_address: &StacksAddress,
    contract_name: &str,
    function_name: &str,
    function_args: &[ClarityValue],
) -> Result<TxPayload, WalletError> {
    validate_name("contract", contract_name)?;
    validate_name("function", function_name)?;

    Ok(TxPayload::ContractCall {
        contract_address: *contract_address,
        contract_name: contract_name.to_string(),
        function_name: function_name.to_string(),
        function_args: function_args.to_vec(),
    })
}

fn build_contract_deploy(contract_name: &str, code_body: &str) -> Result<TxPayload, WalletError> {
    validate_name("contract", contract_name)?;

    Ok(TxPayload::SmartContract {
        contract_name: contract_name.to_string(),
        code_body: code_body.to_string(),
    })
}

fn build_token_transfer(
    recipient: &Principal,
    amount: &BigUint,
    memo: &str,
) -> Result<TxPayload, WalletError> {
    Ok(TxPayload::TokenTransfer {
        recipient: recipient.clone(),
        amount: amount.clone(),
        memo: encode_memo(memo)?,
    })
}

/// Clarity names: a letter, then letters, digits, `-`, `_`, `!`, `?`
fn validate_name(what: &str, name: &str) -> Result<(), WalletError> {
    let mut chars = name.chars();
    let starts_with_letter = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    let rest_valid = chars.all(|c| c.is_ascii_alphanumeric() || "-_!?".contains(c));

    if !starts_with_letter || !rest_valid || name.len() > MAX_NAME_LENGTH {
        return Err(WalletError::invalid_input(format!(
            "Invalid {} name: {:?}",
            what, name
        )));
    }
    Ok(())
}
