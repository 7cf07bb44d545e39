//! EIP-2612 permit detection for sign-typed-data requests
//!
//! A `Permit` signature moves no funds by itself but authorizes the same
//! spending power as an on-chain `approve`, so it decodes into the same
//! action and flows through the same policy rules.

use alloy_primitives::U256;
use serde_json::Value;
use std::str::FromStr;

use crate::models::{AmountKind, DecodedAction};
use crate::utils::normalize_address;

/// Extract an EIP-2612 permit from `eth_signTypedData*` params.
///
/// Params usually carry the typed-data payload as a JSON string next to
/// the signer address; some wallets pass the object directly. Anything
/// that is not a `Permit` payload yields absence.
pub fn permit_from_params(params: &Value) -> Option<DecodedAction> {
    let list = params.as_array()?;
    list.iter()
        .filter_map(candidate_payload)
        .find_map(|payload| decode_permit(&payload))
}

fn candidate_payload(entry: &Value) -> Option<Value> {
    match entry {
        Value::Object(_) => Some(entry.clone()),
        Value::String(raw) => serde_json::from_str::<Value>(raw).ok(),
        _ => None,
    }
}

/// Decode a typed-data payload whose `primaryType` is `Permit`
pub fn decode_permit(payload: &Value) -> Option<DecodedAction> {
    if payload.get("primaryType")?.as_str()? != "Permit" {
        return None;
    }
    let domain = payload.get("domain")?;
    let message = payload.get("message")?;

    let token = normalize_address(domain.get("verifyingContract")?.as_str()?)?;
    let spender = normalize_address(message.get("spender")?.as_str()?)?;
    let value_raw = parse_u256(message.get("value")?)?;
    let deadline_raw = message
        .get("deadline")
        .and_then(parse_u256)
        .unwrap_or(U256::ZERO);

    let value_kind = if value_raw == U256::MAX {
        AmountKind::Unlimited
    } else {
        AmountKind::Limited
    };

    Some(DecodedAction::PermitEip2612 {
        token,
        spender,
        value_kind,
        value_raw,
        deadline_raw,
    })
}

/// Typed-data numbers arrive as decimal strings, hex strings, or plain
/// JSON numbers depending on the wallet tooling
fn parse_u256(value: &Value) -> Option<U256> {
    match value {
        Value::String(raw) => U256::from_str(raw.trim()).ok(),
        Value::Number(num) => num.as_u64().map(U256::from),
        _ => None,
    }
}
