//! Calldata Decoder - raw call bytes to typed intent
//!
//! Decoding is total over well-formed input: an unrecognized selector is
//! a valid outcome (`Unknown`), never an error. Malformed input (not
//! `0x`-hex, odd length, no full selector) yields absence, which callers
//! must treat as "could not classify", not as benign.

use alloy_primitives::U256;

use crate::models::{AmountKind, DecodedAction, NftStandard};
use crate::utils::{
    normalize_address, SELECTOR_BYTES, SEL_EIP2612_PERMIT, SEL_ERC1155_BATCH_TRANSFER,
    SEL_ERC1155_SAFE_TRANSFER, SEL_ERC20_APPROVE, SEL_ERC20_TRANSFER, SEL_ERC20_TRANSFER_FROM,
    SEL_ERC721_SAFE_TRANSFER, SEL_ERC721_SAFE_TRANSFER_DATA, SEL_SET_APPROVAL_FOR_ALL, WORD_BYTES,
};

/// Decode the `data` field of a contract call into a typed action.
pub fn decode(data_hex: &str, to_address: &str) -> Option<DecodedAction> {
    let bytes = calldata_bytes(data_hex)?;
    let token = normalize_token(to_address);
    let selector: [u8; SELECTOR_BYTES] = bytes[..SELECTOR_BYTES].try_into().ok()?;
    let words = Words::new(&bytes[SELECTOR_BYTES..]);

    let action = match selector {
        SEL_ERC20_APPROVE => DecodedAction::ApproveErc20 {
            token,
            spender: words.address(0),
            amount_kind: words.amount_kind(1),
            amount_raw: words.u256(1),
        },
        SEL_ERC20_TRANSFER => DecodedAction::TransferErc20 {
            token,
            to: words.address(0),
            amount_raw: words.u256(1),
        },
        SEL_ERC20_TRANSFER_FROM => DecodedAction::TransferFromErc20 {
            token,
            from: words.address(0),
            to: words.address(1),
            amount_raw: words.u256(2),
        },
        SEL_SET_APPROVAL_FOR_ALL => DecodedAction::SetApprovalForAll {
            token,
            operator: words.address(0),
            approved: words.boolean(1),
        },
        SEL_ERC721_SAFE_TRANSFER | SEL_ERC721_SAFE_TRANSFER_DATA => DecodedAction::TransferNft {
            token,
            from: Some(words.address(0)),
            to: words.address(1),
            token_id_raw: Some(words.u256(2)),
            amount_raw: None,
            standard: NftStandard::Erc721,
            batch: false,
        },
        SEL_ERC1155_SAFE_TRANSFER => DecodedAction::TransferNft {
            token,
            from: Some(words.address(0)),
            to: words.address(1),
            token_id_raw: Some(words.u256(2)),
            amount_raw: Some(words.u256(3)),
            standard: NftStandard::Erc1155,
            batch: false,
        },
        SEL_ERC1155_BATCH_TRANSFER => DecodedAction::TransferNft {
            token,
            from: Some(words.address(0)),
            to: words.address(1),
            // id/amount arrays sit behind dynamic offsets; not needed for severity
            token_id_raw: None,
            amount_raw: None,
            standard: NftStandard::Erc1155,
            batch: true,
        },
        SEL_EIP2612_PERMIT => DecodedAction::PermitEip2612 {
            token,
            spender: words.address(1),
            value_kind: words.amount_kind(2),
            value_raw: words.u256(2),
            deadline_raw: words.u256(3),
        },
        other => DecodedAction::Unknown {
            selector: format!("0x{}", hex::encode(other)),
        },
    };
    Some(action)
}

/// Narrow decoder for the highest-severity ERC-20 shape.
/// Anything that is not an `approve` call yields absence.
pub fn decode_approve(data_hex: &str, to_address: &str) -> Option<DecodedAction> {
    match decode(data_hex, to_address) {
        Some(action @ DecodedAction::ApproveErc20 { .. }) => Some(action),
        _ => None,
    }
}

/// Narrow decoder for `setApprovalForAll` calls
pub fn decode_set_approval_for_all(data_hex: &str, to_address: &str) -> Option<DecodedAction> {
    match decode(data_hex, to_address) {
        Some(action @ DecodedAction::SetApprovalForAll { .. }) => Some(action),
        _ => None,
    }
}

/// Validate `0x` + even-length hex with at least one full selector
fn calldata_bytes(data_hex: &str) -> Option<Vec<u8>> {
    let trimmed = data_hex.trim();
    let rest = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))?;
    if rest.len() < SELECTOR_BYTES * 2 {
        return None;
    }
    // hex::decode rejects odd length and non-hex characters
    hex::decode(rest).ok()
}

fn normalize_token(raw: &str) -> String {
    normalize_address(raw).unwrap_or_else(|| raw.trim().to_lowercase())
}

/// Word-indexed view over the calldata body (everything after the
/// selector). Reads past the end of the body are all-zero.
struct Words<'a> {
    body: &'a [u8],
}

impl<'a> Words<'a> {
    fn new(body: &'a [u8]) -> Self {
        Self { body }
    }

    /// Read word `idx`; a partial trailing word is right-aligned so its
    /// numeric value matches a big-endian read of the available bytes.
    fn word(&self, idx: usize) -> [u8; WORD_BYTES] {
        let mut out = [0u8; WORD_BYTES];
        let start = idx * WORD_BYTES;
        if start >= self.body.len() {
            return out;
        }
        let end = (start + WORD_BYTES).min(self.body.len());
        let avail = &self.body[start..end];
        out[WORD_BYTES - avail.len()..].copy_from_slice(avail);
        out
    }

    fn u256(&self, idx: usize) -> U256 {
        U256::from_be_bytes(self.word(idx))
    }

    /// Addresses are right-justified in a word: the last 20 bytes
    fn address(&self, idx: usize) -> String {
        format!("0x{}", hex::encode(&self.word(idx)[12..]))
    }

    fn boolean(&self, idx: usize) -> bool {
        !self.u256(idx).is_zero()
    }

    fn amount_kind(&self, idx: usize) -> AmountKind {
        classify_amount(self.word(idx))
    }
}

/// Unlimited iff the word is 64 `f` hex chars; the string form and the
/// numeric comparison against 2^256-1 must agree on every input.
fn classify_amount(word: [u8; WORD_BYTES]) -> AmountKind {
    let all_f = hex::encode(word).chars().all(|c| c == 'f');
    if all_f && U256::from_be_bytes(word) == U256::MAX {
        AmountKind::Unlimited
    } else {
        AmountKind::Limited
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = "0xDAC17F958D2ee523a2206206994597C13D831ec7";
    const SPENDER: &str = "0x1111111254eeb25477b68fb85ed929f73a960582";
    const HOLDER: &str = "0x2222222222222222222222222222222222222222";

    fn addr_word(addr: &str) -> String {
        format!("{:0>64}", addr.trim_start_matches("0x"))
    }

    fn uint_word(hex_digits: &str) -> String {
        format!("{:0>64}", hex_digits)
    }

    #[test]
    fn test_decode_approve_unlimited() {
        let data = format!("0x095ea7b3{}{}", addr_word(SPENDER), "f".repeat(64));
        let action = decode(&data, TOKEN).unwrap();
        match action {
            DecodedAction::ApproveErc20 {
                token,
                spender,
                amount_kind,
                amount_raw,
            } => {
                assert_eq!(token, TOKEN.to_lowercase());
                assert_eq!(spender, SPENDER);
                assert_eq!(amount_kind, AmountKind::Unlimited);
                assert_eq!(amount_raw, U256::MAX);
            }
            other => panic!("wrong variant: {:?}", other),
        }
    }

    #[test]
    fn test_decode_approve_limited_one() {
        let data = format!("0x095ea7b3{}{}", addr_word(SPENDER), uint_word("1"));
        let action = decode(&data, TOKEN).unwrap();
        match action {
            DecodedAction::ApproveErc20 {
                amount_kind,
                amount_raw,
                ..
            } => {
                assert_eq!(amount_kind, AmountKind::Limited);
                assert_eq!(amount_raw, U256::from(1u64));
            }
            other => panic!("wrong variant: {:?}", other),
        }
    }

    #[test]
    fn test_decode_transfer() {
        let data = format!("0xa9059cbb{}{}", addr_word(HOLDER), uint_word("de0b6b3a7640000"));
        let action = decode(&data, TOKEN).unwrap();
        match action {
            DecodedAction::TransferErc20 { to, amount_raw, .. } => {
                assert_eq!(to, HOLDER);
                assert_eq!(amount_raw, U256::from(1_000_000_000_000_000_000u128));
            }
            other => panic!("wrong variant: {:?}", other),
        }
    }

    #[test]
    fn test_decode_transfer_from() {
        let data = format!(
            "0x23b872dd{}{}{}",
            addr_word(HOLDER),
            addr_word(SPENDER),
            uint_word("64")
        );
        let action = decode(&data, TOKEN).unwrap();
        match action {
            DecodedAction::TransferFromErc20 { from, to, amount_raw, .. } => {
                assert_eq!(from, HOLDER);
                assert_eq!(to, SPENDER);
                assert_eq!(amount_raw, U256::from(0x64u64));
            }
            other => panic!("wrong variant: {:?}", other),
        }
    }

    #[test]
    fn test_decode_set_approval_for_all() {
        let on = format!("0xa22cb465{}{}", addr_word(SPENDER), uint_word("1"));
        match decode(&on, TOKEN).unwrap() {
            DecodedAction::SetApprovalForAll { operator, approved, .. } => {
                assert_eq!(operator, SPENDER);
                assert!(approved);
            }
            other => panic!("wrong variant: {:?}", other),
        }

        let off = format!("0xa22cb465{}{}", addr_word(SPENDER), uint_word("0"));
        match decode(&off, TOKEN).unwrap() {
            DecodedAction::SetApprovalForAll { approved, .. } => assert!(!approved),
            other => panic!("wrong variant: {:?}", other),
        }
    }

    #[test]
    fn test_decode_erc721_both_signatures() {
        for selector in ["0x42842e0e", "0xb88d4fde"] {
            let data = format!(
                "{}{}{}{}",
                selector,
                addr_word(HOLDER),
                addr_word(SPENDER),
                uint_word("2a")
            );
            match decode(&data, TOKEN).unwrap() {
                DecodedAction::TransferNft {
                    from,
                    to,
                    token_id_raw,
                    standard,
                    batch,
                    ..
                } => {
                    assert_eq!(from.as_deref(), Some(HOLDER));
                    assert_eq!(to, SPENDER);
                    assert_eq!(token_id_raw, Some(U256::from(42u64)));
                    assert_eq!(standard, NftStandard::Erc721);
                    assert!(!batch);
                }
                other => panic!("wrong variant: {:?}", other),
            }
        }
    }

    #[test]
    fn test_decode_erc1155_single_and_batch() {
        let single = format!(
            "0xf242432a{}{}{}{}",
            addr_word(HOLDER),
            addr_word(SPENDER),
            uint_word("1"),
            uint_word("5")
        );
        match decode(&single, TOKEN).unwrap() {
            DecodedAction::TransferNft {
                standard,
                batch,
                amount_raw,
                ..
            } => {
                assert_eq!(standard, NftStandard::Erc1155);
                assert!(!batch);
                assert_eq!(amount_raw, Some(U256::from(5u64)));
            }
            other => panic!("wrong variant: {:?}", other),
        }

        let batch = format!("0x2eb2c2d6{}{}", addr_word(HOLDER), addr_word(SPENDER));
        match decode(&batch, TOKEN).unwrap() {
            DecodedAction::TransferNft { standard, batch, .. } => {
                assert_eq!(standard, NftStandard::Erc1155);
                assert!(batch);
            }
            other => panic!("wrong variant: {:?}", other),
        }
    }

    #[test]
    fn test_decode_permit_unlimited() {
        let data = format!(
            "0xd505accf{}{}{}{}",
            addr_word(HOLDER),
            addr_word(SPENDER),
            "f".repeat(64),
            uint_word("64b8c820")
        );
        match decode(&data, TOKEN).unwrap() {
            DecodedAction::PermitEip2612 {
                spender,
                value_kind,
                value_raw,
                deadline_raw,
                ..
            } => {
                assert_eq!(spender, SPENDER);
                assert_eq!(value_kind, AmountKind::Unlimited);
                assert_eq!(value_raw, U256::MAX);
                assert_eq!(deadline_raw, U256::from(0x64b8c820u64));
            }
            other => panic!("wrong variant: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_selector_is_not_an_error() {
        let data = format!("0xdeadbeef{}", uint_word("1"));
        match decode(&data, TOKEN).unwrap() {
            DecodedAction::Unknown { selector } => assert_eq!(selector, "0xdeadbeef"),
            other => panic!("wrong variant: {:?}", other),
        }
    }

    #[test]
    fn test_malformed_input_is_absent() {
        assert!(decode("", TOKEN).is_none());
        assert!(decode("0x", TOKEN).is_none());
        assert!(decode("0x095ea7", TOKEN).is_none()); // selector incomplete
        assert!(decode("095ea7b3", TOKEN).is_none()); // no 0x prefix
        assert!(decode("0x095ea7b3zz", TOKEN).is_none()); // non-hex
        assert!(decode("0x095ea7b31", TOKEN).is_none()); // odd length
    }

    #[test]
    fn test_missing_words_read_as_zero() {
        // Selector only: spender decodes as the zero address, amount as 0
        match decode("0x095ea7b3", TOKEN).unwrap() {
            DecodedAction::ApproveErc20 {
                spender,
                amount_kind,
                amount_raw,
                ..
            } => {
                assert_eq!(spender, format!("0x{}", "0".repeat(40)));
                assert_eq!(amount_kind, AmountKind::Limited);
                assert_eq!(amount_raw, U256::ZERO);
            }
            other => panic!("wrong variant: {:?}", other),
        }
    }

    #[test]
    fn test_decode_is_deterministic() {
        let data = format!("0x095ea7b3{}{}", addr_word(SPENDER), "f".repeat(64));
        assert_eq!(decode(&data, TOKEN), decode(&data, TOKEN));
    }

    #[test]
    fn test_narrow_helpers_filter_other_shapes() {
        let approve = format!("0x095ea7b3{}{}", addr_word(SPENDER), uint_word("1"));
        let transfer = format!("0xa9059cbb{}{}", addr_word(HOLDER), uint_word("1"));
        assert!(decode_approve(&approve, TOKEN).is_some());
        assert!(decode_approve(&transfer, TOKEN).is_none());

        let set_all = format!("0xa22cb465{}{}", addr_word(SPENDER), uint_word("1"));
        assert!(decode_set_approval_for_all(&set_all, TOKEN).is_some());
        assert!(decode_set_approval_for_all(&approve, TOKEN).is_none());
    }
}
