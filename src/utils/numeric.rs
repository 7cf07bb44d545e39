//! Integer-only display formatting for token amounts.
//!
//! Raw amounts stay `U256` end to end; nothing here ever passes through
//! a float, so an unlimited approval prints exactly, never as `1.15e77`.

use alloy_primitives::U256;

/// Format a raw amount against a decimal scale.
///
/// The fractional part is floored at `max_fraction_digits` (no rounding)
/// and trailing zeros are trimmed. Never produces scientific notation.
pub fn format_units(value: U256, decimals: u32, max_fraction_digits: usize) -> String {
    if decimals == 0 {
        return value.to_string();
    }
    let divisor = U256::from(10u64).pow(U256::from(decimals));
    let whole = value / divisor;
    let remainder = value % divisor;

    if max_fraction_digits == 0 || remainder.is_zero() {
        return whole.to_string();
    }

    // Zero-pad the remainder to the full decimal width, then floor-truncate.
    let mut fraction = format!("{:0>width$}", remainder, width = decimals as usize);
    fraction.truncate(max_fraction_digits);
    let fraction = fraction.trim_end_matches('0');

    if fraction.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{}", whole, fraction)
    }
}

/// Wei to whole-ether display, floored at six fractional digits
pub fn wei_to_eth_display(wei: U256) -> String {
    format_units(wei, 18, 6)
}
