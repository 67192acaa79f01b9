use alloy_primitives::U256;
use once_cell::sync::Lazy;
use thiserror::Error;

/// Largest exponent with 10^n representable in 256 bits
pub const MAX_DECIMALS: u8 = 77;

static POWERS_OF_TEN: Lazy<Vec<U256>> = Lazy::new(|| {
    let ten = U256::from(10u64);
    let mut powers = Vec::with_capacity(MAX_DECIMALS as usize + 1);
    let mut current = U256::from(1u64);
    powers.push(current);
    for _ in 0..MAX_DECIMALS {
        current *= ten;
        powers.push(current);
    }
    powers
});

#[derive(Error, Debug, PartialEq)]
pub enum QuantityError {
    #[error("Invalid hex quantity: {0}")]
    InvalidHex(String),
    #[error("Quantity does not fit in 64 bits: {0}")]
    Overflow(String),
}

/// 10^decimals, or `None` when it does not fit in 256 bits
pub fn power_of_ten(decimals: u8) -> Option<U256> {
    POWERS_OF_TEN.get(decimals as usize).copied()
}

/// `floor(raw / 10^decimals)`; zero when the divisor exceeds 256 bits,
/// since any 256-bit value is smaller than it
pub fn adjust_supply(raw: U256, decimals: u8) -> U256 {
    match power_of_ten(decimals) {
        Some(divisor) => raw / divisor,
        None => U256::ZERO,
    }
}

/// Render a base-unit amount as a decimal string with trailing zeros trimmed
pub fn format_units(value: U256, decimals: u8) -> String {
    let digits = value.to_string();
    let decimals = decimals as usize;
    if decimals == 0 {
        return digits;
    }

    let padded = if digits.len() <= decimals {
        format!("{}{}", "0".repeat(decimals - digits.len() + 1), digits)
    } else {
        digits
    };

    let (integer, fraction) = padded.split_at(padded.len() - decimals);
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        integer.to_string()
    } else {
        format!("{}.{}", integer, fraction)
    }
}

/// Parse a JSON-RPC hex quantity; a bare `0x` reads as zero
pub fn parse_quantity(hex: &str) -> Result<U256, QuantityError> {
    let body = strip_hex_prefix(hex.trim())
        .ok_or_else(|| QuantityError::InvalidHex(hex.to_string()))?;
    if body.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(body, 16).map_err(|_| QuantityError::InvalidHex(hex.to_string()))
}

/// Parse a hex quantity that must fit in a `u64` (heights, statuses)
pub fn parse_hex_u64(hex: &str) -> Result<u64, QuantityError> {
    let value = parse_quantity(hex)?;
    u64::try_from(value).map_err(|_| QuantityError::Overflow(hex.to_string()))
}

/// Encode a block height as the hex tag `eth_getBlockByNumber` expects
pub fn to_hex_quantity(value: u64) -> String {
    format!("0x{:x}", value)
}

fn strip_hex_prefix(value: &str) -> Option<&str> {
    value.strip_prefix("0x").or_else(|| value.strip_prefix("0X"))
}
