use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum AddressError {
    #[error("Address must be 40 hex characters, got {0}")]
    InvalidLength(usize),
    #[error("Address contains non-hexadecimal characters")]
    InvalidHex,
}

/// The zero address, used as a null recipient by some nodes
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Normalize an address to lowercase with a single `0x` prefix
pub fn normalize_address(address: &str) -> String {
    let trimmed = address.trim();
    let without_prefix = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    format!("0x{}", without_prefix.to_lowercase())
}

/// Validate that an address has the 20-byte hex shape
pub fn validate_address(address: &str) -> Result<(), AddressError> {
    let normalized = normalize_address(address);
    let body = &normalized[2..];

    if body.len() != 40 {
        return Err(AddressError::InvalidLength(body.len()));
    }

    if !body.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(AddressError::InvalidHex);
    }

    Ok(())
}

/// Whether the address is missing, blank or the zero address
pub fn is_null_address(address: Option<&str>) -> bool {
    match address {
        None => true,
        Some(addr) if addr.trim().is_empty() => true,
        Some(addr) => normalize_address(addr) == ZERO_ADDRESS,
    }
}
