use alloy_primitives::{hex, U256};
use alloy_sol_types::{sol, SolCall};
use thiserror::Error;

sol! {
    /// ERC-20 metadata accessors
    interface IERC20Metadata {
        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function totalSupply() external view returns (uint256);
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum AbiError {
    #[error("Call returned no data")]
    Empty,
    #[error("Invalid hex data: {0}")]
    InvalidHex(String),
    #[error("ABI decoding failed: {0}")]
    Decode(String),
    #[error("bytes32 value is not printable text")]
    NotText,
}

impl From<alloy_sol_types::Error> for AbiError {
    fn from(err: alloy_sol_types::Error) -> Self {
        AbiError::Decode(err.to_string())
    }
}

/// The read-only accessors a contract must answer to count as a token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accessor {
    Name,
    Symbol,
    Decimals,
    TotalSupply,
}

impl Accessor {
    pub const ALL: [Accessor; 4] = [
        Accessor::Name,
        Accessor::Symbol,
        Accessor::Decimals,
        Accessor::TotalSupply,
    ];

    /// `eth_call` input data; the accessors take no arguments so this is
    /// the bare four-byte selector
    pub fn selector(&self) -> String {
        let calldata = match self {
            Accessor::Name => IERC20Metadata::nameCall {}.abi_encode(),
            Accessor::Symbol => IERC20Metadata::symbolCall {}.abi_encode(),
            Accessor::Decimals => IERC20Metadata::decimalsCall {}.abi_encode(),
            Accessor::TotalSupply => IERC20Metadata::totalSupplyCall {}.abi_encode(),
        };
        format!("0x{}", hex::encode(calldata))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Accessor::Name => "name",
            Accessor::Symbol => "symbol",
            Accessor::Decimals => "decimals",
            Accessor::TotalSupply => "totalSupply",
        }
    }
}

const WORD: usize = 32;

/// Decode `eth_call` output; a contract without code answers `0x`
pub fn decode_hex(data: &str) -> Result<Vec<u8>, AbiError> {
    let bytes = hex::decode(data.trim()).map_err(|e| AbiError::InvalidHex(e.to_string()))?;
    if bytes.is_empty() {
        return Err(AbiError::Empty);
    }
    Ok(bytes)
}

pub fn decode_name(data: &[u8]) -> Result<String, AbiError> {
    decode_text(data, IERC20Metadata::nameCall::abi_decode_returns)
}

pub fn decode_symbol(data: &[u8]) -> Result<String, AbiError> {
    decode_text(data, IERC20Metadata::symbolCall::abi_decode_returns)
}

/// Values above 255 fail validation instead of being truncated
pub fn decode_decimals(data: &[u8]) -> Result<u8, AbiError> {
    if data.is_empty() {
        return Err(AbiError::Empty);
    }
    Ok(IERC20Metadata::decimalsCall::abi_decode_returns_validate(data)?)
}

pub fn decode_total_supply(data: &[u8]) -> Result<U256, AbiError> {
    if data.is_empty() {
        return Err(AbiError::Empty);
    }
    Ok(IERC20Metadata::totalSupplyCall::abi_decode_returns(data)?)
}

/// ABI `string` needs an offset and a length word; a single word is read
/// as `bytes32`, which some older tokens return for name and symbol
fn decode_text(
    data: &[u8],
    decode_string: fn(&[u8]) -> Result<String, alloy_sol_types::Error>,
) -> Result<String, AbiError> {
    match data.len() {
        0 => Err(AbiError::Empty),
        WORD => decode_bytes32_text(data),
        len if len < 2 * WORD => Err(AbiError::Decode(format!("string return too short: {} bytes", len))),
        _ => Ok(decode_string(data)?),
    }
}

/// Right-padded printable ASCII; a left-padded integer word is rejected
fn decode_bytes32_text(word: &[u8]) -> Result<String, AbiError> {
    let end = word.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
    let text = &word[..end];
    if text.is_empty() || !text.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
        return Err(AbiError::NotText);
    }
    Ok(String::from_utf8_lossy(text).into_owned())
}
