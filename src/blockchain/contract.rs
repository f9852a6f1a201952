//! The fixed storage contract interface.

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol;
use alloy::sol_types::SolCall;

use crate::blockchain::types::{BlockchainError, BlockchainResult};

sol! {
    /// Single-slot storage contract.
    interface ISimpleStorage {
        function get() external view returns (uint256);
        function set(uint256 _value) external;
    }
}

/// Parse a configured contract address.
///
/// An empty address means "not configured" and is rejected before any
/// chain call is attempted.
pub fn parse_contract_address(raw: &str) -> BlockchainResult<Address> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(BlockchainError::Config(
            "contract address not set".to_string(),
        ));
    }
    raw.parse()
        .map_err(|e| BlockchainError::Config(format!("invalid contract address '{}': {}", raw, e)))
}

/// Parse a decimal string into a stored value.
pub fn parse_stored_value(raw: &str) -> BlockchainResult<U256> {
    let digits = raw.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(BlockchainError::Encoding(format!(
            "invalid uint256 '{}': expected decimal digits",
            raw
        )));
    }
    U256::from_str_radix(digits, 10)
        .map_err(|e| BlockchainError::Encoding(format!("invalid uint256 '{}': {}", raw, e)))
}

pub fn encode_get() -> Bytes {
    ISimpleStorage::getCall {}.abi_encode().into()
}

pub fn encode_set(value: U256) -> Bytes {
    ISimpleStorage::setCall { _value: value }.abi_encode().into()
}

/// Decode the return data of `get()`.
pub fn decode_get(data: &[u8]) -> BlockchainResult<U256> {
    ISimpleStorage::getCall::abi_decode_returns(data)
        .map_err(|e| BlockchainError::ChainCall(format!("failed to unpack result: {}", e)))
}
