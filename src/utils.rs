//! Utility functions and type conversions for chain operations.
//!
//! This module bridges the type systems used throughout the keeper: Alloy's
//! `U256`/`Address`/`B256` on the wire and `BigUint`-backed fixed-decimal
//! values in the arbitrage engine.
//!
//! All conversion functions surface failures as `UtilityError` rather than
//! panicking, so malformed chain data or configuration is caught early.

use crate::errors::UtilityError;
use crate::UtilityResult;
use alloy::primitives::{Address, B256, U256};
use num_bigint::BigUint;
use std::str::FromStr;

/// Parse a string representation of an Ethereum address.
///
/// Accepts addresses with or without the "0x" prefix. The address must be
/// exactly 20 bytes (40 hex characters).
///
/// # Errors
///
/// Returns `UtilityError::AddressParsingFailed` when the input is not a valid
/// hex address.
pub fn parse_address(s: &str) -> UtilityResult<Address> {
    Address::from_str(s.trim().trim_start_matches("0x")).map_err(|source| {
        UtilityError::AddressParsingFailed {
            input: s.to_string(),
            source: alloy::primitives::AddressError::Hex(source),
        }
    })
}

/// Convert a U256 value to a BigUint.
///
/// Lossless; used whenever an on-chain amount enters the arbitrage engine.
pub fn u256_to_biguint(val: U256) -> BigUint {
    BigUint::from_bytes_be(&val.to_be_bytes::<32>())
}

/// Convert a BigUint to a U256 value.
///
/// # Errors
///
/// Returns `UtilityError::ValueTooLarge` if the value does not fit in 256 bits.
pub fn biguint_to_u256(val: &BigUint) -> UtilityResult<U256> {
    let bytes = val.to_bytes_be();
    if bytes.len() > 32 {
        return Err(UtilityError::ValueTooLarge);
    }
    let mut u256_bytes = [0u8; 32];
    u256_bytes[32 - bytes.len()..].copy_from_slice(&bytes);
    Ok(U256::from_be_bytes(u256_bytes))
}

/// Convert a U256 amount to `u128`, as required by OASIS `take`.
///
/// # Errors
///
/// Returns `UtilityError::ValueTooLarge` if the value exceeds `u128::MAX`.
pub fn u256_to_u128(val: U256) -> UtilityResult<u128> {
    u128::try_from(val).map_err(|_| UtilityError::ValueTooLarge)
}

/// OASIS order ids are `uint256` in storage and `bytes32` in `take`.
pub fn order_id_to_b256(id: U256) -> B256 {
    B256::from(id.to_be_bytes::<32>())
}

/// Shortened `0x1234…abcd` rendering for log fields and fallback symbols.
pub fn short_address(address: &Address) -> String {
    let full = format!("{address:#x}");
    format!("{}…{}", &full[..6], &full[full.len() - 4..])
}
