//! Application-argument encoding for contract calls.
//!
//! The deployed contract takes an ordered list of byte arrays. Text travels as
//! raw UTF-8 and integers as 8-byte big-endian words (`Btoi` on the contract side).

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::ValidationError;

pub fn encode_str(value: &str) -> Vec<u8> {
    value.as_bytes().to_vec()
}

pub fn encode_uint64(value: u64) -> Vec<u8> {
    value.to_be_bytes().to_vec()
}

pub fn decode_uint64(bytes: &[u8]) -> Option<u64> {
    let word: [u8; 8] = bytes.try_into().ok()?;
    Some(u64::from_be_bytes(word))
}

/// Parses a user-typed quantity. Anything that is not a plain base-10 `u64` is rejected.
///
/// This is the only place a number enters untyped; past it, `u64` bounds every argument.
pub fn parse_amount(field: &'static str, input: &str) -> Result<u64, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::NotANumber {
            field,
            input: input.to_string(),
        });
    }
    trimmed
        .parse()
        .map_err(|_| ValidationError::OutOfRange { field })
}

pub fn utf8_to_base64(value: &str) -> String {
    STANDARD.encode(value.as_bytes())
}

pub fn base64_to_bytes(value: &str) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(value)
}
