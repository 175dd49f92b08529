//! Canonical byte encoding shared by blocks and transactions.
//!
//! The canonical form is compact JSON: struct fields in declaration order,
//! no whitespace, byte strings as lowercase hex. Hashes and signatures are
//! computed over these bytes, so any change here forks the chain.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Failure to decode canonical bytes.
#[derive(Debug, Error)]
#[error("canonical decoding failed: {0}")]
pub struct CodecError(#[from] serde_json::Error);

/// Encode a value in canonical form.
pub fn encode<T: Serialize>(value: &T) -> Vec<u8> {
    serde_json::to_vec(value).expect("ledger types always serialize")
}

/// Decode a value from canonical form.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    Ok(serde_json::from_slice(bytes)?)
}
