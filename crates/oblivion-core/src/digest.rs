//! # SHA-256 and Hex Helpers
//!
//! Identity commitments, mock proofs, and the audit hash chain all use
//! SHA-256. Hex is the only wire encoding for binary values in the stack.

use sha2::{Digest, Sha256};

use crate::error::ValidationError;

/// Compute the raw SHA-256 digest of `data`.
pub fn sha256_raw(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Encode bytes as a lowercase hex string (no prefix).
pub fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Decode a hex string into bytes. An optional `0x` prefix is accepted.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidHex`] on odd length or non-hex characters.
pub fn hex_decode(s: &str) -> Result<Vec<u8>, ValidationError> {
    let s = s.trim();
    let s = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    if s.len() % 2 != 0 {
        return Err(ValidationError::InvalidHex(format!(
            "odd length: {}",
            s.len()
        )));
    }
    if !s.is_ascii() {
        return Err(ValidationError::InvalidHex("non-ASCII input".to_string()));
    }
    (0..s.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&s[i..i + 2], 16)
                .map_err(|e| ValidationError::InvalidHex(format!("position {i}: {e}")))
        })
        .collect()
}
