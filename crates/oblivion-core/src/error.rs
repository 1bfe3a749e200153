//! # Validation Errors
//!
//! Errors raised while constructing domain primitives. Each variant carries
//! the rejected input and the expected format so that operators can diagnose
//! misconfiguration without guesswork.

use thiserror::Error;

/// Validation errors for domain primitive newtypes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Identity is empty, too long, or contains whitespace/control characters.
    #[error("invalid identity: \"{0}\" (expected 1-256 printable characters without whitespace)")]
    InvalidIdentity(String),

    /// Identity hash is not a 32-byte hex string.
    #[error("invalid identity hash: \"{value}\" ({reason})")]
    InvalidIdentityHash {
        /// The string that failed to parse.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Metadata pointer exceeds the length limit or contains control characters.
    #[error("invalid metadata pointer: {0}")]
    InvalidMetadataPointer(String),

    /// Revocation reason exceeds the length limit or contains control characters.
    #[error("invalid revocation reason: {0}")]
    InvalidReason(String),

    /// Role name is not one of `admin`, `issuer`, `revoker`.
    #[error("unknown role: \"{0}\" (expected admin, issuer or revoker)")]
    UnknownRole(String),

    /// Hex input could not be decoded.
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}
