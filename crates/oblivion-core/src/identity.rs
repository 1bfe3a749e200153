//! # Identity Newtypes
//!
//! Domain-primitive newtypes for the registry. Each identifier is a distinct
//! type. You cannot pass an [`IdentityHash`] where an [`Identity`] is
//! expected, or a raw integer where a [`CredentialId`] is expected.
//!
//! ## Validation
//!
//! String-based types ([`Identity`], [`MetadataPointer`]) and the hex-encoded
//! [`IdentityHash`] validate at construction. [`CredentialId`] is always
//! valid by construction; whether it refers to an issued credential is the
//! registry's concern.

use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::digest::{hex_decode, sha256_raw, to_hex};
use crate::error::ValidationError;

/// Maximum length of an [`Identity`] string.
const MAX_IDENTITY_LEN: usize = 256;

/// Maximum length of a [`MetadataPointer`].
const MAX_METADATA_POINTER_LEN: usize = 2048;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// An actor or credential holder: a wallet address, DID, or service account.
///
/// Opaque to the registry beyond equality. Must be 1-256 characters with no
/// whitespace or control characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity(String);

impl Identity {
    /// Create an identity, validating its format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidIdentity`] if the value is empty,
    /// longer than 256 characters, or contains whitespace/control characters.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if s.is_empty()
            || s.chars().count() > MAX_IDENTITY_LEN
            || s.chars().any(|c| c.is_whitespace() || c.is_control())
        {
            return Err(ValidationError::InvalidIdentity(s));
        }
        Ok(Self(s))
    }

    /// Access the identity string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Identity {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Identity {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Identity> for String {
    fn from(value: Identity) -> Self {
        value.0
    }
}

// ---------------------------------------------------------------------------
// IdentityHash
// ---------------------------------------------------------------------------

/// A 32-byte commitment to a real-world identity.
///
/// Used solely for uniqueness checks. Serialized as a `0x`-prefixed lowercase
/// hex string; parsing accepts the prefix or its absence.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityHash([u8; 32]);

impl IdentityHash {
    /// Wrap raw commitment bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Commit to identity material with SHA-256.
    ///
    /// The registry never sees the material itself, only this commitment.
    pub fn commit(material: &[u8]) -> Self {
        Self(sha256_raw(material))
    }

    /// Access the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex without prefix.
    pub fn to_hex(&self) -> String {
        to_hex(&self.0)
    }
}

impl std::fmt::Debug for IdentityHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "IdentityHash(0x{})", self.to_hex())
    }
}

impl std::fmt::Display for IdentityHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl FromStr for IdentityHash {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex_decode(s).map_err(|e| ValidationError::InvalidIdentityHash {
            value: s.to_string(),
            reason: e.to_string(),
        })?;
        let arr: [u8; 32] =
            bytes
                .try_into()
                .map_err(|b: Vec<u8>| ValidationError::InvalidIdentityHash {
                    value: s.to_string(),
                    reason: format!("expected 32 bytes, got {}", b.len()),
                })?;
        Ok(Self(arr))
    }
}

impl Serialize for IdentityHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for IdentityHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// CredentialId
// ---------------------------------------------------------------------------

/// Sequential credential identifier. The first issued credential is `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialId(u64);

impl CredentialId {
    /// The identifier assigned to the first credential.
    pub const FIRST: CredentialId = CredentialId(1);

    /// Wrap a raw identifier.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// The raw identifier value.
    pub fn value(&self) -> u64 {
        self.0
    }

    /// The identifier that follows this one.
    pub fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl std::fmt::Display for CredentialId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for CredentialId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

// ---------------------------------------------------------------------------
// MetadataPointer
// ---------------------------------------------------------------------------

/// Opaque reference to off-registry descriptive data (e.g. `ipfs://...`).
///
/// Informational only. May be empty; capped at 2048 characters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MetadataPointer(String);

impl MetadataPointer {
    /// Create a metadata pointer, validating length and content.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidMetadataPointer`] if the value is
    /// longer than 2048 characters or contains control characters.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if s.chars().count() > MAX_METADATA_POINTER_LEN {
            return Err(ValidationError::InvalidMetadataPointer(format!(
                "exceeds {MAX_METADATA_POINTER_LEN} characters"
            )));
        }
        if s.chars().any(char::is_control) {
            return Err(ValidationError::InvalidMetadataPointer(
                "contains control characters".to_string(),
            ));
        }
        Ok(Self(s))
    }

    /// Access the pointer string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MetadataPointer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for MetadataPointer {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MetadataPointer> for String {
    fn from(value: MetadataPointer) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- Identity --------------------------------------------------------

    #[test]
    fn identity_accepts_addresses_and_dids() {
        assert!(Identity::new("0x1d930379145bd62523504e2a3fd25ddeb7639d9f").is_ok());
        assert!(Identity::new("did:ethr:0xabc").is_ok());
        assert!(Identity::new("issuer-service").is_ok());
    }

    #[test]
    fn identity_rejects_empty_and_whitespace() {
        assert!(Identity::new("").is_err());
        assert!(Identity::new("alice bob").is_err());
        assert!(Identity::new("alice\n").is_err());
        assert!(Identity::new("x".repeat(257)).is_err());
    }

    #[test]
    fn identity_deserialization_validates() {
        let ok: Identity = serde_json::from_str("\"alice\"").unwrap();
        assert_eq!(ok.as_str(), "alice");
        assert!(serde_json::from_str::<Identity>("\"\"").is_err());
    }

    // -- IdentityHash ----------------------------------------------------

    #[test]
    fn identity_hash_commit_is_deterministic() {
        let a = IdentityHash::commit(b"user-1");
        let b = IdentityHash::commit(b"user-1");
        let c = IdentityHash::commit(b"user-2");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn identity_hash_display_is_prefixed() {
        let h = IdentityHash::from_bytes([0xab; 32]);
        let s = h.to_string();
        assert!(s.starts_with("0x"));
        assert_eq!(s.len(), 66);
        assert_eq!(s.parse::<IdentityHash>().unwrap(), h);
        assert_eq!(s[2..].parse::<IdentityHash>().unwrap(), h);
    }

    #[test]
    fn identity_hash_rejects_wrong_length() {
        let err = "0x1234".parse::<IdentityHash>().unwrap_err();
        assert!(matches!(err, ValidationError::InvalidIdentityHash { .. }));
        assert!(err.to_string().contains("expected 32 bytes"));
    }

    #[test]
    fn identity_hash_serde_uses_hex_string() {
        let h = IdentityHash::commit(b"user-3");
        let json = serde_json::to_string(&h).unwrap();
        assert_eq!(json, format!("\"{h}\""));
        let back: IdentityHash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, h);
    }

    // -- CredentialId ----------------------------------------------------

    #[test]
    fn credential_id_sequence() {
        assert_eq!(CredentialId::FIRST.value(), 1);
        assert_eq!(CredentialId::FIRST.next(), CredentialId::new(2));
        assert_eq!(serde_json::to_string(&CredentialId::new(7)).unwrap(), "7");
    }

    // -- MetadataPointer -------------------------------------------------

    #[test]
    fn metadata_pointer_limits() {
        assert!(MetadataPointer::new("ipfs://meta").is_ok());
        assert!(MetadataPointer::new("").is_ok());
        assert!(MetadataPointer::new("x".repeat(2049)).is_err());
        assert!(MetadataPointer::new("ipfs://\u{0}").is_err());
    }

    proptest::proptest! {
        #[test]
        fn identity_hash_parse_never_panics(s in "\\PC{0,80}") {
            let _ = s.parse::<IdentityHash>();
        }
    }
}
