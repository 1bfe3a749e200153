//! # Verifier References
//!
//! A [`VerifierRef`] names the backend currently configured on a registry.
//! It is what the audit log records and what operators pass to
//! `set_verifier`. [`resolve`] maps the built-in references to backends;
//! deployments with a real proof service register it under their own
//! reference and hand the registry the gate directly.

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::binding::SignalBindingVerifier;
use crate::traits::{VerificationGate, VerifyError};

/// Maximum length of a verifier reference.
const MAX_REF_LEN: usize = 128;

/// Built-in reference for a mock that accepts every proof.
pub const MOCK_ALLOW: &str = "mock:allow";
/// Built-in reference for a mock that rejects every proof.
pub const MOCK_DENY: &str = "mock:deny";
/// Built-in reference for [`SignalBindingVerifier`].
pub const SIGNAL_BINDING: &str = "signal-binding";

/// Name of a verification backend (endpoint, contract address, or built-in).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VerifierRef(String);

impl VerifierRef {
    /// Create a verifier reference.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError::UnknownVerifier`] if the value is empty, longer
    /// than 128 characters, or contains whitespace.
    pub fn new(value: impl Into<String>) -> Result<Self, VerifyError> {
        let s = value.into();
        if s.is_empty() || s.len() > MAX_REF_LEN || s.chars().any(char::is_whitespace) {
            return Err(VerifyError::UnknownVerifier(s));
        }
        Ok(Self(s))
    }

    /// Access the reference string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this names a backend [`resolve`] can construct.
    pub fn is_builtin(&self) -> bool {
        matches!(self.0.as_str(), MOCK_ALLOW | MOCK_DENY | SIGNAL_BINDING)
    }
}

impl std::fmt::Display for VerifierRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for VerifierRef {
    type Err = VerifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.trim())
    }
}

impl TryFrom<String> for VerifierRef {
    type Error = VerifyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<VerifierRef> for String {
    fn from(value: VerifierRef) -> Self {
        value.0
    }
}

/// Construct the backend for a built-in reference.
///
/// # Errors
///
/// Returns [`VerifyError::UnknownVerifier`] for references this crate does
/// not know how to build.
pub fn resolve(reference: &VerifierRef) -> Result<Arc<dyn VerificationGate>, VerifyError> {
    match reference.as_str() {
        #[cfg(feature = "mock")]
        MOCK_ALLOW => Ok(Arc::new(crate::mock::StaticVerifier::new(true))),
        #[cfg(feature = "mock")]
        MOCK_DENY => Ok(Arc::new(crate::mock::StaticVerifier::new(false))),
        SIGNAL_BINDING => Ok(Arc::new(SignalBindingVerifier)),
        other => Err(VerifyError::UnknownVerifier(other.to_string())),
    }
}
