//! # Verification Gate Trait
//!
//! The core abstraction for proof backends. The registry depends only on
//! this trait; mock, deterministic, and real ZK verifiers all implement it.
//!
//! ## Contract
//!
//! `verify` is a pure function of its inputs from the registry's point of
//! view. It must not mutate registry state and should complete in bounded
//! time; the registry wraps the call in a timeout regardless.

use oblivion_core::Attributes;
use thiserror::Error;

/// Error during proof verification.
///
/// `Ok(false)` from [`VerificationGate::verify`] means the proof was checked
/// and rejected. An `Err` means it could not be checked at all, or (for
/// [`VerifyError::MalformedProof`]) could not possibly verify.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    /// The proof is structurally malformed (wrong length, corrupt encoding).
    #[error("malformed proof: {0}")]
    MalformedProof(String),

    /// The backend could not be reached or failed internally.
    #[error("verifier unavailable: {0}")]
    Unavailable(String),

    /// The verifier reference does not name a known backend.
    #[error("unknown verifier: {0}")]
    UnknownVerifier(String),
}

impl VerifyError {
    /// Whether the same request may succeed if retried unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// A pluggable proof backend.
///
/// The trait requires `Send + Sync` so that a single backend instance can be
/// shared by every concurrent issuance, and `'static` use through
/// `Arc<dyn VerificationGate>`.
pub trait VerificationGate: Send + Sync {
    /// Verify `proof` against `public_signals` for the `declared` attributes.
    ///
    /// # Returns
    ///
    /// `Ok(true)` if the proof is valid, `Ok(false)` if it is well-formed but
    /// does not verify.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError::MalformedProof`] if the proof cannot be parsed,
    /// or [`VerifyError::Unavailable`] if the backend failed.
    fn verify(
        &self,
        proof: &[u8],
        public_signals: &[u64],
        declared: &Attributes,
    ) -> Result<bool, VerifyError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_unavailable_is_retryable() {
        assert!(VerifyError::Unavailable("timeout".into()).is_retryable());
        assert!(!VerifyError::MalformedProof("short".into()).is_retryable());
        assert!(!VerifyError::UnknownVerifier("x".into()).is_retryable());
    }

    #[test]
    fn gate_is_object_safe() {
        struct Reject;
        impl VerificationGate for Reject {
            fn verify(&self, _: &[u8], _: &[u64], _: &Attributes) -> Result<bool, VerifyError> {
                Ok(false)
            }
        }
        let gate: std::sync::Arc<dyn VerificationGate> = std::sync::Arc::new(Reject);
        let attrs = Attributes::all_set(oblivion_core::IdentityHash::commit(b"a"));
        assert!(!gate.verify(&[], &[], &attrs).unwrap());
    }
}
