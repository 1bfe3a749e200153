//! # Signal-Binding Verifier
//!
//! A deterministic, transparent backend. The "proof" is
//! `SHA-256(identity_hash || signal_0 || ... || signal_n)` with each signal
//! encoded as big-endian `u64`, and the public signals must equal the
//! conventional encoding of the declared flags
//! ([`Attributes::public_signals`]).
//!
//! This binds the declared flags to the identity commitment so that a bundle
//! produced for one identity cannot be replayed with different flags or for
//! another identity. It provides no zero-knowledge guarantees.

use oblivion_core::{sha256_raw, Attributes, IdentityHash};
use subtle::ConstantTimeEq;

use crate::traits::{VerificationGate, VerifyError};

/// Length of a signal-binding proof in bytes.
pub const PROOF_LEN: usize = 32;

/// Deterministic verifier binding public signals to an identity commitment.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalBindingVerifier;

impl SignalBindingVerifier {
    /// Produce the proof this verifier accepts for `attrs`.
    pub fn prove(attrs: &Attributes) -> Vec<u8> {
        binding_digest(&attrs.identity_hash, &attrs.public_signals()).to_vec()
    }
}

fn binding_digest(identity_hash: &IdentityHash, signals: &[u64]) -> [u8; 32] {
    let mut input = Vec::with_capacity(32 + signals.len() * 8);
    input.extend_from_slice(identity_hash.as_bytes());
    for s in signals {
        input.extend_from_slice(&s.to_be_bytes());
    }
    sha256_raw(&input)
}

impl VerificationGate for SignalBindingVerifier {
    fn verify(
        &self,
        proof: &[u8],
        public_signals: &[u64],
        declared: &Attributes,
    ) -> Result<bool, VerifyError> {
        if proof.len() != PROOF_LEN {
            return Err(VerifyError::MalformedProof(format!(
                "expected {PROOF_LEN} bytes, got {}",
                proof.len()
            )));
        }
        if public_signals != declared.public_signals().as_slice() {
            tracing::debug!(
                identity_hash = %declared.identity_hash,
                "public signals do not encode declared flags"
            );
            return Ok(false);
        }
        let expected = binding_digest(&declared.identity_hash, public_signals);
        Ok(bool::from(expected.as_slice().ct_eq(proof)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(seed: &[u8]) -> Attributes {
        Attributes::all_set(IdentityHash::commit(seed))
    }

    #[test]
    fn accepts_its_own_proof() {
        let a = attrs(b"user-1");
        let proof = SignalBindingVerifier::prove(&a);
        assert!(SignalBindingVerifier
            .verify(&proof, &a.public_signals(), &a)
            .unwrap());
    }

    #[test]
    fn rejects_flag_mismatch() {
        let a = attrs(b"user-1");
        let proof = SignalBindingVerifier::prove(&a);
        let mut claimed = a;
        claimed.adult = false;
        // Signals still say "adult"; declared flags do not.
        assert!(!SignalBindingVerifier
            .verify(&proof, &a.public_signals(), &claimed)
            .unwrap());
    }

    #[test]
    fn rejects_proof_for_other_identity() {
        let a = attrs(b"user-1");
        let b = attrs(b"user-2");
        let proof = SignalBindingVerifier::prove(&a);
        assert!(!SignalBindingVerifier
            .verify(&proof, &b.public_signals(), &b)
            .unwrap());
    }

    #[test]
    fn malformed_proof_is_an_error() {
        let a = attrs(b"user-1");
        let err = SignalBindingVerifier
            .verify(&[0u8; 256], &a.public_signals(), &a)
            .unwrap_err();
        assert!(matches!(err, VerifyError::MalformedProof(_)));
    }

    proptest::proptest! {
        #[test]
        fn random_proofs_do_not_verify(bytes in proptest::collection::vec(proptest::num::u8::ANY, 32)) {
            let a = attrs(b"prop");
            let genuine = SignalBindingVerifier::prove(&a);
            proptest::prop_assume!(bytes != genuine);
            proptest::prop_assert!(!SignalBindingVerifier.verify(&bytes, &a.public_signals(), &a).unwrap());
        }
    }
}
