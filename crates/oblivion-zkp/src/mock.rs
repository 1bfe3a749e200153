//! # Static Mock Verifier
//!
//! Returns a configured verdict for every proof. Used in tests and in
//! environments without a proof backend.

use std::sync::atomic::{AtomicBool, Ordering};

use oblivion_core::Attributes;

use crate::traits::{VerificationGate, VerifyError};

/// A verifier with a fixed, runtime-adjustable verdict.
#[derive(Debug)]
pub struct StaticVerifier {
    allow: AtomicBool,
}

impl StaticVerifier {
    /// Create a verifier that accepts (`true`) or rejects (`false`) everything.
    pub fn new(allow: bool) -> Self {
        Self {
            allow: AtomicBool::new(allow),
        }
    }

    /// The current verdict.
    pub fn allow(&self) -> bool {
        self.allow.load(Ordering::SeqCst)
    }

    /// Change the verdict for subsequent calls.
    pub fn set_allow(&self, allow: bool) {
        self.allow.store(allow, Ordering::SeqCst);
    }
}

impl VerificationGate for StaticVerifier {
    fn verify(
        &self,
        _proof: &[u8],
        _public_signals: &[u64],
        _declared: &Attributes,
    ) -> Result<bool, VerifyError> {
        Ok(self.allow())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oblivion_core::IdentityHash;

    #[test]
    fn verdict_follows_flag() {
        let attrs = Attributes::all_set(IdentityHash::commit(b"user"));
        let v = StaticVerifier::new(true);
        assert!(v.verify(b"", &[], &attrs).unwrap());
        v.set_allow(false);
        assert!(!v.allow());
        assert!(!v.verify(b"", &[], &attrs).unwrap());
    }
}
