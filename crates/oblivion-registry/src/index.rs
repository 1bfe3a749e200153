//! # Identity Hash Index
//!
//! Maps each identity commitment to the credential it produced. Enforces one
//! credential per identity. Reservation happens inside the registry's write
//! lock together with credential creation, so the check and the write are a
//! single step.

use std::collections::HashMap;

use oblivion_core::{CredentialId, IdentityHash};

/// identity hash → credential id.
#[derive(Debug, Clone, Default)]
pub struct IdentityHashIndex {
    entries: HashMap<IdentityHash, CredentialId>,
}

impl IdentityHashIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// The credential bound to `hash`, if any.
    pub fn lookup(&self, hash: &IdentityHash) -> Option<CredentialId> {
        self.entries.get(hash).copied()
    }

    /// Bind `hash` to `id`. Fails with the existing binding if present.
    pub fn reserve(&mut self, hash: IdentityHash, id: CredentialId) -> Result<(), CredentialId> {
        match self.entries.get(&hash) {
            Some(existing) => Err(*existing),
            None => {
                self.entries.insert(hash, id);
                Ok(())
            }
        }
    }

    /// Re-point `hash` at `id`, replacing any binding. Used for re-enrollment.
    pub(crate) fn rebind(&mut self, hash: IdentityHash, id: CredentialId) {
        self.entries.insert(hash, id);
    }

    /// Number of bound hashes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no hash is bound.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
