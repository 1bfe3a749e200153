//! # Credential Lifecycle
//!
//! ```text
//! (issue) ──▶ Active ──revoke──▶ Revoked (terminal)
//! ```
//!
//! `Active` is entered only through a successful issuance. No transition
//! leaves `Revoked`. The owner is fixed at creation; there is no setter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use oblivion_core::{Attributes, CredentialId, Identity, MetadataPointer};

use crate::error::RegistryError;

/// Lifecycle state of a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CredentialState {
    /// Issued and valid.
    Active,
    /// Revoked (terminal).
    Revoked,
}

impl CredentialState {
    /// Return the string representation of this state.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Revoked => "REVOKED",
        }
    }
}

impl std::fmt::Display for CredentialState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who revoked a credential, why, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revocation {
    /// The revoker.
    pub by: Identity,
    /// Free-text reason supplied by the revoker.
    pub reason: String,
    /// When the revocation was committed.
    pub at: DateTime<Utc>,
}

/// An issued passport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    id: CredentialId,
    owner: Identity,
    attributes: Attributes,
    metadata_pointer: MetadataPointer,
    state: CredentialState,
    issued_at: DateTime<Utc>,
    revocation: Option<Revocation>,
}

impl Credential {
    pub(crate) fn new(
        id: CredentialId,
        owner: Identity,
        attributes: Attributes,
        metadata_pointer: MetadataPointer,
        issued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner,
            attributes,
            metadata_pointer,
            state: CredentialState::Active,
            issued_at,
            revocation: None,
        }
    }

    /// The credential id.
    pub fn id(&self) -> CredentialId {
        self.id
    }

    /// The holder. Never changes.
    pub fn owner(&self) -> &Identity {
        &self.owner
    }

    /// Declared attributes, regardless of state.
    ///
    /// Public reads go through the registry's `get_attributes`, which refuses
    /// revoked credentials.
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Off-registry metadata reference.
    pub fn metadata_pointer(&self) -> &MetadataPointer {
        &self.metadata_pointer
    }

    /// Current lifecycle state.
    pub fn state(&self) -> CredentialState {
        self.state
    }

    /// When the credential was issued.
    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// Revocation details, if revoked.
    pub fn revocation(&self) -> Option<&Revocation> {
        self.revocation.as_ref()
    }

    /// Whether the credential has been revoked.
    pub fn is_revoked(&self) -> bool {
        self.state == CredentialState::Revoked
    }

    /// Attributes of an active credential.
    ///
    /// # Errors
    ///
    /// [`RegistryError::Revoked`] if the credential is revoked.
    pub fn valid_attributes(&self) -> Result<&Attributes, RegistryError> {
        match self.state {
            CredentialState::Active => Ok(&self.attributes),
            CredentialState::Revoked => Err(RegistryError::Revoked(self.id)),
        }
    }

    /// Fail with [`RegistryError::AlreadyRevoked`] unless active.
    pub fn ensure_revocable(&self) -> Result<(), RegistryError> {
        match self.state {
            CredentialState::Active => Ok(()),
            CredentialState::Revoked => Err(RegistryError::AlreadyRevoked(self.id)),
        }
    }

    /// Apply a revocation. Callers check [`Self::ensure_revocable`] first.
    pub(crate) fn mark_revoked(&mut self, revocation: Revocation) {
        debug_assert!(!self.is_revoked(), "revocation applied twice");
        self.state = CredentialState::Revoked;
        self.revocation = Some(revocation);
    }
}
