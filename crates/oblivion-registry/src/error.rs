//! # Registry Errors
//!
//! One typed error per failure kind. Domain errors (caller misuse, abuse,
//! stale state) are distinct from [`RegistryError::Storage`], which signals
//! an infrastructure fault in the audit sink.

use oblivion_core::{CredentialId, Identity, IdentityHash, Role, ValidationError};
use thiserror::Error;

/// Errors returned by [`CredentialRegistry`](crate::CredentialRegistry) operations.
///
/// No operation partially applies a mutation before returning one of these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Caller lacks the role the operation requires.
    #[error("unauthorized: {caller} does not hold role {role}")]
    Unauthorized {
        /// The rejected caller.
        caller: Identity,
        /// The role the operation requires.
        role: Role,
    },

    /// The identity hash is already bound to a credential.
    #[error("identity {identity_hash} already holds a passport")]
    AlreadyMinted {
        /// The conflicting commitment.
        identity_hash: IdentityHash,
    },

    /// The verification gate rejected the proof.
    #[error("invalid proof: {0}")]
    InvalidProof(String),

    /// The verification gate timed out or could not be reached.
    #[error("verification unavailable: {0}")]
    VerificationUnavailable(String),

    /// No credential with this id exists.
    #[error("credential {0} not found")]
    NotFound(CredentialId),

    /// The credential exists but has been revoked.
    #[error("credential {0} is revoked")]
    Revoked(CredentialId),

    /// Revocation requested for an already-revoked credential.
    #[error("credential {0} is already revoked")]
    AlreadyRevoked(CredentialId),

    /// The operation would leave the registry without an Admin.
    #[error("cannot remove the last admin ({account})")]
    LastAdminProtected {
        /// The admin that would have been removed.
        account: Identity,
    },

    /// Credentials cannot change owner.
    #[error("passports are soulbound and cannot be transferred")]
    Soulbound,

    /// The verifier reference does not name a backend this registry can use.
    #[error("unknown verifier: {0}")]
    UnknownVerifier(String),

    /// An input failed domain validation.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The audit sink failed; no state was changed.
    #[error("storage error: {0}")]
    Storage(String),
}

impl RegistryError {
    /// Stable machine-readable code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "UNAUTHORIZED",
            Self::AlreadyMinted { .. } => "ALREADY_MINTED",
            Self::InvalidProof(_) => "INVALID_PROOF",
            Self::VerificationUnavailable(_) => "VERIFICATION_UNAVAILABLE",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Revoked(_) => "REVOKED",
            Self::AlreadyRevoked(_) => "ALREADY_REVOKED",
            Self::LastAdminProtected { .. } => "LAST_ADMIN_PROTECTED",
            Self::Soulbound => "SOULBOUND",
            Self::UnknownVerifier(_) => "UNKNOWN_VERIFIER",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Whether the same request may succeed if retried unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::VerificationUnavailable(_) | Self::Storage(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        let alice = Identity::new("alice").unwrap();
        let errors = [
            RegistryError::Unauthorized {
                caller: alice.clone(),
                role: Role::Issuer,
            },
            RegistryError::AlreadyMinted {
                identity_hash: IdentityHash::commit(b"h"),
            },
            RegistryError::InvalidProof("rejected".into()),
            RegistryError::VerificationUnavailable("timeout".into()),
            RegistryError::NotFound(CredentialId::new(9)),
            RegistryError::Revoked(CredentialId::new(1)),
            RegistryError::AlreadyRevoked(CredentialId::new(1)),
            RegistryError::LastAdminProtected { account: alice },
            RegistryError::Soulbound,
            RegistryError::UnknownVerifier("x".into()),
            RegistryError::Validation(ValidationError::InvalidIdentity(String::new())),
            RegistryError::Storage("disk full".into()),
        ];
        let mut codes: Vec<_> = errors.iter().map(RegistryError::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn retryable_kinds() {
        assert!(RegistryError::VerificationUnavailable("t".into()).is_retryable());
        assert!(RegistryError::Storage("io".into()).is_retryable());
        assert!(!RegistryError::InvalidProof("bad".into()).is_retryable());
        assert!(!RegistryError::Soulbound.is_retryable());
        assert!(!RegistryError::NotFound(CredentialId::new(1)).is_retryable());
    }

    #[test]
    fn display_carries_context() {
        let err = RegistryError::Unauthorized {
            caller: Identity::new("mallory").unwrap(),
            role: Role::Revoker,
        };
        let msg = err.to_string();
        assert!(msg.contains("mallory"));
        assert!(msg.contains("revoker"));
        assert!(RegistryError::NotFound(CredentialId::new(42))
            .to_string()
            .contains("42"));
    }
}
