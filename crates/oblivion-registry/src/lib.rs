#![deny(missing_docs)]

//! # oblivion-registry: Soulbound Passport Registry
//!
//! Issues at most one non-transferable credential per identity commitment,
//! gates issuance behind a pluggable [`VerificationGate`](oblivion_zkp::VerificationGate),
//! and lets Revokers invalidate credentials after the fact.
//!
//! ## Components
//!
//! - [`AccessControl`]: Admin / Issuer / Revoker assignments.
//! - [`IdentityHashIndex`]: identity hash → credential id.
//! - [`AuditLog`]: hash-chained record of every state change, with an
//!   optional durable [`AuditSink`].
//! - [`CredentialRegistry`]: composes the above under one lock.
//!
//! ## Guarantees
//!
//! - At most one successful issuance per identity hash, under any
//!   interleaving of concurrent callers.
//! - Every operation either fully applies (state change plus audit record)
//!   or leaves no trace.
//! - No operation changes a credential's owner.
//! - Revocation is terminal.

pub mod access;
pub mod audit;
pub mod config;
pub mod credential;
pub mod error;
pub mod index;
pub mod registry;

pub use access::AccessControl;
pub use audit::{
    read_json_lines, verify_chain_records, AuditChainError, AuditEvent, AuditLog, AuditRecord,
    AuditSink, AuditSinkError, JsonLinesSink, LineStore, GENESIS_HASH,
};
pub use config::RegistryConfig;
pub use credential::{Credential, CredentialState, Revocation};
pub use error::RegistryError;
pub use index::IdentityHashIndex;
pub use registry::{CredentialRegistry, IssueRequest, RegistryBuilder, MAX_REASON_LEN};
