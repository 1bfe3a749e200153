#![deny(missing_docs)]

//! # oblivion-core: Foundational Types for the Passport Registry
//!
//! This crate defines the types every other crate in the workspace depends
//! on. It has no internal crate dependencies, only `serde`,
//! `thiserror`, and `sha2` from the external ecosystem.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** An [`Identity`] is not a
//!    string, an [`IdentityHash`] is not a byte slice, and a [`CredentialId`]
//!    is not a bare integer. Each validates at construction.
//!
//! 2. **One attribute record.** [`Attributes`] carries the five boolean flags
//!    and the identity commitment. Its conventional public-signal encoding
//!    lives here so that provers and verifiers cannot disagree on it.
//!
//! 3. **Structured errors.** [`ValidationError`] via `thiserror`, no
//!    `Box<dyn Error>`, no `.unwrap()` outside tests.

pub mod attributes;
pub mod digest;
pub mod error;
pub mod identity;
pub mod role;

// Re-export primary types at crate root for ergonomic imports.
pub use attributes::{Attributes, FLAG_NAMES};
pub use digest::{hex_decode, sha256_raw, to_hex};
pub use error::ValidationError;
pub use identity::{CredentialId, Identity, IdentityHash, MetadataPointer};
pub use role::Role;
