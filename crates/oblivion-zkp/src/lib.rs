//! # oblivion-zkp: Proof Verification Gate
//!
//! Provides the trait-based abstraction the registry calls before issuing a
//! credential, plus the backends that ship with the stack.
//!
//! ## Architecture
//!
//! The [`VerificationGate`] trait defines the single call the registry makes:
//! proof bytes, public signals, and the declared attribute flags in, accept
//! or reject out. Backends are injected at registry construction and
//! swapped only through the registry's admin-gated `set_verifier`.
//!
//! ## Backends
//!
//! - [`StaticVerifier`] (`mock:allow` / `mock:deny`): a fixed verdict,
//!   flippable at runtime for tests and environments without a prover.
//! - [`SignalBindingVerifier`] (`signal-binding`): deterministic and
//!   transparent. Checks that the public signals encode the declared flags
//!   and that the proof is the SHA-256 binding of signals to the identity
//!   commitment. No zero-knowledge guarantees.
//!
//! Real proof systems implement [`VerificationGate`] outside this crate and
//! are registered under their own [`VerifierRef`].

pub mod binding;
#[cfg(feature = "mock")]
pub mod mock;
pub mod reference;
pub mod traits;

// Re-export primary types.
pub use binding::SignalBindingVerifier;
#[cfg(feature = "mock")]
pub use mock::StaticVerifier;
pub use reference::{resolve, VerifierRef};
pub use traits::{VerificationGate, VerifyError};
