//! # API Route Modules
//!
//! Each module exposes its unauthenticated and authenticated routes
//! separately so [`crate::app`] can put only the latter behind the auth
//! middleware.

pub mod audit;
pub mod passports;
pub mod roles;
pub mod verifier;
