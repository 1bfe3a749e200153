//! # Registry Configuration
//!
//! Tunables for a registry instance. Loadable from YAML; every field has a
//! default so a partial document (or none) is valid.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Registry tunables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Upper bound on a single verification call, in milliseconds.
    pub verify_timeout_ms: u64,
    /// Whether an identity hash whose credential was revoked may be issued again.
    pub allow_reenrollment: bool,
    /// In-memory audit retention. `0` keeps every record.
    pub audit_capacity: usize,
}

impl RegistryConfig {
    /// The verification timeout as a [`Duration`].
    pub fn verify_timeout(&self) -> Duration {
        Duration::from_millis(self.verify_timeout_ms)
    }

    /// Parse a YAML document.
    ///
    /// # Errors
    ///
    /// Returns the `serde_yaml` error for malformed documents or unknown types.
    pub fn from_yaml(doc: &str) -> Result<Self, serde_yaml::Error> {
        if doc.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(doc)
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            verify_timeout_ms: 5_000,
            allow_reenrollment: false,
            audit_capacity: 0,
        }
    }
}
