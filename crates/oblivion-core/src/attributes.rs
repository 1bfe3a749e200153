//! # Credential Attributes
//!
//! The fixed attribute record carried by every passport: five boolean flags
//! and the identity commitment they were derived for.

use serde::{Deserialize, Serialize};

use crate::identity::IdentityHash;

/// Flag names in public-signal order.
pub const FLAG_NAMES: [&str; 5] = ["verified", "adult", "human", "not_sanctioned", "unique"];

/// Attribute flags declared at issuance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attributes {
    /// Identity documents were verified.
    pub verified: bool,
    /// Holder is of legal age.
    pub adult: bool,
    /// Holder passed liveness checks.
    pub human: bool,
    /// Holder is not on a sanctions list.
    pub not_sanctioned: bool,
    /// Holder is not a duplicate of another enrolled identity.
    pub unique: bool,
    /// Commitment to the real-world identity.
    pub identity_hash: IdentityHash,
}

impl Attributes {
    /// Attributes with every flag set.
    pub fn all_set(identity_hash: IdentityHash) -> Self {
        Self {
            verified: true,
            adult: true,
            human: true,
            not_sanctioned: true,
            unique: true,
            identity_hash,
        }
    }

    /// The five flags in [`FLAG_NAMES`] order.
    pub fn flags(&self) -> [bool; 5] {
        [
            self.verified,
            self.adult,
            self.human,
            self.not_sanctioned,
            self.unique,
        ]
    }

    /// Conventional public-signal encoding: each flag as `0` or `1`.
    pub fn public_signals(&self) -> Vec<u64> {
        self.flags().iter().map(|&f| u64::from(f)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_signals_follow_flag_order() {
        let attrs = Attributes {
            verified: true,
            adult: false,
            human: true,
            not_sanctioned: false,
            unique: true,
            identity_hash: IdentityHash::commit(b"x"),
        };
        assert_eq!(attrs.public_signals(), vec![1, 0, 1, 0, 1]);
        assert_eq!(FLAG_NAMES.len(), attrs.flags().len());
    }

    #[test]
    fn all_set_sets_every_flag() {
        let attrs = Attributes::all_set(IdentityHash::commit(b"y"));
        assert!(attrs.flags().iter().all(|&f| f));
    }

    #[test]
    fn serializes_snake_case_fields() {
        let attrs = Attributes::all_set(IdentityHash::from_bytes([0; 32]));
        let json = serde_json::to_value(attrs).unwrap();
        assert_eq!(json["not_sanctioned"], true);
        assert!(json["identity_hash"].as_str().unwrap().starts_with("0x"));
    }
}
