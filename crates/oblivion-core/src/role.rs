//! # Roles
//!
//! Privileges recognised by the registry's access control. Roles are a set,
//! not a hierarchy: an Admin that wants to issue must also hold Issuer.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A privilege an identity can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Manages roles and the verifier configuration.
    Admin,
    /// May issue credentials.
    Issuer,
    /// May revoke credentials.
    Revoker,
}

impl Role {
    /// Every role, in declaration order.
    pub const ALL: [Role; 3] = [Role::Admin, Role::Issuer, Role::Revoker];

    /// Return the string representation of this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Issuer => "issuer",
            Self::Revoker => "revoker",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "issuer" => Ok(Self::Issuer),
            "revoker" => Ok(Self::Revoker),
            _ => Err(ValidationError::UnknownRole(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("Issuer".parse::<Role>().unwrap(), Role::Issuer);
        assert_eq!(" revoker ".parse::<Role>().unwrap(), Role::Revoker);
        assert!("minter".parse::<Role>().is_err());
    }

    #[test]
    fn display_matches_serde() {
        for role in Role::ALL {
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{role}\""));
        }
    }
}
