//! # Access Control
//!
//! Role assignments and the checks that gate privileged operations.
//!
//! Checks and mutations are separate: the registry validates a role change,
//! persists its audit record, and only then applies it. Mutators here are
//! therefore crate-private and infallible.
//!
//! ## Invariant
//!
//! At least one identity holds [`Role::Admin`] at all times. The seed admin
//! is assigned at construction and every removal path goes through
//! [`AccessControl::check_removal`].

use std::collections::{BTreeMap, BTreeSet};

use oblivion_core::{Identity, Role};

use crate::error::RegistryError;

/// Role assignments for one registry.
#[derive(Debug, Clone)]
pub struct AccessControl {
    members: BTreeMap<Role, BTreeSet<Identity>>,
}

impl AccessControl {
    /// Create access control with `admin` as the sole Admin.
    pub fn new(admin: Identity) -> Self {
        let mut members = BTreeMap::new();
        members.insert(Role::Admin, BTreeSet::from([admin]));
        Self { members }
    }

    /// Whether `identity` holds `role`.
    pub fn has_role(&self, identity: &Identity, role: Role) -> bool {
        self.members
            .get(&role)
            .is_some_and(|set| set.contains(identity))
    }

    /// Identities holding `role`, in sorted order.
    pub fn members(&self, role: Role) -> Vec<Identity> {
        self.members
            .get(&role)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Roles held by `identity`, in declaration order.
    pub fn roles_of(&self, identity: &Identity) -> Vec<Role> {
        Role::ALL
            .into_iter()
            .filter(|&role| self.has_role(identity, role))
            .collect()
    }

    /// Number of Admins.
    pub fn admin_count(&self) -> usize {
        self.members.get(&Role::Admin).map_or(0, BTreeSet::len)
    }

    /// Fail with [`RegistryError::Unauthorized`] unless `caller` holds `role`.
    pub fn authorize(&self, caller: &Identity, role: Role) -> Result<(), RegistryError> {
        if self.has_role(caller, role) {
            Ok(())
        } else {
            Err(RegistryError::Unauthorized {
                caller: caller.clone(),
                role,
            })
        }
    }

    /// Validate an admin granting `role` to `account`.
    ///
    /// Returns `Ok(false)` when `account` already holds the role.
    pub fn check_grant(
        &self,
        caller: &Identity,
        account: &Identity,
        role: Role,
    ) -> Result<bool, RegistryError> {
        self.authorize(caller, Role::Admin)?;
        Ok(!self.has_role(account, role))
    }

    /// Validate an admin removing `role` from `account`.
    ///
    /// Returns `Ok(false)` when `account` does not hold the role.
    pub fn check_revoke(
        &self,
        caller: &Identity,
        account: &Identity,
        role: Role,
    ) -> Result<bool, RegistryError> {
        self.authorize(caller, Role::Admin)?;
        self.check_removal(account, role)
    }

    /// Validate `caller` dropping one of its own roles. No Admin needed.
    pub fn check_renounce(&self, caller: &Identity, role: Role) -> Result<bool, RegistryError> {
        self.check_removal(caller, role)
    }

    fn check_removal(&self, account: &Identity, role: Role) -> Result<bool, RegistryError> {
        if !self.has_role(account, role) {
            return Ok(false);
        }
        if role == Role::Admin && self.admin_count() <= 1 {
            return Err(RegistryError::LastAdminProtected {
                account: account.clone(),
            });
        }
        Ok(true)
    }

    pub(crate) fn insert(&mut self, account: Identity, role: Role) {
        self.members.entry(role).or_default().insert(account);
    }

    pub(crate) fn remove(&mut self, account: &Identity, role: Role) {
        if let Some(set) = self.members.get_mut(&role) {
            set.remove(account);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> Identity {
        Identity::new(s).unwrap()
    }

    #[test]
    fn seeded_admin() {
        let ac = AccessControl::new(id("root"));
        assert!(ac.has_role(&id("root"), Role::Admin));
        assert!(!ac.has_role(&id("root"), Role::Issuer));
        assert_eq!(ac.admin_count(), 1);
        assert_eq!(ac.roles_of(&id("root")), vec![Role::Admin]);
    }

    #[test]
    fn non_admin_cannot_grant_or_revoke() {
        let ac = AccessControl::new(id("root"));
        let err = ac.check_grant(&id("eve"), &id("eve"), Role::Issuer).unwrap_err();
        assert!(matches!(err, RegistryError::Unauthorized { role: Role::Admin, .. }));
        assert!(ac.check_revoke(&id("eve"), &id("root"), Role::Admin).is_err());
    }

    #[test]
    fn grant_reports_noop() {
        let mut ac = AccessControl::new(id("root"));
        assert!(ac.check_grant(&id("root"), &id("a"), Role::Issuer).unwrap());
        ac.insert(id("a"), Role::Issuer);
        assert!(!ac.check_grant(&id("root"), &id("a"), Role::Issuer).unwrap());
        assert_eq!(ac.members(Role::Issuer), vec![id("a")]);
    }

    #[test]
    fn last_admin_is_protected() {
        let mut ac = AccessControl::new(id("root"));
        let err = ac.check_revoke(&id("root"), &id("root"), Role::Admin).unwrap_err();
        assert!(matches!(err, RegistryError::LastAdminProtected { .. }));
        assert!(ac.check_renounce(&id("root"), Role::Admin).is_err());

        ac.insert(id("second"), Role::Admin);
        assert!(ac.check_revoke(&id("second"), &id("root"), Role::Admin).unwrap());
        ac.remove(&id("root"), Role::Admin);
        assert_eq!(ac.members(Role::Admin), vec![id("second")]);
        assert!(ac.check_renounce(&id("second"), Role::Admin).is_err());
    }

    #[test]
    fn revoking_absent_role_is_noop() {
        let ac = AccessControl::new(id("root"));
        assert!(!ac.check_revoke(&id("root"), &id("a"), Role::Revoker).unwrap());
        assert!(!ac.check_renounce(&id("a"), Role::Issuer).unwrap());
    }
}
