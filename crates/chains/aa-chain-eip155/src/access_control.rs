//! Role-based access control.
//!
//! Roles are 32-byte identifiers. Members of a role's admin role may grant and
//! revoke it. Every role is administered by [`DEFAULT_ADMIN_ROLE`], which is its
//! own admin.

use alloy_primitives::{Address, B256};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::ExecutionError;

pub const DEFAULT_ADMIN_ROLE: B256 = B256::ZERO;

/// Read access to role membership.
pub trait RoleStore {
    fn has_role(&self, role: B256, account: Address) -> bool;

    fn role_admin(&self, role: B256) -> B256;

    fn check_role(&self, role: B256, account: Address) -> Result<(), ExecutionError> {
        if self.has_role(role, account) {
            Ok(())
        } else {
            Err(ExecutionError::Unauthorized { caller: account })
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessControl {
    members: BTreeMap<B256, BTreeSet<Address>>,
}

impl AccessControl {
    pub const fn new() -> Self {
        Self {
            members: BTreeMap::new(),
        }
    }

    /// Returns `true` if `account` did not have `role` before.
    pub fn grant_role(&mut self, role: B256, account: Address) -> bool {
        self.members.entry(role).or_default().insert(account)
    }

    /// Returns `true` if `account` had `role`.
    pub fn revoke_role(&mut self, role: B256, account: Address) -> bool {
        let Some(members) = self.members.get_mut(&role) else {
            return false;
        };
        let removed = members.remove(&account);
        if members.is_empty() {
            self.members.remove(&role);
        }
        removed
    }
}

impl RoleStore for AccessControl {
    fn has_role(&self, role: B256, account: Address) -> bool {
        self.members
            .get(&role)
            .is_some_and(|members| members.contains(&account))
    }

    fn role_admin(&self, _role: B256) -> B256 {
        DEFAULT_ADMIN_ROLE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::b256;

    const ADMIN: Address = Address::with_last_byte(1);
    const OTHER: Address = Address::with_last_byte(2);
    const UPGRADER: B256 =
        b256!("0x189ab7a9244df0848122154315af71fe140f3db0fe014031783b0946b8c9d2e3");

    #[test]
    fn test_grant_and_revoke() {
        let mut roles = AccessControl::new();
        assert!(roles.grant_role(DEFAULT_ADMIN_ROLE, ADMIN));
        assert!(!roles.grant_role(DEFAULT_ADMIN_ROLE, ADMIN));
        assert!(roles.has_role(DEFAULT_ADMIN_ROLE, ADMIN));
        assert!(!roles.has_role(DEFAULT_ADMIN_ROLE, OTHER));

        assert!(roles.revoke_role(DEFAULT_ADMIN_ROLE, ADMIN));
        assert!(!roles.revoke_role(DEFAULT_ADMIN_ROLE, ADMIN));
        assert_eq!(roles, AccessControl::new());
    }

    #[test]
    fn test_default_admin_is_its_own_admin() {
        let roles = AccessControl::new();
        assert_eq!(roles.role_admin(DEFAULT_ADMIN_ROLE), DEFAULT_ADMIN_ROLE);
        assert_eq!(roles.role_admin(UPGRADER), DEFAULT_ADMIN_ROLE);
    }

    #[test]
    fn test_check_role() {
        let mut roles = AccessControl::new();
        roles.grant_role(UPGRADER, OTHER);
        assert!(roles.check_role(UPGRADER, OTHER).is_ok());
        assert_eq!(
            roles.check_role(UPGRADER, ADMIN),
            Err(ExecutionError::Unauthorized { caller: ADMIN })
        );
    }
}
