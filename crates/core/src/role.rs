//! Member roles

use serde::{Deserialize, Serialize};

/// Role attached to a member account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Ordinary member
    Member,
    /// Staff member who resolves requests assigned to them
    Approver,
    /// Staff member who may resolve any request
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Member => "member",
            Role::Approver => "approver",
            Role::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "member" => Some(Role::Member),
            "approver" => Some(Role::Approver),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    /// Approvers may only resolve requests assigned to them; admins may
    /// resolve any request.
    pub fn is_restricted_resolver(&self) -> bool {
        matches!(self, Role::Approver)
    }

    pub fn can_resolve(&self) -> bool {
        matches!(self, Role::Approver | Role::Admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_str_roundtrip() {
        for role in [Role::Member, Role::Approver, Role::Admin] {
            assert_eq!(Role::from_str(role.as_str()), Some(role));
        }
        assert_eq!(Role::from_str("owner"), None);
    }

    #[test]
    fn test_resolver_permissions() {
        assert!(!Role::Member.can_resolve());
        assert!(Role::Approver.can_resolve());
        assert!(Role::Approver.is_restricted_resolver());
        assert!(Role::Admin.can_resolve());
        assert!(!Role::Admin.is_restricted_resolver());
    }
}
