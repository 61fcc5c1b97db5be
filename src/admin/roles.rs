/// Admin Role Levels
use crate::error::{HubError, HubResult};
use serde::{Deserialize, Serialize};

/// Admin role levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Can view lists, records and dashboards
    Moderator,
    /// Can create, delete and transition records
    Admin,
    /// Full access, including the audit log
    SuperAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Moderator => "moderator",
            Role::Admin => "admin",
            Role::SuperAdmin => "superadmin",
        }
    }

    pub fn parse(s: &str) -> HubResult<Self> {
        match s.to_lowercase().as_str() {
            "moderator" => Ok(Role::Moderator),
            "admin" => Ok(Role::Admin),
            "superadmin" => Ok(Role::SuperAdmin),
            _ => Err(HubError::Validation(format!("Invalid role: {}", s))),
        }
    }

    /// Check if this role can perform actions requiring another role
    pub fn can_act_as(&self, required: Role) -> bool {
        self >= &required
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_ordering() {
        assert!(Role::SuperAdmin.can_act_as(Role::Admin));
        assert!(Role::Admin.can_act_as(Role::Moderator));
        assert!(Role::Admin.can_act_as(Role::Admin));
        assert!(!Role::Moderator.can_act_as(Role::Admin));
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("ADMIN").unwrap(), Role::Admin);
        assert_eq!(Role::parse("superadmin").unwrap(), Role::SuperAdmin);
        assert!(Role::parse("owner").is_err());
    }
}
