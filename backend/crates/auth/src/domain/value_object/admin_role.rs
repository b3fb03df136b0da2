use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of a staff account
///
/// Buyers have no role; they live in a different table entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum AdminRole {
    Admin = 1,
    SuperAdmin = 2,
}

impl AdminRole {
    #[inline]
    pub const fn id(&self) -> i16 {
        *self as i16
    }

    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            AdminRole::Admin => "admin",
            AdminRole::SuperAdmin => "super_admin",
        }
    }

    #[inline]
    pub const fn is_super_admin(&self) -> bool {
        matches!(self, AdminRole::SuperAdmin)
    }

    /// Whether this role satisfies an operation gated at `required`
    #[inline]
    pub const fn satisfies(&self, required: AdminRole) -> bool {
        self.id() >= required.id()
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(AdminRole::Admin),
            2 => Some(AdminRole::SuperAdmin),
            _ => None,
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "admin" => Some(AdminRole::Admin),
            "super_admin" => Some(AdminRole::SuperAdmin),
            _ => None,
        }
    }
}

impl fmt::Display for AdminRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_role_ids_roundtrip() {
        assert_eq!(AdminRole::from_id(1), Some(AdminRole::Admin));
        assert_eq!(AdminRole::from_id(2), Some(AdminRole::SuperAdmin));
        assert_eq!(AdminRole::from_id(0), None);
        assert_eq!(AdminRole::from_code("super_admin"), Some(AdminRole::SuperAdmin));
        assert_eq!(AdminRole::from_code("user"), None);
    }

    #[test]
    fn test_role_satisfies() {
        assert!(AdminRole::SuperAdmin.satisfies(AdminRole::Admin));
        assert!(AdminRole::SuperAdmin.satisfies(AdminRole::SuperAdmin));
        assert!(AdminRole::Admin.satisfies(AdminRole::Admin));
        assert!(!AdminRole::Admin.satisfies(AdminRole::SuperAdmin));
    }

    #[test]
    fn test_serde_codes() {
        assert_eq!(
            serde_json::to_string(&AdminRole::SuperAdmin).unwrap(),
            "\"super_admin\""
        );
        let role: AdminRole = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, AdminRole::Admin);
    }
}
