//! Principals
//!
//! A request carries at most one principal. Buyer principals can only be
//! built from a buyer session and admin principals only from an admin
//! session; nothing converts one into the other.

use chrono::{DateTime, Utc};
use kernel::id::{AdminId, BuyerId};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

use crate::domain::value_object::{admin_role::AdminRole, email::Email};

/// Principal class, as recorded in audit entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalKind {
    AnonymousBuyer,
    Buyer,
    Admin,
    SuperAdmin,
}

impl PrincipalKind {
    pub const fn code(&self) -> &'static str {
        match self {
            PrincipalKind::AnonymousBuyer => "anonymous_buyer",
            PrincipalKind::Buyer => "buyer",
            PrincipalKind::Admin => "admin",
            PrincipalKind::SuperAdmin => "super_admin",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "anonymous_buyer" => Some(PrincipalKind::AnonymousBuyer),
            "buyer" => Some(PrincipalKind::Buyer),
            "admin" => Some(PrincipalKind::Admin),
            "super_admin" => Some(PrincipalKind::SuperAdmin),
            _ => None,
        }
    }

    pub const fn for_admin_role(role: AdminRole) -> Self {
        match role {
            AdminRole::Admin => PrincipalKind::Admin,
            AdminRole::SuperAdmin => PrincipalKind::SuperAdmin,
        }
    }
}

impl fmt::Display for PrincipalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Authenticated buyer
#[derive(Debug, Clone)]
pub struct BuyerPrincipal {
    pub buyer_id: BuyerId,
    pub email: Email,
    pub user_name: String,
    pub session_expires_at: DateTime<Utc>,
}

/// Authenticated staff member, with the role read from the account on this
/// request (not the role the session was issued with)
#[derive(Debug, Clone)]
pub struct AdminPrincipal {
    pub admin_id: AdminId,
    pub user_name: String,
    pub email: Email,
    pub role: AdminRole,
    pub session_expires_at: DateTime<Utc>,
}

/// Request principal
#[derive(Debug, Clone)]
pub enum Principal {
    AnonymousBuyer,
    Buyer(BuyerPrincipal),
    Admin(AdminPrincipal),
    SuperAdmin(AdminPrincipal),
}

impl Principal {
    pub fn from_admin(admin: AdminPrincipal) -> Self {
        match admin.role {
            AdminRole::Admin => Principal::Admin(admin),
            AdminRole::SuperAdmin => Principal::SuperAdmin(admin),
        }
    }

    pub fn kind(&self) -> PrincipalKind {
        match self {
            Principal::AnonymousBuyer => PrincipalKind::AnonymousBuyer,
            Principal::Buyer(_) => PrincipalKind::Buyer,
            Principal::Admin(_) => PrincipalKind::Admin,
            Principal::SuperAdmin(_) => PrincipalKind::SuperAdmin,
        }
    }

    pub fn id(&self) -> Option<Uuid> {
        match self {
            Principal::AnonymousBuyer => None,
            Principal::Buyer(b) => Some(b.buyer_id.into_uuid()),
            Principal::Admin(a) | Principal::SuperAdmin(a) => Some(a.admin_id.into_uuid()),
        }
    }

    pub fn as_buyer(&self) -> Option<&BuyerPrincipal> {
        match self {
            Principal::Buyer(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_admin(&self) -> Option<&AdminPrincipal> {
        match self {
            Principal::Admin(a) | Principal::SuperAdmin(a) => Some(a),
            _ => None,
        }
    }
}

/// Why the guard refused a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    /// Admin token presented to a buyer-facing operation
    AdminAccessDenied,
    /// Buyer token presented to an admin operation
    BuyerAccessDenied,
    /// Admin presented to a super-admin operation
    InsufficientRole,
    /// Admin session presented from a different IP than it was issued to
    SessionIpMismatch,
    MissingCredentials,
    /// Unknown, expired or revoked token
    InvalidSession,
    /// Account deactivated while the session was live
    AccountDisabled,
}

impl DenialReason {
    pub const fn code(&self) -> &'static str {
        match self {
            DenialReason::AdminAccessDenied => "admin_access_denied",
            DenialReason::BuyerAccessDenied => "buyer_access_denied",
            DenialReason::InsufficientRole => "insufficient_role",
            DenialReason::SessionIpMismatch => "session_ip_mismatch",
            DenialReason::MissingCredentials => "missing_credentials",
            DenialReason::InvalidSession => "invalid_session",
            DenialReason::AccountDisabled => "account_disabled",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        [
            DenialReason::AdminAccessDenied,
            DenialReason::BuyerAccessDenied,
            DenialReason::InsufficientRole,
            DenialReason::SessionIpMismatch,
            DenialReason::MissingCredentials,
            DenialReason::InvalidSession,
            DenialReason::AccountDisabled,
        ]
        .into_iter()
        .find(|r| r.code() == code)
    }

    /// 401 reasons ask the client to authenticate; the rest are 403
    pub const fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            DenialReason::MissingCredentials
                | DenialReason::InvalidSession
                | DenialReason::SessionIpMismatch
        )
    }

    /// What the client is told; the specific reason stays server-side
    pub const fn public_message(&self) -> &'static str {
        if self.is_unauthenticated() {
            "Authentication required"
        } else {
            "Access denied"
        }
    }
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin(role: AdminRole) -> AdminPrincipal {
        AdminPrincipal {
            admin_id: AdminId::new(),
            user_name: "ops".into(),
            email: Email::new("ops@example.com").unwrap(),
            role,
            session_expires_at: Utc::now(),
        }
    }

    #[test]
    fn test_principal_from_admin_role() {
        assert_eq!(
            Principal::from_admin(admin(AdminRole::Admin)).kind(),
            PrincipalKind::Admin
        );
        let sa = Principal::from_admin(admin(AdminRole::SuperAdmin));
        assert_eq!(sa.kind(), PrincipalKind::SuperAdmin);
        assert!(sa.as_admin().is_some());
        assert!(sa.as_buyer().is_none());
    }

    #[test]
    fn test_anonymous_has_no_id() {
        assert_eq!(Principal::AnonymousBuyer.id(), None);
        assert_eq!(Principal::AnonymousBuyer.kind().code(), "anonymous_buyer");
    }

    #[test]
    fn test_denial_reason_codes_roundtrip() {
        for reason in [
            DenialReason::AdminAccessDenied,
            DenialReason::BuyerAccessDenied,
            DenialReason::InsufficientRole,
            DenialReason::SessionIpMismatch,
            DenialReason::MissingCredentials,
            DenialReason::InvalidSession,
            DenialReason::AccountDisabled,
        ] {
            assert_eq!(DenialReason::from_code(reason.code()), Some(reason));
        }
        assert!(DenialReason::MissingCredentials.is_unauthenticated());
        assert!(!DenialReason::AdminAccessDenied.is_unauthenticated());
    }
}
