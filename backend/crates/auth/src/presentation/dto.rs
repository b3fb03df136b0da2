//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entity::{AccessDenial, AdminAccount};
use crate::domain::value_object::{AdminRole, DenialReason, PrincipalKind};

// ============================================================================
// Buyer Register / Login
// ============================================================================

/// Register request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    #[serde(alias = "userName")]
    pub username: String,
    pub password: String,
}

/// Login request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Issued session; the same token is also set as a cookie
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTokenResponse {
    pub session_token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutResponse {
    pub signed_out: bool,
}

// ============================================================================
// Session Status
// ============================================================================

/// Buyer session status response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusResponse {
    pub authenticated: bool,
    pub buyer_id: Option<Uuid>,
    pub email: Option<String>,
    pub user_name: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Admin
// ============================================================================

/// Admin login request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminLoginRequest {
    /// User name or email
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminLoginResponse {
    pub session_token: String,
    pub expires_at: DateTime<Utc>,
    pub admin: AdminResponse,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminResponse {
    pub admin_id: Uuid,
    pub user_name: String,
    pub email: String,
    pub role: AdminRole,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<AdminAccount> for AdminResponse {
    fn from(admin: AdminAccount) -> Self {
        Self {
            admin_id: admin.admin_id.into_uuid(),
            user_name: admin.user_name.original().to_string(),
            email: admin.email.into_db(),
            role: admin.role,
            is_active: admin.is_active,
            last_login_at: admin.last_login_at,
        }
    }
}

/// Self-service edit. There is deliberately no role field.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateAdminProfileRequest {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAdminRequest {
    pub user_name: String,
    pub email: String,
    pub password: String,
    #[serde(default = "default_admin_role")]
    pub role: AdminRole,
}

fn default_admin_role() -> AdminRole {
    AdminRole::Admin
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRoleRequest {
    pub role: AdminRole,
}

// ============================================================================
// Audit
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct DenialsQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessDenialResponse {
    pub id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub source_ip: Option<String>,
    pub user_agent: Option<String>,
    pub operation: String,
    pub reason: DenialReason,
    pub presented_principal_kind: Option<PrincipalKind>,
    pub presented_principal_id: Option<Uuid>,
}

impl From<AccessDenial> for AccessDenialResponse {
    fn from(d: AccessDenial) -> Self {
        Self {
            id: d.denial_id.into_uuid(),
            occurred_at: d.occurred_at,
            source_ip: d.source_ip,
            user_agent: d.user_agent,
            operation: d.operation,
            reason: d.reason,
            presented_principal_kind: d.presented_kind,
            presented_principal_id: d.presented_principal_id,
        }
    }
}
