//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

use crate::domain::value_object::principal::DenialReason;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong password or unknown identity; the two are indistinguishable
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Email or user name already registered in that role's table
    #[error("An account with this email or user name already exists")]
    DuplicateIdentity,

    #[error("Account is disabled")]
    AccountDisabled,

    #[error("Session not found or expired")]
    SessionInvalid,

    #[error("Session expired")]
    SessionExpired,

    /// Admin session presented from another IP (the session is revoked)
    #[error("Session not valid from this address")]
    SessionIpMismatch,

    /// Guard rejection. The message is generic on purpose; the reason goes
    /// to the audit log only.
    #[error("{}", .0.public_message())]
    AccessDenied(DenialReason),

    #[error("Admin account not found")]
    AdminNotFound,

    #[error("You cannot change your own role")]
    CannotChangeOwnRole,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    PasswordPolicy(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidCredentials
            | AuthError::SessionInvalid
            | AuthError::SessionExpired
            | AuthError::SessionIpMismatch => StatusCode::UNAUTHORIZED,
            AuthError::AccessDenied(reason) if reason.is_unauthenticated() => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::AccessDenied(_)
            | AuthError::AccountDisabled
            | AuthError::CannotChangeOwnRole => StatusCode::FORBIDDEN,
            AuthError::DuplicateIdentity => StatusCode::CONFLICT,
            AuthError::AdminNotFound => StatusCode::NOT_FOUND,
            AuthError::Validation(_) | AuthError::PasswordPolicy(_) => StatusCode::BAD_REQUEST,
            AuthError::Database(_) | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::InvalidCredentials
            | AuthError::SessionInvalid
            | AuthError::SessionExpired
            | AuthError::SessionIpMismatch => ErrorKind::Unauthorized,
            AuthError::AccessDenied(reason) if reason.is_unauthenticated() => {
                ErrorKind::Unauthorized
            }
            AuthError::AccessDenied(_)
            | AuthError::AccountDisabled
            | AuthError::CannotChangeOwnRole => ErrorKind::Forbidden,
            AuthError::DuplicateIdentity => ErrorKind::Conflict,
            AuthError::AdminNotFound => ErrorKind::NotFound,
            AuthError::Validation(_) | AuthError::PasswordPolicy(_) => ErrorKind::BadRequest,
            AuthError::Database(_) | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        match self {
            // Never leak driver messages to clients
            AuthError::Database(_) | AuthError::Internal(_) => {
                AppError::new(self.kind(), "Internal server error")
            }
            AuthError::AccountDisabled => AppError::new(self.kind(), self.to_string())
                .with_action("Contact support if you believe this is a mistake"),
            _ => AppError::new(self.kind(), self.to_string()),
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::SessionIpMismatch => {
                tracing::warn!("Admin session presented from a different address");
            }
            // Already written to the audit log by the guard
            AuthError::AccessDenied(_) => {}
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        match err.kind() {
            ErrorKind::BadRequest => AuthError::Validation(err.message().to_string()),
            _ => AuthError::Internal(err.to_string()),
        }
    }
}

impl From<platform::password::PasswordPolicyError> for AuthError {
    fn from(err: platform::password::PasswordPolicyError) -> Self {
        AuthError::PasswordPolicy(err.to_string())
    }
}

impl From<platform::password::PasswordHashError> for AuthError {
    fn from(err: platform::password::PasswordHashError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

impl From<crate::domain::value_object::user_name::UserNameError> for AuthError {
    fn from(err: crate::domain::value_object::user_name::UserNameError) -> Self {
        AuthError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_denied_statuses() {
        assert_eq!(
            AuthError::AccessDenied(DenialReason::MissingCredentials).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::AccessDenied(DenialReason::AdminAccessDenied).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AuthError::AccessDenied(DenialReason::InsufficientRole).kind(),
            ErrorKind::Forbidden
        );
    }

    #[test]
    fn test_access_denied_message_is_generic() {
        let err = AuthError::AccessDenied(DenialReason::BuyerAccessDenied);
        assert_eq!(err.to_string(), "Access denied");
        let err = AuthError::AccessDenied(DenialReason::InvalidSession);
        assert_eq!(err.to_string(), "Authentication required");
    }

    #[test]
    fn test_internal_errors_are_masked() {
        let app = AuthError::Internal("pool exhausted at 10.0.0.5".into()).to_app_error();
        assert_eq!(app.message(), "Internal server error");
        assert_eq!(app.status_code(), 500);
    }

    #[test]
    fn test_kind_and_status_agree() {
        let errors = [
            AuthError::InvalidCredentials,
            AuthError::DuplicateIdentity,
            AuthError::AccountDisabled,
            AuthError::SessionExpired,
            AuthError::AdminNotFound,
            AuthError::CannotChangeOwnRole,
            AuthError::Validation("x".into()),
        ];
        for err in errors {
            assert_eq!(err.status_code().as_u16(), err.kind().status_code());
        }
    }
}
