//! Commerce Error Types
//!
//! Checkout, fulfillment and favorites errors, rendered through
//! `kernel::error::AppError`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

use crate::domain::value_object::{PaymentReference, ProfileId};

pub type CommerceResult<T> = Result<T, CommerceError>;

#[derive(Debug, Error)]
pub enum CommerceError {
    #[error("{0}")]
    Validation(String),

    #[error("The basket is empty")]
    EmptyBasket,

    #[error("The basket holds more than {max} profiles")]
    BasketTooLarge { max: usize },

    /// Missing or not approved at checkout time; names the first failing id
    #[error("Profile {0} is not available")]
    ProfileUnavailable(ProfileId),

    #[error("Profile {0} not found")]
    ProfileNotFound(ProfileId),

    /// Gateway reports failed, cancelled, pending or unknown
    #[error("Payment has not succeeded")]
    PaymentNotSucceeded { reference: PaymentReference },

    #[error("Order not found")]
    OrderNotFound,

    /// Payment gateway or profile store unreachable or timed out
    #[error("Upstream service unavailable: {0}")]
    Upstream(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CommerceError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CommerceError::Validation(_)
            | CommerceError::EmptyBasket
            | CommerceError::BasketTooLarge { .. }
            | CommerceError::ProfileUnavailable(_) => ErrorKind::BadRequest,
            CommerceError::ProfileNotFound(_) | CommerceError::OrderNotFound => ErrorKind::NotFound,
            CommerceError::PaymentNotSucceeded { .. } => ErrorKind::PaymentRequired,
            CommerceError::Upstream(_) => ErrorKind::ServiceUnavailable,
            CommerceError::Database(_) | CommerceError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    pub fn to_app_error(&self) -> AppError {
        match self {
            CommerceError::Database(_) | CommerceError::Internal(_) => {
                AppError::new(self.kind(), "Internal server error")
            }
            CommerceError::PaymentNotSucceeded { reference } => {
                AppError::new(self.kind(), self.to_string()).with_action(format!(
                    "Payment could not be confirmed, please contact support with reference {reference}"
                ))
            }
            CommerceError::Upstream(_) => {
                AppError::new(self.kind(), "Payment service temporarily unavailable")
                    .with_action("Please retry in a few seconds")
            }
            _ => AppError::new(self.kind(), self.to_string()),
        }
    }

    fn log(&self) {
        match self {
            CommerceError::Database(e) => {
                tracing::error!(error = %e, "Commerce database error");
            }
            CommerceError::Internal(msg) => {
                tracing::error!(message = %msg, "Commerce internal error");
            }
            CommerceError::Upstream(msg) => {
                tracing::warn!(message = %msg, "Upstream failure");
            }
            CommerceError::PaymentNotSucceeded { reference } => {
                tracing::info!(payment_reference = %reference, "Payment not succeeded");
            }
            _ => {
                tracing::debug!(error = %self, "Commerce error");
            }
        }
    }
}

impl IntoResponse for CommerceError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AppError> for CommerceError {
    fn from(err: AppError) -> Self {
        match err.kind() {
            ErrorKind::BadRequest => CommerceError::Validation(err.message().to_string()),
            _ => CommerceError::Internal(err.message().to_string()),
        }
    }
}

impl From<serde_json::Error> for CommerceError {
    fn from(err: serde_json::Error) -> Self {
        CommerceError::Internal(format!("JSON error: {err}"))
    }
}

impl From<auth::AuthError> for CommerceError {
    fn from(err: auth::AuthError) -> Self {
        match err {
            auth::AuthError::Validation(msg) => CommerceError::Validation(msg),
            other => CommerceError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let reference = PaymentReference::new("pay_1").unwrap();
        assert_eq!(
            CommerceError::PaymentNotSucceeded { reference }.status_code(),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(
            CommerceError::ProfileUnavailable(ProfileId::new(3)).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            CommerceError::Upstream("timeout".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            CommerceError::ProfileNotFound(ProfileId::new(3)).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_only_upstream_is_retryable() {
        assert!(CommerceError::Upstream("x".into()).is_retryable());
        assert!(!CommerceError::EmptyBasket.is_retryable());
        assert!(!CommerceError::OrderNotFound.is_retryable());
    }

    #[test]
    fn test_payment_not_succeeded_names_reference() {
        let reference = PaymentReference::new("pay_456").unwrap();
        let app = CommerceError::PaymentNotSucceeded { reference }.to_app_error();
        assert_eq!(app.status_code(), 402);
        assert!(app.action().unwrap().contains("pay_456"));
    }

    #[test]
    fn test_database_error_is_masked() {
        let app = CommerceError::Database(sqlx::Error::RowNotFound).to_app_error();
        assert_eq!(app.message(), "Internal server error");
    }
}
