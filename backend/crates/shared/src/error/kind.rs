//! Error Kind - Classification of errors
//!
//! [`ErrorKind`] is the closed set of failure classes the API reports, each
//! pinned to one HTTP status.

use serde::Serialize;

/// Failure class, mapped 1:1 onto an HTTP status
///
/// ```rust
/// use kernel::error::kind::ErrorKind;
///
/// assert_eq!(ErrorKind::PaymentRequired.status_code(), 402);
/// assert_eq!(ErrorKind::PaymentRequired.as_str(), "Payment Required");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ErrorKind {
    /// Malformed or invalid input
    BadRequest,
    /// No usable credentials, or credentials that did not verify
    Unauthorized,
    /// The gateway has not reported the payment as succeeded
    PaymentRequired,
    /// Authenticated, but the wrong kind of principal or role
    Forbidden,
    NotFound,
    /// Duplicate identity
    Conflict,
    InternalServerError,
    /// Upstream (payment gateway, catalog, database pool) unavailable
    ServiceUnavailable,
}

impl ErrorKind {
    #[inline]
    pub const fn status_code(&self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::Unauthorized => 401,
            ErrorKind::PaymentRequired => 402,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::InternalServerError => 500,
            ErrorKind::ServiceUnavailable => 503,
        }
    }

    /// Standard reason phrase, used as the problem document `title`
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "Bad Request",
            ErrorKind::Unauthorized => "Unauthorized",
            ErrorKind::PaymentRequired => "Payment Required",
            ErrorKind::Forbidden => "Forbidden",
            ErrorKind::NotFound => "Not Found",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::InternalServerError => "Internal Server Error",
            ErrorKind::ServiceUnavailable => "Service Unavailable",
        }
    }

    /// 5xx; these get logged at error level
    #[inline]
    pub const fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }

    #[inline]
    pub const fn is_client_error(&self) -> bool {
        let code = self.status_code();
        code >= 400 && code < 500
    }

    /// The same request may succeed if sent again later
    #[inline]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::ServiceUnavailable)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let expected = [
            (ErrorKind::BadRequest, 400),
            (ErrorKind::Unauthorized, 401),
            (ErrorKind::PaymentRequired, 402),
            (ErrorKind::Forbidden, 403),
            (ErrorKind::NotFound, 404),
            (ErrorKind::Conflict, 409),
            (ErrorKind::InternalServerError, 500),
            (ErrorKind::ServiceUnavailable, 503),
        ];
        for (kind, code) in expected {
            assert_eq!(kind.status_code(), code, "{kind}");
        }
    }

    #[test]
    fn test_only_upstream_failures_are_retryable() {
        assert!(ErrorKind::ServiceUnavailable.is_retryable());
        assert!(!ErrorKind::PaymentRequired.is_retryable());
        assert!(!ErrorKind::Forbidden.is_retryable());
        assert!(!ErrorKind::InternalServerError.is_retryable());
    }

    #[test]
    fn test_client_server_split() {
        assert!(ErrorKind::PaymentRequired.is_client_error());
        assert!(!ErrorKind::PaymentRequired.is_server_error());
        assert!(ErrorKind::ServiceUnavailable.is_server_error());
        assert!(!ErrorKind::ServiceUnavailable.is_client_error());
    }
}
