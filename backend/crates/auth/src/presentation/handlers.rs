//! HTTP Handlers (buyer namespace)

use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use platform::cookie::{delete_cookie_header, extract_bearer_token, extract_cookie, set_cookie_header};

use crate::application::{AuthServices, IssuedSession, SignInInput, SignUpInput};
use crate::domain::repository::AuthStore;
use crate::domain::value_object::Principal;
use crate::error::AuthResult;
use crate::presentation::dto::{
    LoginRequest, LogoutResponse, RegisterRequest, SessionStatusResponse, SessionTokenResponse,
};
use crate::presentation::middleware::ClientInfo;

/// Attach a `Set-Cookie` header when one could be built
pub(crate) fn with_cookie(mut response: Response, cookie: Option<HeaderValue>) -> Response {
    if let Some(cookie) = cookie {
        response.headers_mut().append(header::SET_COOKIE, cookie);
    }
    response
}

fn session_response<R: AuthStore>(
    services: &AuthServices<R>,
    status: StatusCode,
    session: &IssuedSession,
) -> Response {
    let cookie = set_cookie_header(&services.config.buyer_cookie(), session.token.expose());
    let body = SessionTokenResponse {
        session_token: session.token.expose().to_string(),
        expires_at: session.expires_at,
    };
    with_cookie((status, Json(body)).into_response(), cookie)
}

// ============================================================================
// Register
// ============================================================================

/// POST /api/auth/register
pub async fn register<R>(
    State(services): State<AuthServices<R>>,
    ClientInfo(client): ClientInfo,
    Json(req): Json<RegisterRequest>,
) -> AuthResult<Response>
where
    R: AuthStore,
{
    let input = SignUpInput {
        email: req.email,
        user_name: req.username,
        password: req.password,
    };

    let output = services.sign_up().execute(input, &client).await?;

    tracing::info!(buyer_id = %output.buyer.buyer_id, "Buyer registered");

    Ok(session_response(&services, StatusCode::CREATED, &output.session))
}

// ============================================================================
// Login
// ============================================================================

/// POST /api/auth/login
pub async fn login<R>(
    State(services): State<AuthServices<R>>,
    ClientInfo(client): ClientInfo,
    Json(req): Json<LoginRequest>,
) -> AuthResult<Response>
where
    R: AuthStore,
{
    let input = SignInInput {
        email: req.email,
        password: req.password,
    };

    let output = services.sign_in().execute(input, &client).await?;

    Ok(session_response(&services, StatusCode::OK, &output.session))
}

// ============================================================================
// Logout
// ============================================================================

/// POST /api/auth/logout
///
/// Always 200; the cookie is cleared even if no session matched.
pub async fn logout<R>(State(services): State<AuthServices<R>>, headers: HeaderMap) -> Response
where
    R: AuthStore,
{
    let token = extract_bearer_token(&headers)
        .or_else(|| extract_cookie(&headers, &services.config.buyer_cookie_name));

    if let Err(e) = services.sign_out().buyer(token.as_deref()).await {
        tracing::warn!(error = %e, "Failed to revoke buyer session on logout");
    }

    let cookie = delete_cookie_header(&services.config.buyer_cookie());
    with_cookie(Json(LogoutResponse { signed_out: true }).into_response(), cookie)
}

// ============================================================================
// Session Status
// ============================================================================

/// GET /api/auth/session (behind `optional_buyer`)
pub async fn session_status(Extension(principal): Extension<Principal>) -> Json<SessionStatusResponse> {
    let response = match principal.as_buyer() {
        Some(buyer) => SessionStatusResponse {
            authenticated: true,
            buyer_id: Some(buyer.buyer_id.into_uuid()),
            email: Some(buyer.email.as_str().to_string()),
            user_name: Some(buyer.user_name.clone()),
            expires_at: Some(buyer.session_expires_at),
        },
        None => SessionStatusResponse {
            authenticated: false,
            buyer_id: None,
            email: None,
            user_name: None,
            expires_at: None,
        },
    };
    Json(response)
}
