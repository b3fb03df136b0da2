//! Auth Middleware
//!
//! Route gates over [`AuthGuard`]. Mount with
//! `axum::middleware::from_fn_with_state(guard, require_buyer::<R>)`.
//!
//! On success the resolved principal is placed in request extensions:
//! - `require_buyer`: [`BuyerPrincipal`] and [`Principal`]
//! - `optional_buyer`: [`Principal`] (plus [`BuyerPrincipal`] when signed in)
//! - `require_admin` / `require_super_admin`: [`AdminPrincipal`] and [`Principal`]

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts, OriginalUri, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use platform::client::ClientContext;
use platform::cookie::{extract_bearer_token, extract_cookie};

use crate::application::config::AuthConfig;
use crate::application::guard::{AuthGuard, GuardDecision, PresentedCredentials};
use crate::domain::repository::AuthStore;
use crate::domain::value_object::{AdminRole, DenialReason, Principal};
use crate::error::AuthError;

/// Client address and user agent of the current request
///
/// Works with or without `ConnectInfo` (e.g. under `oneshot` in tests).
#[derive(Debug, Clone)]
pub struct ClientInfo(pub ClientContext);

impl<S> FromRequestParts<S> for ClientInfo
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(client_context(parts)))
    }
}

fn client_context(parts: &Parts) -> ClientContext {
    let direct_ip = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip());
    ClientContext::from_headers(&parts.headers, direct_ip)
}

/// Collect everything the request presents, for the guard
pub fn presented_credentials(parts: &Parts, config: &AuthConfig) -> PresentedCredentials {
    // Nested routers see a stripped URI; the audit log wants the full path.
    let path = parts
        .extensions
        .get::<OriginalUri>()
        .map(|uri| uri.0.path().to_string())
        .unwrap_or_else(|| parts.uri.path().to_string());

    PresentedCredentials {
        bearer: extract_bearer_token(&parts.headers),
        buyer_cookie: extract_cookie(&parts.headers, &config.buyer_cookie_name),
        admin_cookie: extract_cookie(&parts.headers, &config.admin_cookie_name),
        client: client_context(parts),
        operation: format!("{} {}", parts.method, path),
    }
}

/// Buyer-only gate
pub async fn require_buyer<R>(State(guard): State<AuthGuard<R>>, req: Request, next: Next) -> Response
where
    R: AuthStore,
{
    let (mut parts, body) = req.into_parts();
    let creds = presented_credentials(&parts, guard.config());

    match guard.require_buyer(&creds).await {
        Ok(GuardDecision::Authenticated(principal)) => {
            if let Some(buyer) = principal.as_buyer() {
                parts.extensions.insert(buyer.clone());
            }
            parts.extensions.insert(principal);
            next.run(Request::from_parts(parts, body)).await
        }
        Ok(GuardDecision::Rejected(reason)) => AuthError::AccessDenied(reason).into_response(),
        Ok(GuardDecision::Anonymous) => {
            AuthError::AccessDenied(DenialReason::MissingCredentials).into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// Anonymous-or-buyer gate; admin tokens are still refused
pub async fn optional_buyer<R>(State(guard): State<AuthGuard<R>>, req: Request, next: Next) -> Response
where
    R: AuthStore,
{
    let (mut parts, body) = req.into_parts();
    let creds = presented_credentials(&parts, guard.config());

    match guard.optional_buyer(&creds).await {
        Ok(GuardDecision::Authenticated(principal)) => {
            if let Some(buyer) = principal.as_buyer() {
                parts.extensions.insert(buyer.clone());
            }
            parts.extensions.insert(principal);
            next.run(Request::from_parts(parts, body)).await
        }
        Ok(GuardDecision::Anonymous) => {
            parts.extensions.insert(Principal::AnonymousBuyer);
            next.run(Request::from_parts(parts, body)).await
        }
        Ok(GuardDecision::Rejected(reason)) => AuthError::AccessDenied(reason).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Admin or super-admin gate
pub async fn require_admin<R>(State(guard): State<AuthGuard<R>>, req: Request, next: Next) -> Response
where
    R: AuthStore,
{
    admin_gate(guard, AdminRole::Admin, req, next).await
}

/// Super-admin gate
pub async fn require_super_admin<R>(
    State(guard): State<AuthGuard<R>>,
    req: Request,
    next: Next,
) -> Response
where
    R: AuthStore,
{
    admin_gate(guard, AdminRole::SuperAdmin, req, next).await
}

async fn admin_gate<R>(guard: AuthGuard<R>, required: AdminRole, req: Request, next: Next) -> Response
where
    R: AuthStore,
{
    let (mut parts, body) = req.into_parts();
    let creds = presented_credentials(&parts, guard.config());

    match guard.require_admin(&creds, required).await {
        Ok(GuardDecision::Authenticated(principal)) => {
            if let Some(admin) = principal.as_admin() {
                parts.extensions.insert(admin.clone());
            }
            parts.extensions.insert(principal);
            next.run(Request::from_parts(parts, body)).await
        }
        Ok(GuardDecision::Rejected(reason)) => AuthError::AccessDenied(reason).into_response(),
        Ok(GuardDecision::Anonymous) => {
            AuthError::AccessDenied(DenialReason::MissingCredentials).into_response()
        }
        Err(e) => e.into_response(),
    }
}
