//! HTTP Handlers (admin namespace)

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use kernel::id::AdminId;
use platform::cookie::{delete_cookie_header, extract_bearer_token, extract_cookie, set_cookie_header};
use uuid::Uuid;

use crate::application::{AdminSignInInput, AuthServices, CreateAdminInput};
use crate::domain::repository::AuthStore;
use crate::domain::value_object::AdminPrincipal;
use crate::error::AuthResult;
use crate::presentation::dto::{
    AccessDenialResponse, AdminLoginRequest, AdminLoginResponse, AdminResponse,
    ChangeRoleRequest, CreateAdminRequest, DenialsQuery, LogoutResponse,
    UpdateAdminProfileRequest,
};
use crate::presentation::handlers::with_cookie;
use crate::presentation::middleware::ClientInfo;

const DEFAULT_DENIALS_PAGE: i64 = 100;

/// POST /api/admin/auth/login
pub async fn admin_login<R>(
    State(services): State<AuthServices<R>>,
    ClientInfo(client): ClientInfo,
    Json(req): Json<AdminLoginRequest>,
) -> AuthResult<Response>
where
    R: AuthStore,
{
    let input = AdminSignInInput {
        identifier: req.identifier,
        password: req.password,
    };

    let output = services.admin_sign_in().execute(input, &client).await?;

    let cookie = set_cookie_header(
        &services.config.admin_cookie(),
        output.session.token.expose(),
    );
    let body = AdminLoginResponse {
        session_token: output.session.token.expose().to_string(),
        expires_at: output.session.expires_at,
        admin: output.admin.into(),
    };
    Ok(with_cookie(Json(body).into_response(), cookie))
}

/// POST /api/admin/auth/logout
pub async fn admin_logout<R>(State(services): State<AuthServices<R>>, headers: HeaderMap) -> Response
where
    R: AuthStore,
{
    let token = extract_bearer_token(&headers)
        .or_else(|| extract_cookie(&headers, &services.config.admin_cookie_name));

    if let Err(e) = services.sign_out().admin(token.as_deref()).await {
        tracing::warn!(error = %e, "Failed to revoke admin session on logout");
    }

    let cookie = delete_cookie_header(&services.config.admin_cookie());
    with_cookie(Json(LogoutResponse { signed_out: true }).into_response(), cookie)
}

/// GET /api/admin/me
pub async fn me<R>(
    State(services): State<AuthServices<R>>,
    Extension(admin): Extension<AdminPrincipal>,
) -> AuthResult<Json<AdminResponse>>
where
    R: AuthStore,
{
    let account = services.admin_accounts().get(&admin.admin_id).await?;
    Ok(Json(account.into()))
}

/// PATCH /api/admin/me
pub async fn update_me<R>(
    State(services): State<AuthServices<R>>,
    Extension(admin): Extension<AdminPrincipal>,
    Json(req): Json<UpdateAdminProfileRequest>,
) -> AuthResult<Json<AdminResponse>>
where
    R: AuthStore,
{
    let account = services
        .admin_accounts()
        .update_own_email(&admin, &req.email)
        .await?;
    Ok(Json(account.into()))
}

/// POST /api/admin/accounts (super admin)
pub async fn create_admin<R>(
    State(services): State<AuthServices<R>>,
    Extension(actor): Extension<AdminPrincipal>,
    Json(req): Json<CreateAdminRequest>,
) -> AuthResult<(StatusCode, Json<AdminResponse>)>
where
    R: AuthStore,
{
    let input = CreateAdminInput {
        user_name: req.user_name,
        email: req.email,
        password: req.password,
        role: req.role,
    };
    let account = services.admin_accounts().create(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(account.into())))
}

/// PUT /api/admin/accounts/{admin_id}/role (super admin)
pub async fn change_role<R>(
    State(services): State<AuthServices<R>>,
    Extension(actor): Extension<AdminPrincipal>,
    Path(admin_id): Path<Uuid>,
    Json(req): Json<ChangeRoleRequest>,
) -> AuthResult<Json<AdminResponse>>
where
    R: AuthStore,
{
    let account = services
        .admin_accounts()
        .change_role(&actor, &AdminId::from_uuid(admin_id), req.role)
        .await?;
    Ok(Json(account.into()))
}

/// GET /api/admin/audit/denials?limit= (super admin)
pub async fn list_denials<R>(
    State(services): State<AuthServices<R>>,
    Query(query): Query<DenialsQuery>,
) -> AuthResult<Json<Vec<AccessDenialResponse>>>
where
    R: AuthStore,
{
    let denials = services
        .admin_accounts()
        .recent_denials(query.limit.unwrap_or(DEFAULT_DENIALS_PAGE))
        .await?;
    Ok(Json(denials.into_iter().map(Into::into).collect()))
}
