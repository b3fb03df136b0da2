//! Auth Routers

use axum::middleware::from_fn_with_state;
use axum::{
    Router,
    routing::{get, post, put},
};

use crate::application::AuthServices;
use crate::domain::repository::AuthStore;
use crate::presentation::middleware::{optional_buyer, require_admin, require_super_admin};
use crate::presentation::{admin_handlers, handlers};

/// Buyer auth routes, nested at `/api/auth`
pub fn auth_router<R>(services: AuthServices<R>) -> Router
where
    R: AuthStore,
{
    let session = Router::new()
        .route("/session", get(handlers::session_status))
        .route_layer(from_fn_with_state(
            services.guard.clone(),
            optional_buyer::<R>,
        ));

    Router::new()
        .route("/register", post(handlers::register::<R>))
        .route("/login", post(handlers::login::<R>))
        .route("/logout", post(handlers::logout::<R>))
        .merge(session)
        .with_state(services)
}

/// Admin routes, nested at `/api/admin`
///
/// The admin cookie is scoped to this prefix.
pub fn admin_router<R>(services: AuthServices<R>) -> Router
where
    R: AuthStore,
{
    let admin_only = Router::new()
        .route(
            "/me",
            get(admin_handlers::me::<R>).patch(admin_handlers::update_me::<R>),
        )
        .route_layer(from_fn_with_state(
            services.guard.clone(),
            require_admin::<R>,
        ));

    let super_admin_only = Router::new()
        .route("/accounts", post(admin_handlers::create_admin::<R>))
        .route(
            "/accounts/{admin_id}/role",
            put(admin_handlers::change_role::<R>),
        )
        .route("/audit/denials", get(admin_handlers::list_denials::<R>))
        .route_layer(from_fn_with_state(
            services.guard.clone(),
            require_super_admin::<R>,
        ));

    Router::new()
        .route("/auth/login", post(admin_handlers::admin_login::<R>))
        .route("/auth/logout", post(admin_handlers::admin_logout::<R>))
        .merge(admin_only)
        .merge(super_admin_only)
        .with_state(services)
}
