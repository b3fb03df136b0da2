//! Commerce Routers

use auth::AuthStore;
use auth::application::AuthGuard;
use auth::middleware::{optional_buyer, require_admin, require_buyer};
use axum::middleware::from_fn_with_state;
use axum::{
    Router,
    routing::{get, post},
};

use crate::application::CommerceServices;
use crate::domain::{CommerceStore, PaymentGateway, ProfileStore};
use crate::presentation::handlers;

/// Buyer-facing routes, nested at `/api`
///
/// Checkout accepts anonymous buyers; favorites and order history need a
/// buyer session. Admin tokens are refused on all of them.
pub fn commerce_router<S, P, G, R>(services: CommerceServices<S, P, G>, guard: AuthGuard<R>) -> Router
where
    S: CommerceStore,
    P: ProfileStore + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
    R: AuthStore,
{
    let checkout = Router::new()
        .route("/checkout", post(handlers::open_checkout::<S, P, G>))
        .route("/checkout/confirm", post(handlers::confirm_checkout::<S, P, G>))
        .route_layer(from_fn_with_state(guard.clone(), optional_buyer::<R>));

    let buyer_only = Router::new()
        .route("/favorites", get(handlers::list_favorites::<S, P, G>))
        .route(
            "/favorites/{profile_id}",
            post(handlers::add_favorite::<S, P, G>).delete(handlers::remove_favorite::<S, P, G>),
        )
        .route("/orders", get(handlers::list_orders::<S, P, G>))
        .route_layer(from_fn_with_state(guard, require_buyer::<R>));

    Router::new()
        .merge(checkout)
        .merge(buyer_only)
        .with_state(services)
}

/// Admin support routes, merged into the `/api/admin` router
pub fn admin_orders_router<S, P, G, R>(
    services: CommerceServices<S, P, G>,
    guard: AuthGuard<R>,
) -> Router
where
    S: CommerceStore,
    P: ProfileStore + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
    R: AuthStore,
{
    Router::new()
        .route(
            "/orders/{payment_reference}",
            get(handlers::admin_get_order::<S, P, G>),
        )
        .route_layer(from_fn_with_state(guard, require_admin::<R>))
        .with_state(services)
}
