//! HTTP Handlers

use auth::domain::value_object::{AdminPrincipal, BuyerPrincipal, Principal};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};

use crate::application::{CheckoutInput, CommerceServices};
use crate::domain::entity::SortOrder;
use crate::domain::value_object::{PaymentReference, ProfileId};
use crate::domain::{CommerceStore, PaymentGateway, ProfileStore};
use crate::error::{CommerceError, CommerceResult};
use crate::presentation::dto::{
    CheckoutRequest, CheckoutResponse, ConfirmRequest, FavoriteListResponse,
    FavoriteRemovedResponse, FavoriteResponse, FavoritesQuery, FulfilledOrderResponse,
    OrderListResponse,
};

// ============================================================================
// Checkout
// ============================================================================

/// POST /api/checkout (behind `optional_buyer`)
pub async fn open_checkout<S, P, G>(
    State(services): State<CommerceServices<S, P, G>>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<CheckoutRequest>,
) -> CommerceResult<Json<CheckoutResponse>>
where
    S: CommerceStore,
    P: ProfileStore + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    let buyer_email = req
        .buyer_email
        .filter(|e| !e.trim().is_empty())
        .or_else(|| principal.as_buyer().map(|b| b.email.as_str().to_string()))
        .ok_or_else(|| CommerceError::Validation("buyerEmail is required".into()))?;

    let input = CheckoutInput {
        buyer_id: principal.as_buyer().map(|b| b.buyer_id),
        buyer_email,
        buyer_name: req.buyer_name,
        profile_ids: req.profile_ids,
        claimed_total: req.total_amount,
    };

    let output = services.checkout.open_checkout(input).await?;
    Ok(Json(output.into()))
}

/// POST /api/checkout/confirm (behind `optional_buyer`)
///
/// Idempotent; repeated calls return the same order.
pub async fn confirm_checkout<S, P, G>(
    State(services): State<CommerceServices<S, P, G>>,
    Json(req): Json<ConfirmRequest>,
) -> CommerceResult<Json<FulfilledOrderResponse>>
where
    S: CommerceStore,
    P: ProfileStore + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    let reference = PaymentReference::new(req.payment_reference)?;
    let fulfilled = services.fulfillment.confirm_detached(reference).await?;
    Ok(Json(fulfilled.into()))
}

// ============================================================================
// Favorites
// ============================================================================

/// GET /api/favorites?order=asc|desc
pub async fn list_favorites<S, P, G>(
    State(services): State<CommerceServices<S, P, G>>,
    Extension(buyer): Extension<BuyerPrincipal>,
    Query(query): Query<FavoritesQuery>,
) -> CommerceResult<Json<FavoriteListResponse>>
where
    S: CommerceStore,
    P: ProfileStore + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    let order = SortOrder::from_query(query.order.as_deref());
    let entries = services.favorites.list(buyer.buyer_id, order).await?;
    Ok(Json(FavoriteListResponse {
        favorites: entries.into_iter().map(Into::into).collect(),
    }))
}

/// POST /api/favorites/{profile_id}
pub async fn add_favorite<S, P, G>(
    State(services): State<CommerceServices<S, P, G>>,
    Extension(buyer): Extension<BuyerPrincipal>,
    Path(profile_id): Path<ProfileId>,
) -> CommerceResult<(StatusCode, Json<FavoriteResponse>)>
where
    S: CommerceStore,
    P: ProfileStore + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    let favorite = services.favorites.add(buyer.buyer_id, profile_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(FavoriteResponse {
            favorite_id: favorite.favorite_id.into_uuid(),
            profile_id: favorite.profile_id,
            created_at: favorite.created_at,
        }),
    ))
}

/// DELETE /api/favorites/{profile_id}
pub async fn remove_favorite<S, P, G>(
    State(services): State<CommerceServices<S, P, G>>,
    Extension(buyer): Extension<BuyerPrincipal>,
    Path(profile_id): Path<ProfileId>,
) -> CommerceResult<Json<FavoriteRemovedResponse>>
where
    S: CommerceStore,
    P: ProfileStore + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    services.favorites.remove(buyer.buyer_id, profile_id).await?;
    Ok(Json(FavoriteRemovedResponse { removed: true }))
}

// ============================================================================
// Orders
// ============================================================================

/// GET /api/orders
pub async fn list_orders<S, P, G>(
    State(services): State<CommerceServices<S, P, G>>,
    Extension(buyer): Extension<BuyerPrincipal>,
) -> CommerceResult<Json<OrderListResponse>>
where
    S: CommerceStore,
    P: ProfileStore + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    let orders = services.orders.for_buyer(&buyer.buyer_id).await?;
    Ok(Json(OrderListResponse {
        orders: orders.into_iter().map(Into::into).collect(),
    }))
}

/// GET /api/admin/orders/{payment_reference}
pub async fn admin_get_order<S, P, G>(
    State(services): State<CommerceServices<S, P, G>>,
    Extension(admin): Extension<AdminPrincipal>,
    Path(payment_reference): Path<String>,
) -> CommerceResult<Json<FulfilledOrderResponse>>
where
    S: CommerceStore,
    P: ProfileStore + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    let reference = PaymentReference::new(payment_reference)?;
    let fulfilled = services.orders.by_reference(&reference).await?;

    tracing::info!(
        target: "audit",
        admin_id = %admin.admin_id,
        payment_reference = %reference,
        "Admin viewed order"
    );

    Ok(Json(fulfilled.into()))
}
