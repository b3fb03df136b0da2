//! PostgreSQL Repository Implementations

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use kernel::id::{BuyerId, FavoriteId, OrderId, OrderItemId};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::domain::entity::{
    ContactMethod, ContactSnapshot, Favorite, FulfilledOrder, Order, OrderItem, OrderStatus,
    Profile, ProfileSummary, SortOrder,
};
use crate::domain::port::ProfileStore;
use crate::domain::repository::{FavoriteRepository, InsertOutcome, OrderRepository};
use crate::domain::value_object::{Currency, PaymentReference, ProfileId};
use crate::error::{CommerceError, CommerceResult};

/// Orders, order items and favorites
#[derive(Clone)]
pub struct PgCommerceRepository {
    pool: PgPool,
}

impl PgCommerceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn items_for(&self, order_ids: &[Uuid]) -> CommerceResult<HashMap<Uuid, Vec<OrderItem>>> {
        let rows = sqlx::query_as::<_, OrderItemRow>(
            r#"
            SELECT
                item_id,
                order_id,
                profile_id,
                price_at_purchase,
                contact_snapshot
            FROM order_items
            WHERE order_id = ANY($1)
            ORDER BY order_id, position
            "#,
        )
        .bind(order_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
        for row in rows {
            grouped.entry(row.order_id).or_default().push(row.into_item());
        }
        Ok(grouped)
    }
}

// ============================================================================
// Order Repository Implementation
// ============================================================================

const ORDER_COLUMNS: &str = r#"
    order_id,
    payment_reference,
    buyer_id,
    buyer_email,
    buyer_name,
    total_amount,
    currency,
    status,
    created_at
"#;

impl OrderRepository for PgCommerceRepository {
    async fn find_order_by_reference(
        &self,
        reference: &PaymentReference,
    ) -> CommerceResult<Option<FulfilledOrder>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE payment_reference = $1"
        ))
        .bind(reference.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let order = row.into_order()?;
        let items = self
            .items_for(&[order.order_id.into_uuid()])
            .await?
            .remove(order.order_id.as_uuid())
            .unwrap_or_default();

        Ok(Some(FulfilledOrder { order, items }))
    }

    async fn insert_fulfilled_order(
        &self,
        fulfilled: &FulfilledOrder,
    ) -> CommerceResult<InsertOutcome> {
        let order = &fulfilled.order;
        let mut tx = self.pool.begin().await?;

        // Concurrent confirmations for one reference queue on the unique
        // index here; only one of them inserts.
        let inserted = sqlx::query(
            r#"
            INSERT INTO orders (
                order_id,
                payment_reference,
                buyer_id,
                buyer_email,
                buyer_name,
                total_amount,
                currency,
                status,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (payment_reference) DO NOTHING
            "#,
        )
        .bind(order.order_id.as_uuid())
        .bind(order.payment_reference.as_str())
        .bind(order.buyer_id.map(|id| id.into_uuid()))
        .bind(&order.buyer_email)
        .bind(&order.buyer_name)
        .bind(order.total_amount)
        .bind(order.currency.as_str())
        .bind(order.status.code())
        .bind(order.created_at)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if inserted == 0 {
            tx.rollback().await?;
            return Ok(InsertOutcome::AlreadyExists);
        }

        for (position, item) in fulfilled.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_items (
                    item_id,
                    order_id,
                    position,
                    profile_id,
                    price_at_purchase,
                    contact_snapshot
                ) VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(item.item_id.as_uuid())
            .bind(item.order_id.as_uuid())
            .bind(position as i32)
            .bind(item.profile_id.get())
            .bind(item.price_at_purchase)
            .bind(Json(&item.contact_snapshot))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(InsertOutcome::Inserted)
    }

    async fn list_orders_for_buyer(
        &self,
        buyer_id: &BuyerId,
        limit: i64,
    ) -> CommerceResult<Vec<FulfilledOrder>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE buyer_id = $1 \
             ORDER BY created_at DESC LIMIT $2"
        ))
        .bind(buyer_id.as_uuid())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let orders = rows
            .into_iter()
            .map(OrderRow::into_order)
            .collect::<CommerceResult<Vec<_>>>()?;
        let ids: Vec<Uuid> = orders.iter().map(|o| o.order_id.into_uuid()).collect();
        let mut items = self.items_for(&ids).await?;

        Ok(orders
            .into_iter()
            .map(|order| {
                let items = items.remove(order.order_id.as_uuid()).unwrap_or_default();
                FulfilledOrder { order, items }
            })
            .collect())
    }
}

// ============================================================================
// Favorite Repository Implementation
// ============================================================================

impl FavoriteRepository for PgCommerceRepository {
    async fn upsert_favorite(&self, favorite: &Favorite) -> CommerceResult<Favorite> {
        sqlx::query(
            r#"
            INSERT INTO favorites (favorite_id, buyer_id, profile_id, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (buyer_id, profile_id) DO NOTHING
            "#,
        )
        .bind(favorite.favorite_id.as_uuid())
        .bind(favorite.buyer_id.as_uuid())
        .bind(favorite.profile_id.get())
        .bind(favorite.created_at)
        .execute(&self.pool)
        .await?;

        let row = sqlx::query_as::<_, FavoriteRow>(
            r#"
            SELECT favorite_id, buyer_id, profile_id, created_at
            FROM favorites
            WHERE buyer_id = $1 AND profile_id = $2
            "#,
        )
        .bind(favorite.buyer_id.as_uuid())
        .bind(favorite.profile_id.get())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_favorite())
    }

    async fn delete_favorite(
        &self,
        buyer_id: &BuyerId,
        profile_id: ProfileId,
    ) -> CommerceResult<bool> {
        let deleted = sqlx::query("DELETE FROM favorites WHERE buyer_id = $1 AND profile_id = $2")
            .bind(buyer_id.as_uuid())
            .bind(profile_id.get())
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(deleted > 0)
    }

    async fn list_favorites(
        &self,
        buyer_id: &BuyerId,
        order: SortOrder,
    ) -> CommerceResult<Vec<Favorite>> {
        let direction = match order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };
        let rows = sqlx::query_as::<_, FavoriteRow>(&format!(
            "SELECT favorite_id, buyer_id, profile_id, created_at FROM favorites \
             WHERE buyer_id = $1 ORDER BY created_at {direction}, favorite_id {direction}"
        ))
        .bind(buyer_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(FavoriteRow::into_favorite).collect())
    }
}

// ============================================================================
// Profile Store over the catalog tables
// ============================================================================

#[derive(Clone)]
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl ProfileStore for PgProfileStore {
    async fn get_profile(&self, id: ProfileId) -> CommerceResult<Option<Profile>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            "SELECT id, display_name, price, is_approved FROM profiles WHERE id = $1",
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let contact_methods = sqlx::query_as::<_, ContactMethodRow>(
            r#"
            SELECT kind, value
            FROM profile_contact_methods
            WHERE profile_id = $1
            ORDER BY position
            "#,
        )
        .bind(id.get())
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|r| ContactMethod {
            kind: r.kind,
            value: r.value,
        })
        .collect();

        Ok(Some(Profile {
            id: ProfileId::new(row.id),
            display_name: row.display_name,
            price: row.price,
            is_approved: row.is_approved,
            contact_methods,
        }))
    }

    async fn get_profile_summaries(
        &self,
        ids: &[ProfileId],
    ) -> CommerceResult<Vec<ProfileSummary>> {
        let ids: Vec<i64> = ids.iter().map(ProfileId::get).collect();
        let rows = sqlx::query_as::<_, ProfileRow>(
            "SELECT id, display_name, price, is_approved FROM profiles WHERE id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| ProfileSummary {
                id: ProfileId::new(r.id),
                display_name: r.display_name,
                price: r.price,
                is_approved: r.is_approved,
            })
            .collect())
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct OrderRow {
    order_id: Uuid,
    payment_reference: String,
    buyer_id: Option<Uuid>,
    buyer_email: String,
    buyer_name: Option<String>,
    total_amount: i64,
    currency: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self) -> CommerceResult<Order> {
        let status = OrderStatus::from_code(&self.status)
            .ok_or_else(|| CommerceError::Internal(format!("Invalid order status: {}", self.status)))?;

        Ok(Order {
            order_id: OrderId::from_uuid(self.order_id),
            payment_reference: PaymentReference::from_db(self.payment_reference),
            buyer_id: self.buyer_id.map(BuyerId::from_uuid),
            buyer_email: self.buyer_email,
            buyer_name: self.buyer_name,
            total_amount: self.total_amount,
            currency: Currency::from_db(self.currency),
            status,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    item_id: Uuid,
    order_id: Uuid,
    profile_id: i64,
    price_at_purchase: i64,
    contact_snapshot: Json<ContactSnapshot>,
}

impl OrderItemRow {
    fn into_item(self) -> OrderItem {
        OrderItem {
            item_id: OrderItemId::from_uuid(self.item_id),
            order_id: OrderId::from_uuid(self.order_id),
            profile_id: ProfileId::new(self.profile_id),
            price_at_purchase: self.price_at_purchase,
            contact_snapshot: self.contact_snapshot.0,
        }
    }
}

#[derive(sqlx::FromRow)]
struct FavoriteRow {
    favorite_id: Uuid,
    buyer_id: Uuid,
    profile_id: i64,
    created_at: DateTime<Utc>,
}

impl FavoriteRow {
    fn into_favorite(self) -> Favorite {
        Favorite {
            favorite_id: FavoriteId::from_uuid(self.favorite_id),
            buyer_id: BuyerId::from_uuid(self.buyer_id),
            profile_id: ProfileId::new(self.profile_id),
            created_at: self.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProfileRow {
    id: i64,
    display_name: String,
    price: i64,
    is_approved: bool,
}

#[derive(sqlx::FromRow)]
struct ContactMethodRow {
    kind: String,
    value: String,
}
