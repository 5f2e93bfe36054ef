use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewOrder, Order, OrderId, UserId, ORDER_STATUS_SHIPPED},
    traits::StoreError,
};

/// Inserts a new order using the given connection. This is not atomic on its own; open a transaction and pass
/// `&mut tx` if the insert must commit together with other writes.
///
/// The order is validated first, so a bad draft never reaches the database.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, StoreError> {
    order.validate()?;
    if order_exists(&order.order_id, conn).await? {
        return Err(StoreError::OrderAlreadyExists(order.order_id));
    }
    let items = serde_json::to_string(&order.items).map_err(|e| StoreError::DatabaseError(e.to_string()))?;
    let address = serde_json::to_string(&order.address).map_err(|e| StoreError::DatabaseError(e.to_string()))?;
    let (gateway_order_id, gateway_payment_id, gateway_signature) = match order.gateway {
        Some(g) => (Some(g.gateway_order_id), Some(g.gateway_payment_id), Some(g.gateway_signature)),
        None => (None, None, None),
    };
    let order: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_id,
                user_id,
                items,
                address,
                contact_name,
                contact_email,
                payment_method,
                payment_status,
                gateway_order_id,
                gateway_payment_id,
                gateway_signature,
                subtotal,
                delivery_charges,
                total,
                status,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $16)
            RETURNING *;
        "#,
    )
    .bind(order.order_id)
    .bind(order.user_id)
    .bind(items)
    .bind(address)
    .bind(order.contact.name)
    .bind(order.contact.email)
    .bind(order.payment_method.to_string())
    .bind(order.payment_status.to_string())
    .bind(gateway_order_id)
    .bind(gateway_payment_id)
    .bind(gateway_signature)
    .bind(order.subtotal)
    .bind(order.delivery_charges)
    .bind(order.total)
    .bind(order.status)
    .bind(order.created_at)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Order {} inserted with id {}", order.order_id, order.id);
    Ok(order)
}

pub async fn order_exists(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE order_id = $1").bind(order_id.as_str()).fetch_one(conn).await?;
    Ok(count > 0)
}

/// Returns the order matching `order_id`, if any.
pub async fn fetch_order_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE order_id = $1").bind(order_id.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

/// Orders placed by the user, newest first.
pub async fn fetch_orders_for_user(user_id: &UserId, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as("SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC")
        .bind(user_id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

pub async fn fetch_all_orders(conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as("SELECT * FROM orders ORDER BY created_at DESC, id DESC").fetch_all(conn).await?;
    Ok(orders)
}

/// Sets the tracking id and marks the order as shipped. The tracking timestamp only ever moves forward.
///
/// Returns `None` if the order does not exist.
pub async fn set_tracking(
    order_id: &OrderId,
    tracking_id: &str,
    at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let Some(existing) = fetch_order_by_order_id(order_id, conn).await? else {
        return Ok(None);
    };
    let at = match existing.tracking_updated_at {
        Some(prev) if prev > at => prev,
        _ => at,
    };
    let updated_at = existing.updated_at.max(at);
    trace!("🗃️ Setting tracking id for {order_id} to {tracking_id}");
    let order = sqlx::query_as(
        r#"
            UPDATE orders SET
                tracking_id = $1,
                tracking_updated_at = $2,
                status = $3,
                updated_at = $4
            WHERE order_id = $5
            RETURNING *;
        "#,
    )
    .bind(tracking_id)
    .bind(at)
    .bind(ORDER_STATUS_SHIPPED)
    .bind(updated_at)
    .bind(order_id.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(order)
}
