use chrono::{DateTime, Utc};
use log::{debug, trace, warn};
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewProduct, Product, ProductId},
    traits::StoreError,
};

pub async fn fetch_product(product_id: &ProductId, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let product =
        sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(product_id.as_str()).fetch_optional(conn).await?;
    Ok(product)
}

/// Creates or replaces the stock record for a product.
pub async fn upsert_product(
    product: NewProduct,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Product, StoreError> {
    if product.quantity < 0 {
        return Err(StoreError::ValidationError(crate::db_types::ValidationError::new(
            "Product quantity cannot be negative",
        )));
    }
    let product = sqlx::query_as(
        r#"
            INSERT INTO products (id, name, quantity, in_stock, updated_at) VALUES ($1, $2, $3, $3 > 0, $4)
            ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                quantity = excluded.quantity,
                in_stock = excluded.in_stock,
                updated_at = excluded.updated_at
            RETURNING *;
        "#,
    )
    .bind(product.id)
    .bind(product.name)
    .bind(product.quantity)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(product)
}

/// Takes up to `quantity` units out of stock in a single statement. The result is floored at zero and `in_stock` is
/// kept in line with the new quantity.
///
/// Returns `None` if the product does not exist.
pub async fn decrement_floored(
    product_id: &ProductId,
    quantity: i64,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Product>, sqlx::Error> {
    let product: Option<Product> = sqlx::query_as(
        r#"
            UPDATE products SET
                quantity = MAX(0, quantity - $1),
                in_stock = MAX(0, quantity - $1) > 0,
                updated_at = $2
            WHERE id = $3
            RETURNING *;
        "#,
    )
    .bind(quantity.max(0))
    .bind(now)
    .bind(product_id.as_str())
    .fetch_optional(conn)
    .await?;
    match &product {
        Some(p) => trace!("📦️ {} is now at {} units", p.id, p.quantity),
        None => warn!("📦️ Product {product_id} is not in the stock table. Skipping the adjustment."),
    }
    Ok(product)
}

/// Takes exactly `quantity` units out of stock, or nothing at all if there are not enough.
pub async fn decrement_if_enough(
    product_id: &ProductId,
    quantity: i64,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Product, StoreError> {
    let product: Option<Product> = sqlx::query_as(
        r#"
            UPDATE products SET
                quantity = quantity - $1,
                in_stock = quantity - $1 > 0,
                updated_at = $2
            WHERE id = $3 AND quantity >= $1
            RETURNING *;
        "#,
    )
    .bind(quantity)
    .bind(now)
    .bind(product_id.as_str())
    .fetch_optional(&mut *conn)
    .await?;
    match product {
        Some(p) => {
            debug!("📦️ Took {quantity} units of {} out of stock. {} left", p.id, p.quantity);
            Ok(p)
        },
        None => match fetch_product(product_id, conn).await? {
            Some(p) => Err(StoreError::InsufficientStock {
                product_id: p.id,
                available: p.quantity,
                requested: quantity,
            }),
            None => Err(StoreError::ProductNotFound(product_id.clone())),
        },
    }
}
