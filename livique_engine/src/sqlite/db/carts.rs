use sqlx::SqliteConnection;

use crate::db_types::{CartItem, UserId};

pub async fn fetch_cart(user_id: &UserId, conn: &mut SqliteConnection) -> Result<Vec<CartItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT product_id, quantity FROM cart_items WHERE user_id = $1 ORDER BY position")
        .bind(user_id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(items)
}

/// Replaces the cart contents. Callers should run this inside a transaction.
pub async fn replace_cart(user_id: &UserId, items: &[CartItem], conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    clear_cart(user_id, conn).await?;
    for (position, item) in items.iter().enumerate() {
        sqlx::query(
            r#"
                INSERT INTO cart_items (user_id, product_id, quantity, position) VALUES ($1, $2, $3, $4)
                ON CONFLICT (user_id, product_id) DO UPDATE SET quantity = cart_items.quantity + excluded.quantity
            "#,
        )
        .bind(user_id.as_str())
        .bind(item.product_id.as_str())
        .bind(item.quantity)
        .bind(position as i64)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

pub async fn clear_cart(user_id: &UserId, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1").bind(user_id.as_str()).execute(conn).await?;
    Ok(result.rows_affected())
}
