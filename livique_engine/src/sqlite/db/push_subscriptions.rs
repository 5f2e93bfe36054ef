use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::db_types::{NewPushSubscription, PushSubscription};

pub async fn upsert_subscription(
    subscription: NewPushSubscription,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<PushSubscription, sqlx::Error> {
    let sub = sqlx::query_as(
        r#"
            INSERT INTO push_subscriptions (endpoint, p256dh, auth, created_at) VALUES ($1, $2, $3, $4)
            ON CONFLICT (endpoint) DO UPDATE SET p256dh = excluded.p256dh, auth = excluded.auth
            RETURNING *;
        "#,
    )
    .bind(subscription.endpoint)
    .bind(subscription.p256dh)
    .bind(subscription.auth)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(sub)
}

pub async fn fetch_subscriptions(conn: &mut SqliteConnection) -> Result<Vec<PushSubscription>, sqlx::Error> {
    let subs = sqlx::query_as("SELECT * FROM push_subscriptions ORDER BY id").fetch_all(conn).await?;
    Ok(subs)
}

pub async fn delete_subscription(endpoint: &str, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM push_subscriptions WHERE endpoint = $1").bind(endpoint).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}
