use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::db_types::OtpRecord;

pub async fn upsert_code(
    key: &str,
    code: &str,
    expires_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
            INSERT INTO otp_codes (otp_key, code, expires_at, attempts) VALUES ($1, $2, $3, 0)
            ON CONFLICT (otp_key) DO UPDATE SET code = excluded.code, expires_at = excluded.expires_at, attempts = 0
        "#,
    )
    .bind(key)
    .bind(code)
    .bind(expires_at)
    .execute(conn)
    .await?;
    Ok(())
}

/// Fetches the record for `key` regardless of expiry.
pub async fn fetch_code(key: &str, conn: &mut SqliteConnection) -> Result<Option<OtpRecord>, sqlx::Error> {
    let record = sqlx::query_as("SELECT otp_key, code, expires_at, attempts FROM otp_codes WHERE otp_key = $1")
        .bind(key)
        .fetch_optional(conn)
        .await?;
    Ok(record)
}

/// Bumps the wrong-guess counter for `key` and returns the new count, or `None` if there is no such code.
pub async fn increment_attempts(key: &str, conn: &mut SqliteConnection) -> Result<Option<i64>, sqlx::Error> {
    let attempts: Option<i64> =
        sqlx::query_scalar("UPDATE otp_codes SET attempts = attempts + 1 WHERE otp_key = $1 RETURNING attempts")
            .bind(key)
            .fetch_optional(conn)
            .await?;
    Ok(attempts)
}

pub async fn delete_code(key: &str, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM otp_codes WHERE otp_key = $1").bind(key).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_expired(now: DateTime<Utc>, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM otp_codes WHERE expires_at <= $1").bind(now).execute(conn).await?;
    Ok(result.rows_affected())
}
