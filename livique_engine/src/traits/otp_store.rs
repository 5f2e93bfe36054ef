use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{db_types::OtpRecord, traits::StoreError};

/// A short-lived keyed store of one-time codes.
///
/// Implementations must never return a record whose expiry has passed. Expired records may be purged lazily.
pub trait OtpStore: Clone + Send + Sync + 'static {
    /// Stores `code` for `key`, replacing any code already issued for it.
    fn put(&self, key: &str, code: &str, expires_at: DateTime<Utc>) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Removes and returns the live record for `key`, if there is one.
    fn take(&self, key: &str, now: DateTime<Utc>) -> impl Future<Output = Result<Option<OtpRecord>, StoreError>> + Send;

    /// Returns the live record for `key` without consuming it.
    fn peek(&self, key: &str, now: DateTime<Utc>) -> impl Future<Output = Result<Option<OtpRecord>, StoreError>> + Send;

    /// Counts a wrong guess against the code for `key`. Returns the updated count, or `None` if there is no code.
    fn record_failed_attempt(&self, key: &str) -> impl Future<Output = Result<Option<i64>, StoreError>> + Send;

    /// Deletes every record that expired before `now`. Returns the number of records removed.
    fn purge_expired(&self, now: DateTime<Utc>) -> impl Future<Output = Result<u64, StoreError>> + Send;
}
