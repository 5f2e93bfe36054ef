use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::{db_types::OtpRecord, traits::OtpStore, traits::StoreError};

/// Process-local [`OtpStore`]. Codes do not survive a restart, so this is only suitable for tests and single-process
/// development setups.
#[derive(Debug, Clone, Default)]
pub struct MemoryOtpStore {
    codes: Arc<Mutex<HashMap<String, OtpRecord>>>,
}

impl MemoryOtpStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.codes.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.codes.lock().await.is_empty()
    }
}

impl OtpStore for MemoryOtpStore {
    async fn put(&self, key: &str, code: &str, expires_at: DateTime<Utc>) -> Result<(), StoreError> {
        let record = OtpRecord { key: key.to_string(), code: code.to_string(), expires_at, attempts: 0 };
        self.codes.lock().await.insert(key.to_string(), record);
        Ok(())
    }

    async fn take(&self, key: &str, now: DateTime<Utc>) -> Result<Option<OtpRecord>, StoreError> {
        let record = self.codes.lock().await.remove(key);
        Ok(record.filter(|r| !r.is_expired(now)))
    }

    async fn peek(&self, key: &str, now: DateTime<Utc>) -> Result<Option<OtpRecord>, StoreError> {
        let mut codes = self.codes.lock().await;
        match codes.get(key) {
            Some(r) if r.is_expired(now) => {
                codes.remove(key);
                Ok(None)
            },
            r => Ok(r.cloned()),
        }
    }

    async fn record_failed_attempt(&self, key: &str) -> Result<Option<i64>, StoreError> {
        let mut codes = self.codes.lock().await;
        Ok(codes.get_mut(key).map(|r| {
            r.attempts += 1;
            r.attempts
        }))
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut codes = self.codes.lock().await;
        let before = codes.len();
        codes.retain(|_, r| !r.is_expired(now));
        Ok((before - codes.len()) as u64)
    }
}
