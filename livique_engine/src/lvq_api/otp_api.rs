//! One-time codes for email step-up verification.
//!
//! Codes are six digits, single use, and expire after a configurable time-to-live. A new request for the same key
//! replaces the previous code. Expired codes are purged lazily whenever a new code is issued. A code is burnt after
//! [`DEFAULT_OTP_MAX_ATTEMPTS`] wrong guesses.
use chrono::{DateTime, Duration, Utc};
use log::*;
use rand::Rng;

use crate::{lvq_api::errors::OtpError, traits::OtpStore};

pub const DEFAULT_OTP_TTL_SECS: i64 = 600;
pub const DEFAULT_OTP_MAX_ATTEMPTS: i64 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedOtp {
    pub key: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

pub struct OtpApi<S> {
    store: S,
    ttl: Duration,
    max_attempts: i64,
}

impl<S> OtpApi<S>
where S: OtpStore
{
    pub fn new(store: S, ttl: Duration) -> Self {
        Self { store, ttl, max_attempts: DEFAULT_OTP_MAX_ATTEMPTS }
    }

    pub fn with_max_attempts(mut self, max_attempts: i64) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issues a fresh code for `key` (an email address or phone number).
    pub async fn issue(&self, key: &str) -> Result<IssuedOtp, OtpError> {
        self.issue_at(key, Utc::now()).await
    }

    pub async fn issue_at(&self, key: &str, now: DateTime<Utc>) -> Result<IssuedOtp, OtpError> {
        let key = normalize_key(key)?;
        match self.store.purge_expired(now).await {
            Ok(0) => {},
            Ok(n) => trace!("🔑️ Purged {n} expired codes"),
            Err(e) => warn!("🔑️ Could not purge expired codes. {e}"),
        }
        let code = format!("{:06}", rand::thread_rng().gen_range(0..1_000_000));
        let expires_at = now + self.ttl;
        self.store.put(&key, &code, expires_at).await?;
        debug!("🔑️ Issued a code for {key}, valid until {expires_at}");
        Ok(IssuedOtp { key, code, expires_at })
    }

    /// Checks `code` against the live code for `key`. A matching code is consumed. A wrong guess leaves it in place
    /// until the attempt limit is reached, at which point the code is discarded.
    pub async fn verify(&self, key: &str, code: &str) -> Result<(), OtpError> {
        self.verify_at(key, code, Utc::now()).await
    }

    pub async fn verify_at(&self, key: &str, code: &str, now: DateTime<Utc>) -> Result<(), OtpError> {
        let key = normalize_key(key)?;
        let Some(record) = self.store.peek(&key, now).await? else {
            debug!("🔑️ No live code for {key}");
            return Err(OtpError::InvalidCode);
        };
        if record.code != code.trim() {
            let attempts = self.store.record_failed_attempt(&key).await?.unwrap_or(self.max_attempts);
            debug!("🔑️ Wrong code supplied for {key} ({attempts}/{})", self.max_attempts);
            if attempts >= self.max_attempts {
                self.store.take(&key, now).await?;
                warn!("🔑️ Too many wrong guesses for {key}. The code has been discarded");
            }
            return Err(OtpError::InvalidCode);
        }
        // Another request may have consumed it in between
        match self.store.take(&key, now).await? {
            Some(r) if r.code == record.code => {
                info!("🔑️ Code for {key} verified");
                Ok(())
            },
            _ => Err(OtpError::InvalidCode),
        }
    }
}

fn normalize_key(key: &str) -> Result<String, OtpError> {
    let key = key.trim().to_lowercase();
    if key.is_empty() {
        return Err(OtpError::MissingKey);
    }
    Ok(key)
}
