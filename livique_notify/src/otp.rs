use std::time::Duration;

use chrono::{DateTime, Utc};
use log::*;

use crate::{dispatcher::with_timeout, mail::Mailer, templates, NotificationError};

/// Emails one-time codes. Unlike order notifications, the caller needs to know whether delivery worked, so errors are
/// returned rather than swallowed.
#[derive(Clone)]
pub struct OtpMailer<M> {
    mailer: M,
    timeout: Duration,
}

impl<M: Mailer> OtpMailer<M> {
    pub fn new(mailer: M, timeout: Duration) -> Self {
        Self { mailer, timeout }
    }

    pub async fn send_code(&self, to: &str, code: &str, expires_at: DateTime<Utc>) -> Result<(), NotificationError> {
        let result = with_timeout(self.timeout, self.mailer.send(templates::otp_email(to, code, expires_at))).await;
        match &result {
            Ok(()) => debug!("🔑️ Verification code sent to {to}"),
            Err(e) => warn!("🔑️ Could not send a verification code to {to}. {e}"),
        }
        result
    }
}
