use std::time::Duration;

use livique_common::{
    helpers::{env_non_empty, env_parse},
    Secret,
};
use log::*;

pub const DEFAULT_NOTIFY_TIMEOUT_MS: u64 = 5_000;

/// Settings for the outbound mail relay. Mail is disabled when no relay URL is configured.
#[derive(Debug, Clone, Default)]
pub struct MailConfig {
    pub api_url: Option<String>,
    pub api_key: Secret<String>,
    pub from: String,
    /// The storefront operator's mailbox. Order and reconciliation alerts go here.
    pub operator_email: Option<String>,
}

impl MailConfig {
    pub fn from_env_or_default() -> Self {
        let api_url = env_non_empty("LVQ_MAIL_API_URL");
        if api_url.is_none() {
            warn!("🪛️ LVQ_MAIL_API_URL is not set. Emails will not be sent.");
        }
        let api_key = Secret::new(env_non_empty("LVQ_MAIL_API_KEY").unwrap_or_default());
        let from = env_non_empty("LVQ_MAIL_FROM").unwrap_or_else(|| {
            info!("🪛️ LVQ_MAIL_FROM is not set. Using orders@livique.in");
            "orders@livique.in".to_string()
        });
        let operator_email = env_non_empty("LVQ_OPERATOR_EMAIL");
        if operator_email.is_none() {
            warn!("🪛️ LVQ_OPERATOR_EMAIL is not set. Operator alerts will only be logged.");
        }
        Self { api_url, api_key, from, operator_email }
    }

    pub fn is_enabled(&self) -> bool {
        self.api_url.is_some()
    }
}

/// Settings for the web-push relay. Push is disabled when no relay URL is configured.
#[derive(Debug, Clone, Default)]
pub struct PushConfig {
    pub api_url: Option<String>,
    pub api_key: Secret<String>,
}

impl PushConfig {
    pub fn from_env_or_default() -> Self {
        let api_url = env_non_empty("LVQ_PUSH_API_URL");
        if api_url.is_none() {
            warn!("🪛️ LVQ_PUSH_API_URL is not set. Admin push notifications are disabled.");
        }
        let api_key = Secret::new(env_non_empty("LVQ_PUSH_API_KEY").unwrap_or_default());
        Self { api_url, api_key }
    }

    pub fn is_enabled(&self) -> bool {
        self.api_url.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct NotifyConfig {
    pub mail: MailConfig,
    pub push: PushConfig,
    /// Upper bound on every individual outbound mail or push call.
    pub timeout: Duration,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            mail: MailConfig::default(),
            push: PushConfig::default(),
            timeout: Duration::from_millis(DEFAULT_NOTIFY_TIMEOUT_MS),
        }
    }
}

impl NotifyConfig {
    pub fn from_env_or_default() -> Self {
        let timeout_ms = match env_parse::<u64>("LVQ_NOTIFY_TIMEOUT_MS") {
            Some(Ok(ms)) if ms > 0 => ms,
            Some(_) => {
                warn!("🪛️ LVQ_NOTIFY_TIMEOUT_MS is invalid. Using {DEFAULT_NOTIFY_TIMEOUT_MS}ms.");
                DEFAULT_NOTIFY_TIMEOUT_MS
            },
            None => {
                info!("🪛️ LVQ_NOTIFY_TIMEOUT_MS is not set. Using {DEFAULT_NOTIFY_TIMEOUT_MS}ms.");
                DEFAULT_NOTIFY_TIMEOUT_MS
            },
        };
        Self {
            mail: MailConfig::from_env_or_default(),
            push: PushConfig::from_env_or_default(),
            timeout: Duration::from_millis(timeout_ms),
        }
    }
}
