use std::{future::Future, sync::Arc};

use livique_engine::db_types::PushSubscription;
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client,
    StatusCode,
};
use serde::Serialize;
use serde_json::json;

use crate::{config::PushConfig, NotificationError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
    pub url: Option<String>,
}

/// Something that can deliver a [`PushMessage`] to one browser subscription.
///
/// An expired subscription must be reported as [`NotificationError::SubscriptionGone`] so that it can be pruned.
pub trait PushSender: Clone + Send + Sync + 'static {
    fn send(
        &self,
        subscription: &PushSubscription,
        message: &PushMessage,
    ) -> impl Future<Output = Result<(), NotificationError>> + Send;
}

/// Sends web-push messages through an HTTP relay that holds the VAPID keys.
#[derive(Clone)]
pub struct PushClient {
    config: PushConfig,
    client: Arc<Client>,
}

impl PushClient {
    pub fn new(config: PushConfig) -> Result<Self, NotificationError> {
        let mut headers = HeaderMap::with_capacity(1);
        if !config.api_key.is_empty() {
            let val = HeaderValue::from_str(&format!("Bearer {}", config.api_key.reveal()))
                .map_err(|e| NotificationError::Initialization(e.to_string()))?;
            headers.insert(AUTHORIZATION, val);
        }
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| NotificationError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }
}

impl PushSender for PushClient {
    async fn send(&self, subscription: &PushSubscription, message: &PushMessage) -> Result<(), NotificationError> {
        let Some(url) = self.config.api_url.as_deref() else {
            return Err(NotificationError::NotConfigured("Push"));
        };
        let body = json!({
            "subscription": {
                "endpoint": subscription.endpoint,
                "keys": { "p256dh": subscription.p256dh, "auth": subscription.auth },
            },
            "payload": message,
        });
        let response =
            self.client.post(url).json(&body).send().await.map_err(|e| NotificationError::Transport(e.to_string()))?;
        match response.status() {
            s if s.is_success() => {
                trace!("🔔️ Push delivered to subscription #{}", subscription.id);
                Ok(())
            },
            StatusCode::NOT_FOUND | StatusCode::GONE => Err(NotificationError::SubscriptionGone),
            s => {
                let body = response.text().await.unwrap_or_default();
                Err(NotificationError::Rejected { status: s.as_u16(), body })
            },
        }
    }
}
