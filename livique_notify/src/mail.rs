use std::{future::Future, sync::Arc};

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client,
};
use serde::Serialize;

use crate::{config::MailConfig, NotificationError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Something that can deliver an [`Email`].
///
/// The future is `Send` so that deliveries can run on spawned notification jobs.
pub trait Mailer: Clone + Send + Sync + 'static {
    fn send(&self, email: Email) -> impl Future<Output = Result<(), NotificationError>> + Send;
}

/// Delivers mail through an HTTP relay that accepts `{from, to, subject, html, text}` JSON with a bearer key.
#[derive(Clone)]
pub struct MailClient {
    config: MailConfig,
    client: Arc<Client>,
}

impl MailClient {
    pub fn new(config: MailConfig) -> Result<Self, NotificationError> {
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

    pub fn config(&self) -> &MailConfig {
        &self.config
    }
}

#[derive(Serialize)]
struct RelayMessage<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

impl Mailer for MailClient {
    async fn send(&self, email: Email) -> Result<(), NotificationError> {
        let Some(url) = self.config.api_url.as_deref() else {
            return Err(NotificationError::NotConfigured("Mail"));
        };
        let body = RelayMessage {
            from: &self.config.from,
            to: [&email.to],
            subject: &email.subject,
            html: &email.html,
            text: &email.text,
        };
        trace!("✉️ Sending \"{}\" to {}", email.subject, email.to);
        let response =
            self.client.post(url).json(&body).send().await.map_err(|e| NotificationError::Transport(e.to_string()))?;
        if response.status().is_success() {
            debug!("✉️ \"{}\" accepted for delivery to {}", email.subject, email.to);
            Ok(())
        } else {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            Err(NotificationError::Rejected { status, body })
        }
    }
}
