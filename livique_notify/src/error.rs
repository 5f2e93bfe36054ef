use thiserror::Error;

/// Delivery failures. Order notification failures are logged by the dispatcher and never reach an HTTP caller. Only
/// one-time code delivery reports them.
#[derive(Debug, Clone, Error)]
pub enum NotificationError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("The relay rejected the request. Error {status}. {body}")]
    Rejected { status: u16, body: String },
    #[error("The call did not complete within {0}ms")]
    Timeout(u128),
    #[error("The push subscription has expired")]
    SubscriptionGone,
    #[error("Could not access push subscriptions: {0}")]
    Store(String),
}
