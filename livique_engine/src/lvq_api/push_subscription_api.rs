use log::*;

use crate::{
    db_types::{NewPushSubscription, PushSubscription},
    lvq_api::errors::OrderFlowError,
    traits::PushSubscriptionManagement,
};

pub struct PushSubscriptionApi<B> {
    db: B,
}

impl<B> PushSubscriptionApi<B>
where B: PushSubscriptionManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn subscribe(&self, subscription: NewPushSubscription) -> Result<PushSubscription, OrderFlowError> {
        if !subscription.endpoint.starts_with("https://") {
            return Err(OrderFlowError::ValidationError("Push endpoints must use https".into()));
        }
        if subscription.p256dh.trim().is_empty() || subscription.auth.trim().is_empty() {
            return Err(OrderFlowError::ValidationError("Push subscription keys are required".into()));
        }
        let sub = self.db.add_subscription(subscription).await?;
        info!("🔔️ Push subscription #{} registered", sub.id);
        Ok(sub)
    }

    pub async fn subscriptions(&self) -> Result<Vec<PushSubscription>, OrderFlowError> {
        let subs = self.db.fetch_subscriptions().await?;
        Ok(subs)
    }
}
