use std::future::Future;

use crate::{
    db_types::{NewPushSubscription, PushSubscription},
    traits::StoreError,
};

/// Admin browser push registrations.
///
/// The futures are `Send` because subscriptions are read and pruned from spawned notification jobs.
pub trait PushSubscriptionManagement: Clone + Send + Sync + 'static {
    /// Registers the subscription. Registering an existing endpoint refreshes its keys.
    fn add_subscription(
        &self,
        subscription: NewPushSubscription,
    ) -> impl Future<Output = Result<PushSubscription, StoreError>> + Send;

    fn fetch_subscriptions(&self) -> impl Future<Output = Result<Vec<PushSubscription>, StoreError>> + Send;

    /// Removes an expired registration. Returns true if a row was deleted.
    fn remove_subscription(&self, endpoint: &str) -> impl Future<Output = Result<bool, StoreError>> + Send;
}
