use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use livique_engine::{
    db_types::{NewOrder, Order, OrderId, UserId},
    traits::{CheckoutEffects, OrderManagement, StoreError},
};
use livique_notify::{Email, Mailer, NotificationError};
use mockall::mock;

mock! {
    pub OrderManager {}
    impl Clone for OrderManager {
        fn clone(&self) -> Self;
    }
    impl OrderManagement for OrderManager {
        async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError>;
        async fn process_new_order(&self, order: NewOrder, effects: CheckoutEffects) -> Result<Order, StoreError>;
        async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, StoreError>;
        async fn fetch_orders_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, StoreError>;
        async fn fetch_all_orders(&self) -> Result<Vec<Order>, StoreError>;
        async fn set_tracking(&self, order_id: &OrderId, tracking_id: &str, at: DateTime<Utc>) -> Result<Order, StoreError>;
    }
}

/// Keeps every email it is handed. Set `fail` to simulate a relay outage.
#[derive(Clone, Default)]
pub struct CapturingMailer {
    pub sent: Arc<Mutex<Vec<Email>>>,
    pub fail: bool,
}

impl CapturingMailer {
    pub fn failing() -> Self {
        Self { fail: true, ..Default::default() }
    }

    pub fn sent(&self) -> Vec<Email> {
        self.sent.lock().expect("poisoned").clone()
    }
}

impl Mailer for CapturingMailer {
    async fn send(&self, email: Email) -> Result<(), NotificationError> {
        if self.fail {
            return Err(NotificationError::Rejected { status: 503, body: "relay is down".into() });
        }
        self.sent.lock().expect("poisoned").push(email);
        Ok(())
    }
}
