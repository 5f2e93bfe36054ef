use serde::{Deserialize, Serialize};

use crate::db_types::{Order, UserId};

/// Emitted once an order has been durably stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreatedEvent {
    pub order: Order,
}

impl OrderCreatedEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

/// Emitted when an administrator attaches a shipment tracking id to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingAssignedEvent {
    pub order: Order,
    pub tracking_id: String,
}

impl TrackingAssignedEvent {
    pub fn new(order: Order) -> Self {
        let tracking_id = order.tracking_id.clone().unwrap_or_default();
        Self { order, tracking_id }
    }
}

/// The gateway has captured a payment, but we could not record the order. A human has to look at this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationRequiredEvent {
    pub gateway_order_id: String,
    pub gateway_payment_id: String,
    pub user_id: UserId,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    OrderCreated(OrderCreatedEvent),
    TrackingAssigned(TrackingAssignedEvent),
    ReconciliationRequired(ReconciliationRequiredEvent),
}
