use std::{future::Future, pin::Pin, sync::Arc};

use log::*;

use crate::events::{
    EventHandler,
    EventProducer,
    Handler,
    OrderCreatedEvent,
    ReconciliationRequiredEvent,
    TrackingAssignedEvent,
};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_created_producer: Vec<EventProducer<OrderCreatedEvent>>,
    pub tracking_assigned_producer: Vec<EventProducer<TrackingAssignedEvent>>,
    pub reconciliation_producer: Vec<EventProducer<ReconciliationRequiredEvent>>,
}

impl EventProducers {
    pub fn publish_order_created(&self, event: OrderCreatedEvent) {
        for producer in &self.order_created_producer {
            trace!("📬️ Publishing order created event for {}", event.order.order_id);
            producer.publish_event(event.clone());
        }
    }

    pub fn publish_tracking_assigned(&self, event: TrackingAssignedEvent) {
        for producer in &self.tracking_assigned_producer {
            trace!("📬️ Publishing tracking event for {}", event.order.order_id);
            producer.publish_event(event.clone());
        }
    }

    pub fn publish_reconciliation_required(&self, event: ReconciliationRequiredEvent) {
        for producer in &self.reconciliation_producer {
            trace!("📬️ Publishing reconciliation event for gateway order {}", event.gateway_order_id);
            producer.publish_event(event.clone());
        }
    }
}

pub struct EventHandlers {
    pub on_order_created: Option<EventHandler<OrderCreatedEvent>>,
    pub on_tracking_assigned: Option<EventHandler<TrackingAssignedEvent>>,
    pub on_reconciliation_required: Option<EventHandler<ReconciliationRequiredEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_order_created = hooks.on_order_created.map(|f| EventHandler::new(buffer_size, f));
        let on_tracking_assigned = hooks.on_tracking_assigned.map(|f| EventHandler::new(buffer_size, f));
        let on_reconciliation_required = hooks.on_reconciliation_required.map(|f| EventHandler::new(buffer_size, f));
        Self { on_order_created, on_tracking_assigned, on_reconciliation_required }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_order_created {
            result.order_created_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_tracking_assigned {
            result.tracking_assigned_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_reconciliation_required {
            result.reconciliation_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_order_created {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_tracking_assigned {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_reconciliation_required {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_created: Option<Handler<OrderCreatedEvent>>,
    pub on_tracking_assigned: Option<Handler<TrackingAssignedEvent>>,
    pub on_reconciliation_required: Option<Handler<ReconciliationRequiredEvent>>,
}

impl EventHooks {
    pub fn on_order_created<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderCreatedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_order_created = Some(Arc::new(f));
        self
    }

    pub fn on_tracking_assigned<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(TrackingAssignedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_tracking_assigned = Some(Arc::new(f));
        self
    }

    pub fn on_reconciliation_required<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(ReconciliationRequiredEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_reconciliation_required = Some(Arc::new(f));
        self
    }
}
