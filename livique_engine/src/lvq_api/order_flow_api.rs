use std::fmt::Debug;

use chrono::Utc;
use livique_common::Secret;
use log::*;

use crate::{
    db_types::{
        CustomerContact,
        GatewayPayment,
        NewOrder,
        Order,
        OrderId,
        PaymentMethod,
        PaymentStatus,
        UserId,
        ORDER_STATUS_CONFIRMED,
    },
    events::{EventProducers, OrderCreatedEvent, ReconciliationRequiredEvent, TrackingAssignedEvent},
    helpers::{verify_payment_signature, verify_webhook_signature},
    lvq_api::{
        errors::OrderFlowError,
        order_objects::{CheckoutDraft, WebhookOutcome},
    },
    traits::{CheckoutEffects, OrderManagement},
};

/// Gateway settings the order workflow needs.
#[derive(Debug, Clone, Default)]
pub struct OrderFlowOptions {
    /// Secret used to check the checkout callback signature.
    pub gateway_key_secret: Secret<String>,
    /// Secret used to check webhook signatures.
    pub gateway_webhook_secret: Secret<String>,
    /// When set, gateway-paid orders also take stock out of inventory, as cash-on-delivery orders always do.
    pub gateway_adjusts_inventory: bool,
}

/// `OrderFlowApi` is the primary API for checkout, payment verification and fulfilment.
///
/// Every entry point follows the same order: validate the input, check the payment signature if there is one, commit
/// all writes in one transaction, and only then publish events. Event handlers (notifications) can therefore never see
/// an order that was not stored, and nothing they do can undo it.
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
    options: OrderFlowOptions,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers, options: OrderFlowOptions) -> Self {
        Self { db, producers, options }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn options(&self) -> &OrderFlowOptions {
        &self.options
    }
}

impl<B> OrderFlowApi<B>
where B: OrderManagement
{
    /// Cash-on-delivery checkout.
    ///
    /// Stock is adjusted, the order is stored and the cart is cleared in one transaction. The order's payment status is
    /// `Pending` unless the client explicitly marked it `Paid`.
    pub async fn process_cod_order(
        &self,
        user_id: &UserId,
        contact: CustomerContact,
        draft: CheckoutDraft,
    ) -> Result<Order, OrderFlowError> {
        let (address, payment_method, totals) = draft.validate()?;
        let payment_status = match draft.payment_status {
            Some(PaymentStatus::Paid) => PaymentStatus::Paid,
            _ => PaymentStatus::Pending,
        };
        let order = NewOrder {
            order_id: OrderId::random(),
            user_id: user_id.clone(),
            items: draft.items.clone(),
            address: address.clone(),
            contact,
            payment_method,
            payment_status,
            gateway: None,
            subtotal: totals.subtotal,
            delivery_charges: totals.delivery_charges,
            total: totals.total,
            status: ORDER_STATUS_CONFIRMED.to_string(),
            created_at: Utc::now(),
        };
        let order = self.db.process_new_order(order, CheckoutEffects::cash_on_delivery()).await.map_err(|e| {
            warn!("🛒️ Could not store the checkout for {user_id}. {e}");
            OrderFlowError::from(e)
        })?;
        info!("🛒️ Order {} placed by {user_id} for {} ({payment_method})", order.order_id, order.total);
        self.producers.publish_order_created(OrderCreatedEvent::new(order.clone()));
        Ok(order)
    }

    /// Gateway checkout callback.
    ///
    /// The gateway signature is checked before anything is written. A bad signature leaves no trace in the database.
    /// If the signature is good but the order cannot be stored, the customer has paid for an order we do not have.
    /// That case is logged at `error` level and an operator alert is published before the error is returned.
    pub async fn process_gateway_payment(
        &self,
        user_id: &UserId,
        contact: CustomerContact,
        payment: GatewayPayment,
        draft: CheckoutDraft,
    ) -> Result<Order, OrderFlowError> {
        let (address, payment_method, totals) = draft.validate()?;
        let valid = verify_payment_signature(
            &payment.gateway_order_id,
            &payment.gateway_payment_id,
            &payment.gateway_signature,
            &self.options.gateway_key_secret,
        )
        .map_err(|e| {
            error!("💳️ Cannot verify gateway payments. {e}");
            OrderFlowError::from(e)
        })?;
        if !valid {
            warn!(
                "💳️ Rejected gateway callback for order {} / payment {}: invalid signature",
                payment.gateway_order_id, payment.gateway_payment_id
            );
            return Err(OrderFlowError::InvalidSignature);
        }
        debug!("💳️ Signature for gateway payment {} is valid", payment.gateway_payment_id);
        let payment_method = match payment_method {
            PaymentMethod::CashOnDelivery => PaymentMethod::Gateway,
            m => m,
        };
        let gateway_order_id = payment.gateway_order_id.clone();
        let gateway_payment_id = payment.gateway_payment_id.clone();
        let order = NewOrder {
            order_id: OrderId::random(),
            user_id: user_id.clone(),
            items: draft.items.clone(),
            address: address.clone(),
            contact,
            payment_method,
            payment_status: PaymentStatus::Paid,
            gateway: Some(payment),
            subtotal: totals.subtotal,
            delivery_charges: totals.delivery_charges,
            total: totals.total,
            status: ORDER_STATUS_CONFIRMED.to_string(),
            created_at: Utc::now(),
        };
        let effects = CheckoutEffects::gateway(self.options.gateway_adjusts_inventory);
        match self.db.process_new_order(order, effects).await {
            Ok(order) => {
                info!(
                    "💳️ Order {} paid via gateway payment {gateway_payment_id} by {user_id} for {}",
                    order.order_id, order.total
                );
                self.producers.publish_order_created(OrderCreatedEvent::new(order.clone()));
                Ok(order)
            },
            Err(e) => {
                error!(
                    "💳️ RECONCILIATION REQUIRED. Gateway payment {gateway_payment_id} (gateway order \
                     {gateway_order_id}) for {user_id} was captured, but the order could not be saved. {e}"
                );
                let event = ReconciliationRequiredEvent {
                    gateway_order_id,
                    gateway_payment_id,
                    user_id: user_id.clone(),
                    error: e.to_string(),
                };
                self.producers.publish_reconciliation_required(event);
                Err(OrderFlowError::PersistenceError(e.to_string()))
            },
        }
    }

    /// Attaches a shipment tracking id and marks the order as shipped.
    ///
    /// Calling this again with the same tracking id leaves the order in the same state, apart from a (non-decreasing)
    /// `tracking_updated_at`.
    pub async fn assign_tracking(&self, order_id: &OrderId, tracking_id: &str) -> Result<Order, OrderFlowError> {
        if self.db.fetch_order_by_order_id(order_id).await?.is_none() {
            debug!("🛒️ Tracking update for unknown order {order_id}");
            return Err(OrderFlowError::OrderNotFound(order_id.clone()));
        }
        let tracking_id = tracking_id.trim();
        if tracking_id.is_empty() {
            return Err(OrderFlowError::ValidationError("Tracking ID is required".into()));
        }
        let order = self.db.set_tracking(order_id, tracking_id, Utc::now()).await?;
        info!("🛒️ Order {order_id} has shipped with tracking id {tracking_id}");
        self.producers.publish_tracking_assigned(TrackingAssignedEvent::new(order.clone()));
        Ok(order)
    }

    pub async fn order_by_id(&self, order_id: &OrderId) -> Result<Option<Order>, OrderFlowError> {
        let order = self.db.fetch_order_by_order_id(order_id).await?;
        Ok(order)
    }

    pub async fn orders_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, OrderFlowError> {
        let orders = self.db.fetch_orders_for_user(user_id).await?;
        Ok(orders)
    }

    pub async fn all_orders(&self) -> Result<Vec<Order>, OrderFlowError> {
        let orders = self.db.fetch_all_orders().await?;
        Ok(orders)
    }
}

impl<B> OrderFlowApi<B> {
    /// Checks an asynchronous gateway notification against the raw request body and logs the result.
    ///
    /// Webhooks never change stored state. The synchronous checkout callback is the only thing that records payments.
    pub fn process_payment_webhook(&self, body: &[u8], signature: Option<&str>) -> WebhookOutcome {
        let event = serde_json::from_slice::<serde_json::Value>(body).ok();
        let event_name = event.as_ref().and_then(|v| v.get("event")).and_then(|v| v.as_str()).map(String::from);
        let payment_id = event
            .as_ref()
            .and_then(|v| v.pointer("/payload/payment/entity/id"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");
        let label = event_name.as_deref().unwrap_or("unknown");
        let Some(signature) = signature else {
            warn!("💳️ Webhook {label} for payment {payment_id} arrived without a signature");
            return WebhookOutcome::MissingSignature;
        };
        match verify_webhook_signature(body, signature, &self.options.gateway_webhook_secret) {
            Ok(true) => {
                info!("💳️ Verified webhook {label} for payment {payment_id}");
                WebhookOutcome::Verified { event: event_name }
            },
            Ok(false) => {
                warn!("💳️ Webhook {label} for payment {payment_id} has an invalid signature");
                WebhookOutcome::InvalidSignature
            },
            Err(e) => {
                warn!("💳️ Webhook {label} for payment {payment_id} could not be verified. {e}");
                WebhookOutcome::Unverifiable
            },
        }
    }
}
