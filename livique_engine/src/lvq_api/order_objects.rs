use livique_common::Money;
use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{OrderItem, PaymentMethod, PaymentStatus, ShippingAddress, ValidationError},
    lvq_api::errors::OrderFlowError,
};

/// The totals a client claims for its cart. They are only ever compared against the server's own figures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientTotals {
    pub subtotal: Option<Money>,
    pub delivery_charges: Option<Money>,
    pub total: Option<Money>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotals {
    pub subtotal: Money,
    pub delivery_charges: Money,
    pub total: Money,
}

impl OrderTotals {
    /// `subtotal` is the sum of price × quantity. Delivery is charged once per line.
    ///
    /// Prices and quantities come from the client, so every step is checked. An amount that overflows is a
    /// validation error, never a wrapped or saturated total.
    pub fn from_items(items: &[OrderItem]) -> Result<Self, ValidationError> {
        let too_large = || ValidationError::new("The order total is too large");
        let mut subtotal = Money::default();
        let mut delivery_charges = Money::default();
        for item in items {
            let line = item.checked_line_total().ok_or_else(too_large)?;
            subtotal = subtotal.checked_add(line).ok_or_else(too_large)?;
            delivery_charges = delivery_charges.checked_add(item.delivery_charge).ok_or_else(too_large)?;
        }
        let total = subtotal.checked_add(delivery_charges).ok_or_else(too_large)?;
        Ok(Self { subtotal, delivery_charges, total })
    }

    /// Lists every figure where the client disagrees with the server.
    pub fn mismatches(&self, client: &ClientTotals) -> Vec<String> {
        let checks = [
            ("subtotal", client.subtotal, self.subtotal),
            ("deliveryCharges", client.delivery_charges, self.delivery_charges),
            ("total", client.total, self.total),
        ];
        checks
            .into_iter()
            .filter_map(|(name, claimed, actual)| match claimed {
                Some(c) if c != actual => Some(format!("{name}: client sent {c}, server computed {actual}")),
                _ => None,
            })
            .collect()
    }
}

/// A checkout as submitted by a client, before any checks have been made.
#[derive(Debug, Clone)]
pub struct CheckoutDraft {
    pub items: Vec<OrderItem>,
    pub address: Option<ShippingAddress>,
    pub payment_method: Option<PaymentMethod>,
    /// Only `Paid` is honoured. Anything else becomes `Pending`.
    pub payment_status: Option<PaymentStatus>,
    pub client_totals: ClientTotals,
}

impl CheckoutDraft {
    /// Runs the boundary checks and returns the parts the orchestrator needs.
    pub fn validate(&self) -> Result<(&ShippingAddress, PaymentMethod, OrderTotals), OrderFlowError> {
        if self.items.is_empty() {
            return Err(OrderFlowError::ValidationError("No order items".into()));
        }
        self.items.iter().try_for_each(OrderItem::validate)?;
        let address = self.address.as_ref().ok_or_else(|| ValidationError::new("A shipping address is required"))?;
        address.validate()?;
        let method = self.payment_method.ok_or_else(|| ValidationError::new("A payment method is required"))?;
        let totals = OrderTotals::from_items(&self.items)?;
        let mismatches = totals.mismatches(&self.client_totals);
        if !mismatches.is_empty() {
            warn!("🛒️ Client totals disagree with the cart and will be ignored. {}", mismatches.join("; "));
        }
        Ok((address, method, totals))
    }
}

/// What the webhook endpoint made of a gateway call. Nothing is persisted either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    Verified { event: Option<String> },
    InvalidSignature,
    MissingSignature,
    /// No webhook secret is configured, so the call could not be checked.
    Unverifiable,
}
