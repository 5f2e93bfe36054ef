//! Request and response bodies.
//!
//! Field names are camelCase on the wire. Optional fields and their defaults are listed on each struct, and every body
//! is checked here or in the engine before anything is written.
use livique_common::Money;
use livique_engine::{
    db_types::{
        CartItem,
        GatewayPayment,
        NewPushSubscription,
        OrderId,
        OrderItem,
        PaymentMethod,
        PaymentStatus,
        ShippingAddress,
        UserId,
    },
    order_objects::{CheckoutDraft, ClientTotals},
};
use serde::{Deserialize, Serialize};

use crate::errors::ServerError;

/// A checkout submission.
///
/// * `paymentMethod` defaults to the route's method (cash on delivery for `/api/orders`).
/// * `paymentStatus` is only honoured when it is `Paid`.
/// * `subtotal`, `deliveryCharges` and `total` are optional. They are compared with the server's own figures and
///   otherwise ignored.
/// * `userName` and `userEmail` override the contact details in the caller's token.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(default)]
    pub items: Vec<OrderItem>,
    pub address: Option<ShippingAddress>,
    pub payment_method: Option<PaymentMethod>,
    pub payment_status: Option<PaymentStatus>,
    pub subtotal: Option<Money>,
    pub delivery_charges: Option<Money>,
    pub total: Option<Money>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
}

impl CheckoutRequest {
    pub fn into_draft(self, default_method: PaymentMethod) -> CheckoutDraft {
        CheckoutDraft {
            items: self.items,
            address: self.address,
            payment_method: Some(self.payment_method.unwrap_or(default_method)),
            payment_status: self.payment_status,
            client_totals: ClientTotals {
                subtotal: self.subtotal,
                delivery_charges: self.delivery_charges,
                total: self.total,
            },
        }
    }
}

/// The gateway's checkout callback, relayed by the storefront together with the cart it paid for.
///
/// `userId` is optional. If present it must be the caller's own id, unless the caller is an admin.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentVerificationRequest {
    #[serde(default)]
    pub gateway_order_id: String,
    #[serde(default)]
    pub gateway_payment_id: String,
    #[serde(default)]
    pub gateway_signature: String,
    pub user_id: Option<UserId>,
    #[serde(flatten)]
    pub checkout: CheckoutRequest,
}

impl PaymentVerificationRequest {
    /// Splits the request into the payment proof and the checkout. All three gateway fields are required.
    pub fn into_parts(self) -> Result<(GatewayPayment, CheckoutRequest), ServerError> {
        let fields = [&self.gateway_order_id, &self.gateway_payment_id, &self.gateway_signature];
        if fields.iter().any(|f| f.trim().is_empty()) {
            return Err(ServerError::ValidationError("Payment details are required".into()));
        }
        let payment = GatewayPayment {
            gateway_order_id: self.gateway_order_id.trim().to_string(),
            gateway_payment_id: self.gateway_payment_id.trim().to_string(),
            gateway_signature: self.gateway_signature.trim().to_string(),
        };
        Ok((payment, self.checkout))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentVerificationResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<OrderId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PaymentVerificationResponse {
    pub fn success(order_id: OrderId) -> Self {
        Self { success: true, order_id: Some(order_id), message: None, error: None }
    }

    pub fn failure<S: Into<String>>(message: S) -> Self {
        Self { success: false, message: Some(message.into()), ..Default::default() }
    }

    pub fn with_error<S: Into<String>>(mut self, error: S) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// `trackingId` is required. A missing or blank id is rejected with a 400.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingUpdateRequest {
    #[serde(default)]
    pub tracking_id: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QuantityRequest {
    pub quantity: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CartUpdateRequest {
    #[serde(default)]
    pub items: Vec<CartItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CartResponse {
    pub items: Vec<CartItem>,
}

/// A browser `PushSubscription` as produced by `PushSubscription.toJSON()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushSubscriptionRequest {
    pub endpoint: String,
    pub keys: PushSubscriptionKeys,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushSubscriptionKeys {
    pub p256dh: String,
    pub auth: String,
}

impl From<PushSubscriptionRequest> for NewPushSubscription {
    fn from(req: PushSubscriptionRequest) -> Self {
        NewPushSubscription { endpoint: req.endpoint, p256dh: req.keys.p256dh, auth: req.keys.auth }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OtpRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OtpVerifyRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Into<String>>(message: S) -> Self {
        Self { success: true, message: message.into() }
    }
}
