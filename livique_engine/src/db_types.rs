use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use livique_common::Money;
use log::error;
use once_cell::sync::Lazy;
use rand::{distributions::Alphanumeric, Rng};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, FromRow, Row, Type};
use thiserror::Error;

pub const ORDER_STATUS_CONFIRMED: &str = "Confirmed";
pub const ORDER_STATUS_SHIPPED: &str = "Shipped";

static MOBILE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?[0-9][0-9 -]{8,14}[0-9]$").expect("valid regex"));
static ZIP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{6}$").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new<S: Into<String>>(msg: S) -> Self {
        Self(msg.into())
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid value for {field}: {value}")]
pub struct ConversionError {
    pub field: &'static str,
    pub value: String,
}

//--------------------------------------        OrderId        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    /// Generates a fresh public order id, e.g. `LVQ-7H2KQ9ZP4M1X`.
    pub fn random() -> Self {
        let suffix: String =
            rand::thread_rng().sample_iter(&Alphanumeric).take(12).map(|c| (c as char).to_ascii_uppercase()).collect();
        Self(format!("LVQ-{suffix}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

//--------------------------------------        UserId         ---------------------------------------------------------
/// The id of the account that placed an order. Accounts are owned by the auth service; this is an opaque reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------       ProductId       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct ProductId(pub String);

impl ProductId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ProductId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ProductId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------     PaymentMethod     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "COD", alias = "cod", alias = "cash-on-delivery")]
    CashOnDelivery,
    #[serde(rename = "Razorpay", alias = "razorpay", alias = "gateway")]
    Gateway,
    #[serde(rename = "Card", alias = "card")]
    Card,
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::CashOnDelivery => write!(f, "COD"),
            PaymentMethod::Gateway => write!(f, "Razorpay"),
            PaymentMethod::Card => write!(f, "Card"),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "COD" | "cod" | "cash-on-delivery" => Ok(Self::CashOnDelivery),
            "Razorpay" | "razorpay" | "gateway" => Ok(Self::Gateway),
            "Card" | "card" => Ok(Self::Card),
            s => Err(ConversionError { field: "payment_method", value: s.to_string() }),
        }
    }
}

//--------------------------------------     PaymentStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "Pending"),
            PaymentStatus::Paid => write!(f, "Paid"),
            PaymentStatus::Failed => write!(f, "Failed"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Paid" => Ok(Self::Paid),
            "Failed" => Ok(Self::Failed),
            s => Err(ConversionError { field: "payment_status", value: s.to_string() }),
        }
    }
}

//--------------------------------------      AddressType      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AddressType {
    #[default]
    #[serde(alias = "home", alias = "HOME")]
    Home,
    #[serde(alias = "work", alias = "WORK")]
    Work,
    #[serde(alias = "other", alias = "OTHER")]
    Other,
}

//--------------------------------------    ShippingAddress    ---------------------------------------------------------
/// A snapshot of the delivery address, copied into the order at checkout time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub full_name: String,
    pub mobile: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    #[serde(default)]
    pub address_type: AddressType,
}

impl ShippingAddress {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let required = [
            ("fullName", &self.full_name),
            ("mobile", &self.mobile),
            ("street", &self.street),
            ("city", &self.city),
            ("state", &self.state),
            ("zipCode", &self.zip_code),
        ];
        if let Some((name, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(ValidationError(format!("Address field {name} is required")));
        }
        if !MOBILE_RE.is_match(self.mobile.trim()) {
            return Err(ValidationError(format!("{} is not a valid mobile number", self.mobile)));
        }
        if !ZIP_RE.is_match(self.zip_code.trim()) {
            return Err(ValidationError(format!("{} is not a valid PIN code", self.zip_code)));
        }
        Ok(())
    }
}

//--------------------------------------       OrderItem       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(alias = "id")]
    pub product_id: ProductId,
    #[serde(default)]
    pub name: String,
    #[serde(alias = "price")]
    pub unit_price: Money,
    pub quantity: i64,
    #[serde(default, alias = "image")]
    pub image_ref: Option<String>,
    #[serde(default)]
    pub delivery_label: Option<String>,
    /// Delivery charge for this line. It is charged once per line, not per unit.
    #[serde(default)]
    pub delivery_charge: Money,
}

impl OrderItem {
    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }

    /// Price × quantity, or `None` if the product does not fit in an `i64` of paise.
    pub fn checked_line_total(&self) -> Option<Money> {
        self.unit_price.checked_mul(self.quantity)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.product_id.as_str().trim().is_empty() {
            return Err(ValidationError::new("Every item needs a product id"));
        }
        if self.quantity < 1 {
            return Err(ValidationError(format!("Quantity for {} must be at least 1", self.product_id)));
        }
        if self.unit_price.is_negative() || self.delivery_charge.is_negative() {
            return Err(ValidationError(format!("Prices for {} cannot be negative", self.product_id)));
        }
        Ok(())
    }
}

//--------------------------------------    CustomerContact    ---------------------------------------------------------
/// Who to tell about an order. Copied into the order so that later notifications (e.g. tracking) can reach the
/// customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerContact {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl CustomerContact {
    pub fn new(name: Option<String>, email: Option<String>) -> Self {
        let clean = |s: Option<String>| s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        Self { name: clean(name), email: clean(email) }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Customer")
    }
}

//--------------------------------------    GatewayPayment     ---------------------------------------------------------
/// The identifiers returned by the payment gateway on a successful checkout. Stored for audit and disputes only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayPayment {
    pub gateway_order_id: String,
    pub gateway_payment_id: String,
    pub gateway_signature: String,
}

//--------------------------------------        NewOrder       ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    pub address: ShippingAddress,
    pub contact: CustomerContact,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub gateway: Option<GatewayPayment>,
    pub subtotal: Money,
    pub delivery_charges: Money,
    pub total: Money,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    /// The required-field checks the order store applies before anything is written.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.user_id.is_empty() {
            return Err(ValidationError::new("An order must belong to a user"));
        }
        if self.items.is_empty() {
            return Err(ValidationError::new("No order items"));
        }
        self.items.iter().try_for_each(OrderItem::validate)?;
        self.address.validate()?;
        if self.subtotal.is_negative() || self.delivery_charges.is_negative() {
            return Err(ValidationError::new("Order totals cannot be negative"));
        }
        if self.total != self.subtotal + self.delivery_charges {
            return Err(ValidationError(format!(
                "Order total {} does not equal subtotal {} plus delivery charges {}",
                self.total, self.subtotal, self.delivery_charges
            )));
        }
        Ok(())
    }
}

//--------------------------------------         Order         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(skip)]
    pub id: i64,
    #[serde(rename = "id")]
    pub order_id: OrderId,
    #[serde(rename = "user")]
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    pub address: ShippingAddress,
    pub contact: CustomerContact,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub gateway_order_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    pub gateway_signature: Option<String>,
    pub subtotal: Money,
    pub delivery_charges: Money,
    pub total: Money,
    pub status: String,
    pub tracking_id: Option<String>,
    pub tracking_updated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_shipped(&self) -> bool {
        self.status == ORDER_STATUS_SHIPPED
    }
}

fn json_column<T: for<'de> Deserialize<'de>>(row: &SqliteRow, column: &str) -> Result<T, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    serde_json::from_str(&raw).map_err(|e| sqlx::Error::ColumnDecode { index: column.to_string(), source: e.into() })
}

fn parsed_column<T>(row: &SqliteRow, column: &str) -> Result<T, sqlx::Error>
where
    T: FromStr<Err = ConversionError>,
{
    let raw: String = row.try_get(column)?;
    raw.parse::<T>().map_err(|e| {
        error!("🗃️ Corrupt {column} value in orders table: {raw}");
        sqlx::Error::ColumnDecode { index: column.to_string(), source: e.into() }
    })
}

impl FromRow<'_, SqliteRow> for Order {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        let contact =
            CustomerContact { name: row.try_get("contact_name")?, email: row.try_get("contact_email")? };
        Ok(Self {
            id: row.try_get("id")?,
            order_id: row.try_get("order_id")?,
            user_id: row.try_get("user_id")?,
            items: json_column(row, "items")?,
            address: json_column(row, "address")?,
            contact,
            payment_method: parsed_column(row, "payment_method")?,
            payment_status: parsed_column(row, "payment_status")?,
            gateway_order_id: row.try_get("gateway_order_id")?,
            gateway_payment_id: row.try_get("gateway_payment_id")?,
            gateway_signature: row.try_get("gateway_signature")?,
            subtotal: row.try_get("subtotal")?,
            delivery_charges: row.try_get("delivery_charges")?,
            total: row.try_get("total")?,
            status: row.try_get("status")?,
            tracking_id: row.try_get("tracking_id")?,
            tracking_updated_at: row.try_get("tracking_updated_at")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

//--------------------------------------        Product        ---------------------------------------------------------
/// The stock-keeping view of a catalogue product. The catalogue itself is managed elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub quantity: i64,
    pub in_stock: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub id: ProductId,
    pub name: String,
    pub quantity: i64,
}

impl NewProduct {
    pub fn new<S: Into<String>>(id: ProductId, name: S, quantity: i64) -> Self {
        Self { id, name: name.into(), quantity }
    }
}

/// A request to take `quantity` units of a product out of stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAdjustment {
    pub product_id: ProductId,
    pub quantity: i64,
}

impl From<&OrderItem> for StockAdjustment {
    fn from(item: &OrderItem) -> Self {
        Self { product_id: item.product_id.clone(), quantity: item.quantity }
    }
}

//--------------------------------------        CartItem       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: ProductId,
    pub quantity: i64,
}

//--------------------------------------    PushSubscription   ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PushSubscription {
    pub id: i64,
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPushSubscription {
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
}

//--------------------------------------        OtpRecord      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct OtpRecord {
    #[sqlx(rename = "otp_key")]
    pub key: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
    /// Wrong guesses made against this code so far.
    pub attempts: i64,
}

impl OtpRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
