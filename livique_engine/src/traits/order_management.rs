use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::db_types::{NewOrder, Order, OrderId, ProductId, UserId, ValidationError};

/// Which extra writes must commit together with a new order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CheckoutEffects {
    /// Take the ordered quantities out of stock (floored at zero).
    pub adjust_inventory: bool,
    /// Empty the buyer's saved cart.
    pub clear_cart: bool,
}

impl CheckoutEffects {
    pub fn cash_on_delivery() -> Self {
        Self { adjust_inventory: true, clear_cart: true }
    }

    pub fn gateway(adjust_inventory: bool) -> Self {
        Self { adjust_inventory, clear_cart: true }
    }
}

/// Storage behaviour for orders.
///
/// Orders are written once and are never deleted. The only mutation after creation is attaching a tracking id.
#[allow(async_fn_in_trait)]
pub trait OrderManagement: Clone {
    /// Validates and stores a single order, with no other side effects.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError>;

    /// Stores a new order together with its checkout side effects in a single atomic transaction.
    ///
    /// * If `effects.adjust_inventory` is set, every item's product quantity is reduced by the ordered amount, floored
    ///   at zero, and `in_stock` is refreshed. Unknown products are skipped.
    /// * The order is inserted.
    /// * If `effects.clear_cart` is set, the buyer's cart is emptied.
    ///
    /// If any step fails, nothing is written.
    async fn process_new_order(&self, order: NewOrder, effects: CheckoutEffects) -> Result<Order, StoreError>;

    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, StoreError>;

    /// All orders placed by `user_id`, newest first.
    async fn fetch_orders_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, StoreError>;

    /// Every order in the store, newest first.
    async fn fetch_all_orders(&self) -> Result<Vec<Order>, StoreError>;

    /// Attaches `tracking_id` to the order and marks it as shipped.
    ///
    /// `tracking_updated_at` is set to `at`, unless the stored timestamp is already later, so it never moves backwards.
    /// Setting a new tracking id overwrites the old one.
    async fn set_tracking(&self, order_id: &OrderId, tracking_id: &str, at: DateTime<Utc>)
        -> Result<Order, StoreError>;

    async fn close(&mut self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("Invalid order data. {0}")]
    ValidationError(#[from] ValidationError),
    #[error("The order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Cannot insert order, since it already exists with id {0}")]
    OrderAlreadyExists(OrderId),
    #[error("The product {0} does not exist")]
    ProductNotFound(ProductId),
    #[error("Insufficient stock for {product_id}. {available} available, {requested} requested")]
    InsufficientStock { product_id: ProductId, available: i64, requested: i64 },
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::DatabaseError(e.to_string())
    }
}
