//! `SqliteDatabase` is the concrete storage backend for the Livique order workflow.
//!
//! It uses SQLite and implements all the traits defined in the [`crate::traits`] module.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use sqlx::{migrate::MigrateError, SqlitePool};

use super::db::{carts, db_url, new_pool, orders, otp, products, push_subscriptions};
use crate::{
    db_types::{
        CartItem,
        NewOrder,
        NewProduct,
        NewPushSubscription,
        Order,
        OrderId,
        OtpRecord,
        Product,
        ProductId,
        PushSubscription,
        StockAdjustment,
        UserId,
        ValidationError,
    },
    traits::{
        CartManagement,
        CheckoutEffects,
        InventoryManagement,
        OrderManagement,
        OtpStore,
        PushSubscriptionManagement,
        StoreError,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl OrderManagement for SqliteDatabase {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::insert_order(order, &mut conn).await
    }

    async fn process_new_order(&self, order: NewOrder, effects: CheckoutEffects) -> Result<Order, StoreError> {
        order.validate()?;
        let mut tx = self.pool.begin().await?;
        if effects.adjust_inventory {
            let now = Utc::now();
            for item in &order.items {
                products::decrement_floored(&item.product_id, item.quantity, now, &mut tx).await?;
            }
            debug!("📦️ Stock adjusted for {} lines of order {}", order.items.len(), order.order_id);
        }
        let user_id = order.user_id.clone();
        let order = orders::insert_order(order, &mut tx).await?;
        if effects.clear_cart {
            let n = carts::clear_cart(&user_id, &mut tx).await?;
            trace!("🗃️ Cleared {n} cart lines for {user_id}");
        }
        tx.commit().await?;
        debug!("🗃️ Order {} has been committed", order.order_id);
        Ok(order)
    }

    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_order_id(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_orders_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_for_user(user_id, &mut conn).await?;
        Ok(orders)
    }

    async fn fetch_all_orders(&self) -> Result<Vec<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_all_orders(&mut conn).await?;
        Ok(orders)
    }

    async fn set_tracking(
        &self,
        order_id: &OrderId,
        tracking_id: &str,
        at: DateTime<Utc>,
    ) -> Result<Order, StoreError> {
        if tracking_id.trim().is_empty() {
            return Err(ValidationError::new("Tracking ID is required").into());
        }
        let mut tx = self.pool.begin().await?;
        let order = orders::set_tracking(order_id, tracking_id.trim(), at, &mut tx)
            .await?
            .ok_or_else(|| StoreError::OrderNotFound(order_id.clone()))?;
        tx.commit().await?;
        Ok(order)
    }

    async fn close(&mut self) -> Result<(), StoreError> {
        self.pool.close().await;
        Ok(())
    }
}

impl InventoryManagement for SqliteDatabase {
    async fn fetch_product(&self, product_id: &ProductId) -> Result<Option<Product>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_product(product_id, &mut conn).await?;
        Ok(product)
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product, StoreError> {
        let mut conn = self.pool.acquire().await?;
        products::upsert_product(product, Utc::now(), &mut conn).await
    }

    async fn adjust_stock_for_purchase(&self, adjustments: &[StockAdjustment]) -> Result<Vec<Product>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();
        let mut updated = Vec::with_capacity(adjustments.len());
        for adj in adjustments {
            if let Some(p) = products::decrement_floored(&adj.product_id, adj.quantity, now, &mut tx).await? {
                updated.push(p);
            }
        }
        tx.commit().await?;
        Ok(updated)
    }

    async fn decrease_quantity(&self, product_id: &ProductId, quantity: i64) -> Result<Product, StoreError> {
        if quantity < 1 {
            return Err(ValidationError::new("Quantity must be at least 1").into());
        }
        let mut conn = self.pool.acquire().await?;
        products::decrement_if_enough(product_id, quantity, Utc::now(), &mut conn).await
    }
}

impl CartManagement for SqliteDatabase {
    async fn fetch_cart(&self, user_id: &UserId) -> Result<Vec<CartItem>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let items = carts::fetch_cart(user_id, &mut conn).await?;
        Ok(items)
    }

    async fn save_cart(&self, user_id: &UserId, items: &[CartItem]) -> Result<Vec<CartItem>, StoreError> {
        let items = items.iter().filter(|i| i.quantity > 0).cloned().collect::<Vec<_>>();
        let mut tx = self.pool.begin().await?;
        carts::replace_cart(user_id, &items, &mut tx).await?;
        let saved = carts::fetch_cart(user_id, &mut tx).await?;
        tx.commit().await?;
        Ok(saved)
    }

    async fn clear_cart(&self, user_id: &UserId) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await?;
        carts::clear_cart(user_id, &mut conn).await?;
        Ok(())
    }
}

impl PushSubscriptionManagement for SqliteDatabase {
    async fn add_subscription(&self, subscription: NewPushSubscription) -> Result<PushSubscription, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let sub = push_subscriptions::upsert_subscription(subscription, Utc::now(), &mut conn).await?;
        Ok(sub)
    }

    async fn fetch_subscriptions(&self) -> Result<Vec<PushSubscription>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let subs = push_subscriptions::fetch_subscriptions(&mut conn).await?;
        Ok(subs)
    }

    async fn remove_subscription(&self, endpoint: &str) -> Result<bool, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let removed = push_subscriptions::delete_subscription(endpoint, &mut conn).await?;
        Ok(removed)
    }
}

impl OtpStore for SqliteDatabase {
    async fn put(&self, key: &str, code: &str, expires_at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await?;
        otp::upsert_code(key, code, expires_at, &mut conn).await?;
        Ok(())
    }

    async fn take(&self, key: &str, now: DateTime<Utc>) -> Result<Option<OtpRecord>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let record = otp::fetch_code(key, &mut tx).await?;
        if record.is_some() {
            otp::delete_code(key, &mut tx).await?;
        }
        tx.commit().await?;
        Ok(record.filter(|r| !r.is_expired(now)))
    }

    async fn peek(&self, key: &str, now: DateTime<Utc>) -> Result<Option<OtpRecord>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let record = otp::fetch_code(key, &mut conn).await?;
        match record {
            Some(r) if r.is_expired(now) => {
                otp::delete_code(key, &mut conn).await?;
                Ok(None)
            },
            r => Ok(r),
        }
    }

    async fn record_failed_attempt(&self, key: &str) -> Result<Option<i64>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let attempts = otp::increment_attempts(key, &mut conn).await?;
        Ok(attempts)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let n = otp::delete_expired(now, &mut conn).await?;
        Ok(n)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date. Safe to call on every start.
    pub async fn migrate(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations are up to date");
        Ok(())
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
