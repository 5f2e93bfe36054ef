use crate::{
    db_types::{NewProduct, Product, ProductId, StockAdjustment},
    traits::StoreError,
};

/// Stock bookkeeping for catalogue products.
///
/// Every write keeps `in_stock == (quantity > 0)`, and no write ever takes `quantity` below zero.
#[allow(async_fn_in_trait)]
pub trait InventoryManagement: Clone {
    async fn fetch_product(&self, product_id: &ProductId) -> Result<Option<Product>, StoreError>;

    /// Creates the product, or resets its name and quantity if it already exists.
    async fn insert_product(&self, product: NewProduct) -> Result<Product, StoreError>;

    /// Best-effort purchase adjustment. Each product's quantity drops by the requested amount, floored at zero.
    /// Unknown product ids are skipped. Returns the products that were updated.
    async fn adjust_stock_for_purchase(&self, adjustments: &[StockAdjustment]) -> Result<Vec<Product>, StoreError>;

    /// Strict decrement. Fails with [`StoreError::InsufficientStock`] and leaves the product untouched if there is
    /// not enough stock, or [`StoreError::ProductNotFound`] for an unknown id.
    async fn decrease_quantity(&self, product_id: &ProductId, quantity: i64) -> Result<Product, StoreError>;
}
