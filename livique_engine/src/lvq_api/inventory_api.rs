use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{NewProduct, Product, ProductId, StockAdjustment},
    lvq_api::errors::OrderFlowError,
    traits::InventoryManagement,
};

/// Stock bookkeeping outside the checkout transaction: seeding, manual decrements and best-effort adjustments.
pub struct InventoryApi<B> {
    db: B,
}

impl<B> Debug for InventoryApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "InventoryApi")
    }
}

impl<B> InventoryApi<B>
where B: InventoryManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn product(&self, product_id: &ProductId) -> Result<Option<Product>, OrderFlowError> {
        let product = self.db.fetch_product(product_id).await?;
        Ok(product)
    }

    pub async fn upsert_product(&self, product: NewProduct) -> Result<Product, OrderFlowError> {
        let product = self.db.insert_product(product).await?;
        debug!("📦️ Stock for {} set to {}", product.id, product.quantity);
        Ok(product)
    }

    /// Floors each product at zero and skips unknown ids. This never fails because of low stock.
    pub async fn adjust_for_purchase(&self, adjustments: &[StockAdjustment]) -> Result<Vec<Product>, OrderFlowError> {
        let updated = self.db.adjust_stock_for_purchase(adjustments).await?;
        if updated.len() < adjustments.len() {
            debug!("📦️ {} of {} products were not in the stock table", adjustments.len() - updated.len(), adjustments.len());
        }
        Ok(updated)
    }

    /// Manual decrement that refuses to oversell.
    pub async fn decrease_quantity(&self, product_id: &ProductId, quantity: i64) -> Result<Product, OrderFlowError> {
        let product = self.db.decrease_quantity(product_id, quantity).await.map_err(|e| {
            info!("📦️ Could not take {quantity} units of {product_id} out of stock. {e}");
            OrderFlowError::from(e)
        })?;
        Ok(product)
    }
}
