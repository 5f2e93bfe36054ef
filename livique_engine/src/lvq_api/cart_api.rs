use crate::{
    db_types::{CartItem, UserId},
    lvq_api::errors::OrderFlowError,
    traits::CartManagement,
};

pub struct CartApi<B> {
    db: B,
}

impl<B> CartApi<B>
where B: CartManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn cart(&self, user_id: &UserId) -> Result<Vec<CartItem>, OrderFlowError> {
        let items = self.db.fetch_cart(user_id).await?;
        Ok(items)
    }

    pub async fn replace_cart(&self, user_id: &UserId, items: &[CartItem]) -> Result<Vec<CartItem>, OrderFlowError> {
        let items = self.db.save_cart(user_id, items).await?;
        Ok(items)
    }
}
