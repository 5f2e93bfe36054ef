use crate::{
    db_types::{CartItem, UserId},
    traits::StoreError,
};

#[allow(async_fn_in_trait)]
pub trait CartManagement: Clone {
    async fn fetch_cart(&self, user_id: &UserId) -> Result<Vec<CartItem>, StoreError>;

    /// Replaces the user's cart with `items`. Lines with a non-positive quantity are dropped.
    async fn save_cart(&self, user_id: &UserId, items: &[CartItem]) -> Result<Vec<CartItem>, StoreError>;

    async fn clear_cart(&self, user_id: &UserId) -> Result<(), StoreError>;
}
