use thiserror::Error;

use crate::{
    db_types::{OrderId, ProductId, ValidationError},
    helpers::SignatureError,
    traits::StoreError,
};

/// Everything that can go wrong while taking an order from draft to a stored record.
#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("{0}")]
    ValidationError(String),
    #[error("Order {0} was not found")]
    OrderNotFound(OrderId),
    #[error("Product {0} was not found")]
    ProductNotFound(ProductId),
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Insufficient stock for {product_id}. {available} available, {requested} requested")]
    InsufficientStock { product_id: ProductId, available: i64, requested: i64 },
    #[error("The payment gateway is not configured correctly. {0}")]
    ConfigurationError(String),
    #[error("Could not save the order. {0}")]
    PersistenceError(String),
}

impl From<StoreError> for OrderFlowError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::ValidationError(v) => Self::ValidationError(v.0),
            StoreError::OrderNotFound(id) => Self::OrderNotFound(id),
            StoreError::ProductNotFound(id) => Self::ProductNotFound(id),
            StoreError::InsufficientStock { product_id, available, requested } => {
                Self::InsufficientStock { product_id, available, requested }
            },
            StoreError::DatabaseError(s) => Self::PersistenceError(s),
            StoreError::OrderAlreadyExists(id) => Self::PersistenceError(format!("Order {id} already exists")),
        }
    }
}

impl From<ValidationError> for OrderFlowError {
    fn from(e: ValidationError) -> Self {
        Self::ValidationError(e.0)
    }
}

impl From<SignatureError> for OrderFlowError {
    fn from(e: SignatureError) -> Self {
        Self::ConfigurationError(e.to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum OtpError {
    #[error("An email address or phone number is required")]
    MissingKey,
    #[error("The code is incorrect or has expired")]
    InvalidCode,
    #[error("Could not store the code. {0}")]
    StoreError(#[from] StoreError),
}
