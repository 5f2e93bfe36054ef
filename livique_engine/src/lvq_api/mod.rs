//! # Livique engine public API
//!
//! The `lvq_api` module exposes the programmatic API for the storefront's order workflow. Each API wraps a storage
//! backend that implements the traits it needs, so callers only pull in what they use.
//!
//! * [`order_flow_api`] runs checkout (cash on delivery and gateway), tracking updates and webhook checks.
//! * [`inventory_api`] handles stock outside the checkout transaction.
//! * [`cart_api`] and [`push_subscription_api`] are thin wrappers over their stores.
//! * [`otp_api`] issues and checks one-time codes.
//!
//! ```rust,ignore
//! use livique_engine::{OrderFlowApi, SqliteDatabase, events::EventProducers};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! let api = OrderFlowApi::new(db, EventProducers::default(), options);
//! let order = api.process_cod_order(&user_id, contact, draft).await?;
//! ```
pub mod cart_api;
pub mod errors;
pub mod inventory_api;
pub mod memory_otp_store;
pub mod order_flow_api;
pub mod order_objects;
pub mod otp_api;
pub mod push_subscription_api;
