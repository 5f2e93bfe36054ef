//! # Storage contracts
//!
//! The traits in this module define what a storage backend must provide to run the Livique order workflow. The
//! SQLite backend ([`crate::SqliteDatabase`]) implements all of them; tests swap in mocks where a failure needs to be
//! injected.
//!
//! * [`OrderManagement`] stores orders and performs the atomic checkout write.
//! * [`InventoryManagement`] keeps product stock counters honest.
//! * [`CartManagement`] holds each user's saved cart.
//! * [`PushSubscriptionManagement`] holds the admin push registrations.
//! * [`OtpStore`] is the expiring keyed store used for one-time codes.
mod cart_management;
mod inventory_management;
mod order_management;
mod otp_store;
mod push_subscriptions;

pub use cart_management::CartManagement;
pub use inventory_management::InventoryManagement;
pub use order_management::{CheckoutEffects, OrderManagement, StoreError};
pub use otp_store::OtpStore;
pub use push_subscriptions::PushSubscriptionManagement;
