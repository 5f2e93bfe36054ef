//! Livique order engine
//!
//! The order engine holds the core logic behind the Livique storefront's checkout: taking a cart to a stored order,
//! verifying payment gateway callbacks, keeping stock counters honest and attaching shipment tracking. It knows
//! nothing about HTTP.
//!
//! The library is divided into three main sections:
//! 1. Storage ([`traits`] and, with the `sqlite` feature, [`SqliteDatabase`]). You should not need to touch the
//!    database directly. Use the public API instead. The exception is the data types in [`db_types`], which are
//!    public.
//! 2. The public API (`lvq_api`). [`OrderFlowApi`] sequences validation, signature checks, the atomic checkout write
//!    and event publication. [`InventoryApi`], [`CartApi`], [`PushSubscriptionApi`] and [`OtpApi`] cover the rest.
//! 3. Events ([`events`]). Side effects such as emails and push notifications subscribe to engine events. Events are
//!    only published after the database commit succeeds, and a slow subscriber can never hold up a checkout.
pub mod db_types;
pub mod events;
pub mod helpers;
mod lvq_api;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use lvq_api::{
    cart_api::CartApi,
    errors::{OrderFlowError, OtpError},
    inventory_api::InventoryApi,
    memory_otp_store::MemoryOtpStore,
    order_flow_api::{OrderFlowApi, OrderFlowOptions},
    order_objects,
    otp_api::{IssuedOtp, OtpApi, DEFAULT_OTP_MAX_ATTEMPTS, DEFAULT_OTP_TTL_SECS},
    push_subscription_api::PushSubscriptionApi,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
