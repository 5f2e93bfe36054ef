//! Notification side effects for the Livique order engine.
//!
//! [`NotificationDispatcher`] turns engine events into customer emails, operator alerts and admin browser push
//! messages. Delivery goes through HTTP relays ([`MailClient`], [`PushClient`]); both are behind traits so tests can
//! substitute in-process fakes.
mod config;
mod dispatcher;
mod error;
mod mail;
mod otp;
mod push;
pub mod templates;

pub use config::{MailConfig, NotifyConfig, PushConfig, DEFAULT_NOTIFY_TIMEOUT_MS};
pub use dispatcher::{DispatchReport, NotificationDispatcher};
pub use error::NotificationError;
pub use mail::{Email, MailClient, Mailer};
pub use otp::OtpMailer;
pub use push::{PushClient, PushMessage, PushSender};
