//! Server configuration
//!
//! Everything is read from environment variables (and a `.env` file, via `dotenvy`, in `main`). Every setting has a
//! default, and every defaulted or unparseable value is logged with the 🪛️ prefix so that misconfiguration shows up in
//! the startup log rather than at the first request.
use std::{env, fmt::Display, str::FromStr};

use chrono::Duration;
use livique_common::{
    helpers::{env_flag, env_non_empty, env_parse},
    Secret,
};
use livique_engine::{OrderFlowOptions, DEFAULT_OTP_TTL_SECS};
use livique_notify::NotifyConfig;
use log::*;
use rand::{distributions::Alphanumeric, thread_rng, Rng};

const DEFAULT_LVQ_HOST: &str = "127.0.0.1";
const DEFAULT_LVQ_PORT: u16 = 8470;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/livique.db";
const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;
const DEFAULT_MAX_DB_CONNECTIONS: u32 = 25;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_db_connections: u32,
    pub auth: AuthConfig,
    pub options: ServerOptions,
    /// Gateway secrets and the inventory switch for gateway-paid orders.
    pub order_flow: OrderFlowOptions,
    /// Capacity of each event queue between the order engine and the notification dispatcher. When a queue is full,
    /// new events are dropped and logged.
    pub event_buffer_size: usize,
    pub otp_ttl: Duration,
    pub notify: NotifyConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_LVQ_HOST.to_string(),
            port: DEFAULT_LVQ_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_db_connections: DEFAULT_MAX_DB_CONNECTIONS,
            auth: AuthConfig::default(),
            options: ServerOptions::default(),
            order_flow: OrderFlowOptions::default(),
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
            otp_ttl: Duration::seconds(DEFAULT_OTP_TTL_SECS),
            notify: NotifyConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env_non_empty("LVQ_HOST").unwrap_or_else(|| {
            info!("🪛️ LVQ_HOST is not set. Binding to {DEFAULT_LVQ_HOST}");
            DEFAULT_LVQ_HOST.into()
        });
        let port = parse_or_default("LVQ_PORT", DEFAULT_LVQ_PORT);
        let database_url = env_non_empty("LVQ_DATABASE_URL").unwrap_or_else(|| {
            warn!("🪛️ LVQ_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}");
            DEFAULT_DATABASE_URL.into()
        });
        let max_db_connections = parse_or_default("LVQ_MAX_DB_CONNECTIONS", DEFAULT_MAX_DB_CONNECTIONS);
        let auth = AuthConfig::from_env_or_default();
        let options = ServerOptions {
            use_x_forwarded_for: env_flag("LVQ_USE_X_FORWARDED_FOR", false),
            use_forwarded: env_flag("LVQ_USE_FORWARDED", false),
        };
        let order_flow = order_flow_options_from_env();
        let event_buffer_size = parse_or_default("LVQ_EVENT_BUFFER_SIZE", DEFAULT_EVENT_BUFFER_SIZE).max(1);
        let otp_ttl = Duration::seconds(parse_or_default("LVQ_OTP_TTL_SECS", DEFAULT_OTP_TTL_SECS).max(1));
        let notify = NotifyConfig::from_env_or_default();
        Self {
            host,
            port,
            database_url,
            max_db_connections,
            auth,
            options,
            order_flow,
            event_buffer_size,
            otp_ttl,
            notify,
        }
    }
}

fn parse_or_default<T>(name: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env_parse::<T>(name) {
        Some(Ok(v)) => v,
        Some(Err(e)) => {
            error!("🪛️ {name} is not valid. {e} Using the default, {default}, instead.");
            default
        },
        None => {
            debug!("🪛️ {name} is not set. Using the default, {default}");
            default
        },
    }
}

fn order_flow_options_from_env() -> OrderFlowOptions {
    let gateway_key_secret = Secret::new(env::var("LVQ_GATEWAY_KEY_SECRET").unwrap_or_default());
    if gateway_key_secret.is_empty() {
        error!("🪛️ LVQ_GATEWAY_KEY_SECRET is not set. Gateway payments cannot be verified until it is.");
    }
    let gateway_webhook_secret = Secret::new(env::var("LVQ_GATEWAY_WEBHOOK_SECRET").unwrap_or_default());
    if gateway_webhook_secret.is_empty() {
        warn!("🪛️ LVQ_GATEWAY_WEBHOOK_SECRET is not set. Gateway webhooks will be logged as unverifiable.");
    }
    let gateway_adjusts_inventory = env_flag("LVQ_GATEWAY_ADJUSTS_INVENTORY", false);
    if gateway_adjusts_inventory {
        info!("🪛️ Gateway-paid orders will reduce stock levels");
    }
    OrderFlowOptions { gateway_key_secret, gateway_webhook_secret, gateway_adjusts_inventory }
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The HS256 secret shared with the identity provider that issues access tokens.
    pub jwt_secret: Secret<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        warn!(
            "🚨️🚨️🚨️ The JWT secret has not been set. I'm using a random value for this session. No externally issued \
             token will be accepted. Set LVQ_JWT_SECRET. 🚨️🚨️🚨️"
        );
        let secret = thread_rng().sample_iter(&Alphanumeric).take(48).map(char::from).collect::<String>();
        Self { jwt_secret: Secret::new(secret) }
    }
}

impl AuthConfig {
    pub fn new<S: Into<String>>(secret: S) -> Self {
        Self { jwt_secret: Secret::new(secret.into()) }
    }

    pub fn from_env_or_default() -> Self {
        match env_non_empty("LVQ_JWT_SECRET") {
            Some(secret) => Self::new(secret),
            None => Self::default(),
        }
    }
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// The part of the configuration that request handlers need. It holds no secrets, so it can be passed around freely.
#[derive(Clone, Copy, Debug, Default)]
pub struct ServerOptions {
    /// If true, the X-Forwarded-For header is used to determine the client's IP address, rather than the connection's
    /// remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the `for=` field of the Forwarded header is used to determine the client's IP address.
    pub use_forwarded: bool,
}
