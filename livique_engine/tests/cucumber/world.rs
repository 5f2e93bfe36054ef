use cucumber::World;
use livique_common::Secret;
use livique_engine::{
    db_types::{Order, UserId},
    events::EventProducers,
    OrderFlowApi,
    OrderFlowError,
    OrderFlowOptions,
    SqliteDatabase,
};
use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};

pub const KEY_SECRET: &str = "cucumber_key_secret";

#[derive(Default, Debug, World)]
pub struct LiviqueWorld {
    pub system: Option<OrderSystem>,
    pub user: Option<UserId>,
    pub last_order: Option<Order>,
    pub last_error: Option<OrderFlowError>,
}

#[derive(Debug)]
pub struct OrderSystem {
    pub db_path: String,
    pub api: OrderFlowApi<SqliteDatabase>,
}

impl LiviqueWorld {
    pub fn api(&self) -> &OrderFlowApi<SqliteDatabase> {
        &self.system.as_ref().expect("OrderFlowApi not initialised").api
    }

    pub fn db(&self) -> &SqliteDatabase {
        self.api().db()
    }

    pub fn user(&self) -> UserId {
        self.user.clone().unwrap_or_else(|| UserId::from("cucumber"))
    }

    pub fn record(&mut self, result: Result<Order, OrderFlowError>) {
        match result {
            Ok(order) => {
                self.last_order = Some(order);
                self.last_error = None;
            },
            Err(e) => {
                debug!("🥒️ Step produced an error: {e}");
                self.last_error = Some(e);
            },
        }
    }
}

impl OrderSystem {
    pub async fn new(adjust_inventory_on_gateway: bool) -> Self {
        let url = format!("sqlite://{}/livique_cucumber_{}.db", std::env::temp_dir().display(), rand::random::<u64>());
        if let Err(e) = Sqlite::drop_database(&url).await {
            trace!("🥒️ Nothing to drop at {url}: {e}");
        }
        Sqlite::create_database(&url).await.expect("Error creating database");
        let db = SqliteDatabase::new_with_url(&url, 1).await.expect("Error creating connection to database");
        db.migrate().await.expect("Error running DB migrations");
        debug!("🥒️ Created database: {url}");
        let options = OrderFlowOptions {
            gateway_key_secret: Secret::new(KEY_SECRET.to_string()),
            gateway_webhook_secret: Secret::new(String::new()),
            gateway_adjusts_inventory: adjust_inventory_on_gateway,
        };
        let api = OrderFlowApi::new(db, EventProducers::default(), options);
        Self { db_path: url, api }
    }
}
