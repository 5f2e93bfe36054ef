#![allow(dead_code)]
use std::env;

use livique_common::{Money, Secret};
use livique_engine::{
    db_types::{
        AddressType,
        CustomerContact,
        GatewayPayment,
        NewProduct,
        OrderItem,
        PaymentMethod,
        ProductId,
        ShippingAddress,
    },
    events::EventProducers,
    helpers::calculate_payment_signature,
    order_objects::{CheckoutDraft, ClientTotals},
    traits::InventoryManagement,
    OrderFlowApi,
    OrderFlowOptions,
    SqliteDatabase,
};
use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};

pub const KEY_SECRET: &str = "rzp_test_key_secret";
pub const WEBHOOK_SECRET: &str = "rzp_test_webhook_secret";

pub fn random_db_path() -> String {
    format!("sqlite://{}/livique_engine_test_{}.db", env::temp_dir().display(), rand::random::<u64>())
}

pub async fn prepare_test_env(url: &str) -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    if let Err(e) = Sqlite::drop_database(url).await {
        trace!("🚀️ Nothing to drop at {url}: {e}");
    }
    Sqlite::create_database(url).await.expect("Error creating database");
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating connection to database");
    db.migrate().await.expect("Error running DB migrations");
    debug!("🚀️ Test database ready at {url}");
    db
}

pub async fn tear_down(db: SqliteDatabase) {
    let url = db.url().to_string();
    db.pool().close().await;
    if let Err(e) = Sqlite::drop_database(&url).await {
        warn!("🚀️ Could not remove {url}: {e}");
    }
}

pub fn options() -> OrderFlowOptions {
    OrderFlowOptions {
        gateway_key_secret: Secret::new(KEY_SECRET.to_string()),
        gateway_webhook_secret: Secret::new(WEBHOOK_SECRET.to_string()),
        gateway_adjusts_inventory: false,
    }
}

pub async fn setup() -> OrderFlowApi<SqliteDatabase> {
    setup_with(EventProducers::default(), options()).await
}

pub async fn setup_with(producers: EventProducers, options: OrderFlowOptions) -> OrderFlowApi<SqliteDatabase> {
    let db = prepare_test_env(&random_db_path()).await;
    OrderFlowApi::new(db, producers, options)
}

pub fn address() -> ShippingAddress {
    ShippingAddress {
        full_name: "Asha Rao".into(),
        mobile: "9876543210".into(),
        street: "12 MG Road".into(),
        city: "Bengaluru".into(),
        state: "Karnataka".into(),
        zip_code: "560001".into(),
        address_type: AddressType::Home,
    }
}

pub fn item(id: &str, price: i64, quantity: i64, delivery: i64) -> OrderItem {
    OrderItem {
        product_id: ProductId::from(id),
        name: format!("Product {id}"),
        unit_price: Money::from_rupees(price),
        quantity,
        image_ref: Some(format!("/img/{id}.jpg")),
        delivery_label: Some("Standard".into()),
        delivery_charge: Money::from_rupees(delivery),
    }
}

pub fn draft(items: Vec<OrderItem>, method: PaymentMethod) -> CheckoutDraft {
    CheckoutDraft {
        items,
        address: Some(address()),
        payment_method: Some(method),
        payment_status: None,
        client_totals: ClientTotals::default(),
    }
}

pub fn contact() -> CustomerContact {
    CustomerContact::new(Some("Asha Rao".into()), Some("asha@example.in".into()))
}

pub fn signed_payment(gateway_order_id: &str, gateway_payment_id: &str) -> GatewayPayment {
    let secret = Secret::new(KEY_SECRET.to_string());
    let gateway_signature =
        calculate_payment_signature(gateway_order_id, gateway_payment_id, &secret).expect("secret is set");
    GatewayPayment {
        gateway_order_id: gateway_order_id.to_string(),
        gateway_payment_id: gateway_payment_id.to_string(),
        gateway_signature,
    }
}

pub async fn seed_product(db: &SqliteDatabase, id: &str, quantity: i64) {
    db.insert_product(NewProduct::new(ProductId::from(id), format!("Product {id}"), quantity))
        .await
        .expect("Error seeding product");
}
