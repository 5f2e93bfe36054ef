use std::time::Duration;

use actix_web::{http::StatusCode, web, web::ServiceConfig};
use livique_engine::{
    db_types::{NewProduct, ProductId},
    traits::{InventoryManagement, PushSubscriptionManagement},
    InventoryApi,
    MemoryOtpStore,
    OtpApi,
    PushSubscriptionApi,
    SqliteDatabase,
};
use livique_notify::OtpMailer;
use serde_json::json;

use super::{
    helpers::{admin_token, get, jwt, parse, post, send, tear_down, test_db, user_token},
    mocks::CapturingMailer,
};
use crate::routes::{health, DecreaseStockRoute, OtpRequestRoute, OtpVerifyRoute, PushSubscribeRoute};

fn configure(db: SqliteDatabase) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(InventoryApi::new(db.clone())))
            .app_data(web::Data::new(PushSubscriptionApi::new(db)))
            .service(
                web::scope("/api")
                    .wrap(jwt())
                    .service(DecreaseStockRoute::<SqliteDatabase>::new())
                    .service(PushSubscribeRoute::<SqliteDatabase>::new()),
            );
    }
}

fn configure_otp(store: MemoryOtpStore, mailer: CapturingMailer) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(OtpApi::new(store, chrono::Duration::minutes(10))))
            .app_data(web::Data::new(OtpMailer::new(mailer, Duration::from_secs(2))))
            .service(OtpRequestRoute::<MemoryOtpStore, CapturingMailer>::new())
            .service(OtpVerifyRoute::<MemoryOtpStore>::new());
    }
}

#[actix_web::test]
async fn health_check() {
    let (status, body) = send(get("/health", None), |cfg| {
        cfg.service(health);
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "👍️\n");
}

//----------------------------------------------   Inventory  ----------------------------------------------------

#[actix_web::test]
async fn decrease_stock() {
    let db = test_db().await;
    db.insert_product(NewProduct::new(ProductId::from("p1"), "Jute rug", 5)).await.unwrap();
    let admin = admin_token();

    let (status, body) =
        send(post("/api/product/p1/decrease", Some(&admin), &json!({ "quantity": 2 })), configure(db.clone())).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let product = parse(&body);
    assert_eq!(product["id"], "p1");
    assert_eq!(product["quantity"], 3);
    assert_eq!(product["inStock"], true);

    let (status, body) =
        send(post("/api/product/p1/decrease", Some(&admin), &json!({ "quantity": 10 })), configure(db.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(parse(&body)["message"].as_str().is_some_and(|m| m.starts_with("Insufficient stock for p1")), "{body}");

    let (status, _) =
        send(post("/api/product/p1/decrease", Some(&admin), &json!({ "quantity": 0 })), configure(db.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) =
        send(post("/api/product/p1/decrease", Some(&admin), &json!({ "quantity": 3 })), configure(db.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let product = parse(&body);
    assert_eq!(product["quantity"], 0);
    assert_eq!(product["inStock"], false);

    let product = db.fetch_product(&ProductId::from("p1")).await.unwrap().expect("product exists");
    assert_eq!(product.quantity, 0);
    tear_down(db).await;
}

#[actix_web::test]
async fn decrease_stock_errors() {
    let db = test_db().await;
    db.insert_product(NewProduct::new(ProductId::from("p1"), "Jute rug", 5)).await.unwrap();
    let body = json!({ "quantity": 1 });

    let (status, _) = send(post("/api/product/p404/decrease", Some(&admin_token()), &body), configure(db.clone())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(post("/api/product/p1/decrease", Some(&user_token("u1")), &body), configure(db.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let product = db.fetch_product(&ProductId::from("p1")).await.unwrap().expect("product exists");
    assert_eq!(product.quantity, 5);
    tear_down(db).await;
}

//----------------------------------------------   Push  ----------------------------------------------------

#[actix_web::test]
async fn admins_register_for_push() {
    let db = test_db().await;
    let sub = json!({ "endpoint": "https://push.example.com/send/abc", "keys": { "p256dh": "BPk3", "auth": "aGVsbG8" } });

    let (status, _) = send(post("/api/push/subscribe", Some(&user_token("u1")), &sub), configure(db.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(post("/api/push/subscribe", Some(&admin_token()), &sub), configure(db.clone())).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(parse(&body)["endpoint"], "https://push.example.com/send/abc");

    let insecure = json!({ "endpoint": "http://push.example.com/send/xyz", "keys": { "p256dh": "BPk3", "auth": "aGVsbG8" } });
    let (status, body) = send(post("/api/push/subscribe", Some(&admin_token()), &insecure), configure(db.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(parse(&body), json!({ "message": "Push endpoints must use https" }));

    let subs = db.fetch_subscriptions().await.unwrap();
    assert_eq!(subs.len(), 1);
    assert_eq!(subs[0].p256dh, "BPk3");
    tear_down(db).await;
}

//----------------------------------------------   OTP  ----------------------------------------------------

fn code_in(text: &str) -> String {
    text.split(|c: char| !c.is_ascii_digit())
        .find(|w| w.len() == 6)
        .map(String::from)
        .unwrap_or_else(|| panic!("No code in {text}"))
}

#[actix_web::test]
async fn otp_request_and_verify() {
    let store = MemoryOtpStore::new();
    let mailer = CapturingMailer::default();
    let email = "asha@example.in";

    let (status, body) =
        send(post("/otp/request", None, &json!({ "email": email })), configure_otp(store.clone(), mailer.clone())).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let response = parse(&body);
    assert_eq!(response["success"], true);
    assert!(response["expiresAt"].is_string());

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, email);
    let code = code_in(&sent[0].text);
    let wrong = if code == "111111" { "222222" } else { "111111" };

    let (status, body) = send(
        post("/otp/verify", None, &json!({ "email": email, "code": wrong })),
        configure_otp(store.clone(), mailer.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(parse(&body), json!({ "message": "The code is incorrect or has expired" }));

    let (status, body) = send(
        post("/otp/verify", None, &json!({ "email": email, "code": code })),
        configure_otp(store.clone(), mailer.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body), json!({ "success": true, "message": "Code verified" }));

    // Codes are single use
    let (status, _) = send(
        post("/otp/verify", None, &json!({ "email": email, "code": code })),
        configure_otp(store.clone(), mailer.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn otp_request_failures() {
    let store = MemoryOtpStore::new();
    let (status, _) = send(
        post("/otp/request", None, &json!({ "email": "not-an-email" })),
        configure_otp(store.clone(), CapturingMailer::default()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        post("/otp/request", None, &json!({ "email": "asha@example.in" })),
        configure_otp(store.clone(), CapturingMailer::failing()),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(parse(&body)["message"].as_str().is_some_and(|m| m.starts_with("Could not deliver the message")), "{body}");
}
