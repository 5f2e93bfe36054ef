use std::time::Duration;

use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use livique_common::Secret;
use livique_engine::{
    db_types::{OrderId, PaymentStatus},
    events::{EventHandlers, EventHooks, EventProducers},
    helpers::calculate_webhook_signature,
    traits::{OrderManagement, StoreError},
    OrderFlowApi,
    SqliteDatabase,
};
use serde_json::json;
use tokio::sync::mpsc;

use super::{
    helpers::{
        admin_token,
        jwt,
        order_flow_options,
        parse,
        post,
        send,
        signed_payment,
        tear_down,
        test_db,
        user_token,
        verification_body,
        WEBHOOK_SECRET,
    },
    mocks::MockOrderManager,
};
use crate::{
    config::ServerOptions,
    routes::{PaymentWebhookRoute, VerifyPaymentRoute, WEBHOOK_SIGNATURE_HEADER},
};

fn configure(db: SqliteDatabase) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let orders_api = OrderFlowApi::new(db, EventProducers::default(), order_flow_options());
        cfg.app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(ServerOptions::default()))
            .service(PaymentWebhookRoute::<SqliteDatabase>::new())
            .service(web::scope("/api").wrap(jwt()).service(VerifyPaymentRoute::<SqliteDatabase>::new()));
    }
}

#[actix_web::test]
async fn genuine_payment_creates_a_paid_order() {
    let db = test_db().await;
    let token = user_token("u1");
    let body = verification_body(&signed_payment("order_Lq1", "pay_Lq1"));
    let (status, body) = send(post("/api/payment/verify", Some(&token), &body), configure(db.clone())).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let response = parse(&body);
    assert_eq!(response["success"], true);
    let order_id = response["orderId"].as_str().expect("an order id");

    let order = db.fetch_order_by_order_id(&OrderId::from(order_id)).await.unwrap().expect("order was stored");
    assert_eq!(order.user_id.as_str(), "u1");
    assert_eq!(order.payment_status, PaymentStatus::Paid);
    assert_eq!(order.gateway_order_id.as_deref(), Some("order_Lq1"));
    assert_eq!(order.gateway_payment_id.as_deref(), Some("pay_Lq1"));
    assert_eq!(order.total.paise(), 105_000);
    tear_down(db).await;
}

#[actix_web::test]
async fn tampered_signature_is_rejected_and_nothing_is_stored() {
    let db = test_db().await;
    let token = user_token("u1");
    let mut payment = signed_payment("order_Lq2", "pay_Lq2");
    payment.gateway_payment_id = "pay_someone_else".into();
    let (status, body) =
        send(post("/api/payment/verify", Some(&token), &verification_body(&payment)), configure(db.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(parse(&body), json!({ "success": false, "message": "Invalid signature" }));
    assert!(db.fetch_all_orders().await.unwrap().is_empty());
    tear_down(db).await;
}

#[actix_web::test]
async fn payment_details_are_required() {
    let db = test_db().await;
    let token = user_token("u1");
    let mut body = verification_body(&signed_payment("order_Lq3", "pay_Lq3"));
    body["gatewaySignature"] = json!("");
    let (status, body) = send(post("/api/payment/verify", Some(&token), &body), configure(db.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(parse(&body), json!({ "success": false, "message": "Payment details are required" }));

    let mut body = verification_body(&signed_payment("order_Lq3", "pay_Lq3"));
    body["items"] = json!([]);
    let (status, body) = send(post("/api/payment/verify", Some(&token), &body), configure(db.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(parse(&body), json!({ "success": false, "message": "No order items" }));
    assert!(db.fetch_all_orders().await.unwrap().is_empty());
    tear_down(db).await;
}

#[actix_web::test]
async fn only_admins_verify_for_other_users() {
    let db = test_db().await;
    let mut body = verification_body(&signed_payment("order_Lq4", "pay_Lq4"));
    body["userId"] = json!("u2");
    let (status, _) = send(post("/api/payment/verify", Some(&user_token("u1")), &body), configure(db.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(db.fetch_all_orders().await.unwrap().is_empty());

    let (status, response) = send(post("/api/payment/verify", Some(&admin_token()), &body), configure(db.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let order_id = OrderId::from(parse(&response)["orderId"].as_str().expect("an order id"));
    let order = db.fetch_order_by_order_id(&order_id).await.unwrap().expect("order was stored");
    assert_eq!(order.user_id.as_str(), "u2");
    tear_down(db).await;
}

#[actix_web::test]
async fn storage_failure_after_payment_raises_an_alert() {
    let (tx, mut rx) = mpsc::channel(4);
    let mut hooks = EventHooks::default();
    hooks.on_reconciliation_required(move |ev| {
        let tx = tx.clone();
        Box::pin(async move {
            let _ = tx.send(ev).await;
        })
    });
    let handlers = EventHandlers::new(10, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;

    let mut orders = MockOrderManager::new();
    orders.expect_process_new_order().times(1).returning(|_, _| Err(StoreError::DatabaseError("disk I/O error".into())));
    let configure = move |cfg: &mut ServiceConfig| {
        let api = OrderFlowApi::new(orders, producers, order_flow_options());
        cfg.app_data(web::Data::new(api))
            .service(web::scope("/api").wrap(jwt()).service(VerifyPaymentRoute::<MockOrderManager>::new()));
    };
    let body = verification_body(&signed_payment("order_Lq5", "pay_Lq5"));
    let (status, body) = send(post("/api/payment/verify", Some(&user_token("u1")), &body), configure).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let response = parse(&body);
    assert_eq!(response["success"], false);
    assert_eq!(response["message"], "Payment was received but the order could not be saved");
    assert!(response["error"].as_str().is_some_and(|e| e.contains("disk I/O error")));

    let alert = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("no reconciliation alert was raised")
        .expect("alert channel closed");
    assert_eq!(alert.gateway_order_id, "order_Lq5");
    assert_eq!(alert.gateway_payment_id, "pay_Lq5");
    assert_eq!(alert.user_id.as_str(), "u1");
}

#[actix_web::test]
async fn webhooks_are_always_acknowledged() {
    let db = test_db().await;
    let payload = json!({
        "event": "payment.captured",
        "payload": { "payment": { "entity": { "id": "pay_Lq6", "order_id": "order_Lq6" } } }
    })
    .to_string();
    let signature = calculate_webhook_signature(payload.as_bytes(), &Secret::new(WEBHOOK_SECRET.to_string())).unwrap();

    let requests = [
        Some(signature.as_str()),
        Some("0000000000000000000000000000000000000000000000000000000000000000"),
        None,
    ];
    for signature in requests {
        let mut req = TestRequest::post()
            .uri("/payment/webhook")
            .insert_header(("Content-Type", "application/json"))
            .set_payload(payload.clone());
        if let Some(sig) = signature {
            req = req.insert_header((WEBHOOK_SIGNATURE_HEADER, sig));
        }
        let (status, body) = send(req, configure(db.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(parse(&body), json!({ "status": "ok" }));
    }
    assert!(db.fetch_all_orders().await.unwrap().is_empty());
    tear_down(db).await;
}
