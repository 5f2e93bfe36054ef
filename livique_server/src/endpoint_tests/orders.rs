use actix_web::{http::StatusCode, web, web::ServiceConfig};
use livique_engine::{events::EventProducers, traits::StoreError, CartApi, OrderFlowApi, SqliteDatabase};
use serde_json::{json, Value};

use super::{
    helpers::{
        admin_token,
        checkout_body,
        get,
        jwt,
        order_flow_options,
        parse,
        post,
        put,
        send,
        tear_down,
        test_db,
        user_token,
    },
    mocks::MockOrderManager,
};
use crate::routes::{
    AllOrdersRoute,
    CheckoutRoute,
    MyCartRoute,
    MyOrdersRoute,
    OrderByIdRoute,
    OrdersForUserRoute,
    UpdateCartRoute,
};

fn configure(db: SqliteDatabase) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let orders_api = OrderFlowApi::new(db.clone(), EventProducers::default(), order_flow_options());
        cfg.app_data(web::Data::new(orders_api)).app_data(web::Data::new(CartApi::new(db))).service(
            web::scope("/api")
                .wrap(jwt())
                .service(CheckoutRoute::<SqliteDatabase>::new())
                .service(MyOrdersRoute::<SqliteDatabase>::new())
                .service(AllOrdersRoute::<SqliteDatabase>::new())
                .service(OrdersForUserRoute::<SqliteDatabase>::new())
                .service(OrderByIdRoute::<SqliteDatabase>::new())
                .service(MyCartRoute::<SqliteDatabase>::new())
                .service(UpdateCartRoute::<SqliteDatabase>::new()),
        );
    }
}

async fn place_order(db: &SqliteDatabase, user: &str) -> String {
    let token = user_token(user);
    let (status, body) = send(post("/api/orders", Some(&token), &checkout_body()), configure(db.clone())).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    parse(&body)["id"].as_str().expect("order id").to_string()
}

#[actix_web::test]
async fn cod_checkout_creates_a_confirmed_order() {
    let db = test_db().await;
    let token = user_token("u1");
    let (status, body) = send(post("/api/orders", Some(&token), &checkout_body()), configure(db.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    let order = parse(&body);
    assert!(order["id"].as_str().is_some_and(|id| !id.is_empty()));
    assert_eq!(order["user"], "u1");
    assert_eq!(order["subtotal"], 1000);
    assert_eq!(order["deliveryCharges"], 50);
    assert_eq!(order["total"], 1050);
    assert_eq!(order["paymentMethod"], "COD");
    assert_eq!(order["paymentStatus"], "Pending");
    assert_eq!(order["status"], "Confirmed");
    assert_eq!(order["trackingId"], Value::Null);
    assert_eq!(order["contact"]["email"], "u1@example.in");
    tear_down(db).await;
}

#[actix_web::test]
async fn client_totals_are_recomputed() {
    let db = test_db().await;
    let token = user_token("u1");
    let mut body = checkout_body();
    body["subtotal"] = json!(1);
    body["total"] = json!(2);
    let (status, body) = send(post("/api/orders", Some(&token), &body), configure(db.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    let order = parse(&body);
    assert_eq!(order["subtotal"], 1000);
    assert_eq!(order["total"], 1050);
    tear_down(db).await;
}

#[actix_web::test]
async fn checkout_needs_a_token() {
    let db = test_db().await;
    let (status, body) = send(post("/api/orders", None, &checkout_body()), configure(db.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(parse(&body)["message"].as_str().is_some_and(|m| m.contains("No bearer token")), "{body}");

    let (status, _) = send(post("/api/orders", Some("not.a.jwt"), &checkout_body()), configure(db.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    tear_down(db).await;
}

#[actix_web::test]
async fn checkout_rejects_bad_input() {
    let db = test_db().await;
    let token = user_token("u1");
    let empty = json!({ "items": [], "address": checkout_body()["address"] });
    let (status, body) = send(post("/api/orders", Some(&token), &empty), configure(db.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(parse(&body), json!({ "message": "No order items" }));

    let mut no_address = checkout_body();
    no_address["address"] = Value::Null;
    let (status, body) = send(post("/api/orders", Some(&token), &no_address), configure(db.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(parse(&body)["message"], "A shipping address is required");

    let (status, body) = send(post("/api/orders", Some(&token), &json!("not an order")), configure(db.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(parse(&body)["message"].as_str().is_some_and(|m| m.starts_with("Could not read request body")));

    let (status, body) = send(get("/api/orders", Some(&token)), configure(db.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body), json!([]));
    tear_down(db).await;
}

#[actix_web::test]
async fn oversized_quantities_are_rejected() {
    let db = test_db().await;
    let token = user_token("u1");
    let mut body = checkout_body();
    body["items"][0]["quantity"] = json!(i64::MAX / 10);
    let (status, body) = send(post("/api/orders", Some(&token), &body), configure(db.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(parse(&body), json!({ "message": "The order total is too large" }));

    let (_, body) = send(get("/api/orders", Some(&token)), configure(db.clone())).await;
    assert_eq!(parse(&body), json!([]));
    tear_down(db).await;
}

#[actix_web::test]
async fn checkout_storage_failure_is_a_500() {
    let mut orders = MockOrderManager::new();
    orders.expect_process_new_order().returning(|_, _| Err(StoreError::DatabaseError("disk I/O error".into())));
    let configure = move |cfg: &mut ServiceConfig| {
        let api = OrderFlowApi::new(orders, EventProducers::default(), order_flow_options());
        cfg.app_data(web::Data::new(api))
            .service(web::scope("/api").wrap(jwt()).service(CheckoutRoute::<MockOrderManager>::new()));
    };
    let token = user_token("u1");
    let (status, body) = send(post("/api/orders", Some(&token), &checkout_body()), configure).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(parse(&body), json!({ "message": "Could not save the order. disk I/O error" }));
}

#[actix_web::test]
async fn users_only_see_their_own_orders() {
    let db = test_db().await;
    place_order(&db, "u1").await;
    place_order(&db, "u1").await;
    let other = place_order(&db, "u2").await;

    let token = user_token("u1");
    let (status, body) = send(get("/api/orders", Some(&token)), configure(db.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let orders = parse(&body);
    let orders = orders.as_array().expect("a list of orders");
    assert_eq!(orders.len(), 2);
    assert!(orders.iter().all(|o| o["user"] == "u1"));

    let (status, body) = send(get(&format!("/api/order/{other}"), Some(&token)), configure(db.clone())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(parse(&body)["message"].as_str().is_some_and(|m| m.contains(&other)));

    let owner = user_token("u2");
    let (status, body) = send(get(&format!("/api/order/{other}"), Some(&owner)), configure(db.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body)["id"], other.as_str());
    tear_down(db).await;
}

#[actix_web::test]
async fn admin_order_queries() {
    let db = test_db().await;
    let first = place_order(&db, "u1").await;
    place_order(&db, "u2").await;
    let last = place_order(&db, "u2").await;

    let token = user_token("u1");
    let (status, _) = send(get("/api/orders/all", Some(&token)), configure(db.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(get("/api/orders/user/u2", Some(&token)), configure(db.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = admin_token();
    let (status, body) = send(get("/api/orders/all", Some(&admin)), configure(db.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let all = parse(&body);
    let all = all.as_array().expect("a list of orders");
    assert_eq!(all.len(), 3);
    assert_eq!(all[0]["id"], last.as_str());
    assert_eq!(all[2]["id"], first.as_str());

    let (status, body) = send(get("/api/orders/user/u2", Some(&admin)), configure(db.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body).as_array().map(Vec::len), Some(2));

    let (status, body) = send(get(&format!("/api/order/{first}"), Some(&admin)), configure(db.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body)["user"], "u1");

    let (status, _) = send(get("/api/order/LVQ-missing", Some(&admin)), configure(db.clone())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    tear_down(db).await;
}

#[actix_web::test]
async fn cart_round_trip_and_checkout_clears_it() {
    let db = test_db().await;
    let token = user_token("u1");
    let cart = json!({ "items": [{ "productId": "p1", "quantity": 2 }, { "productId": "p9", "quantity": 1 }] });
    let (status, body) = send(put("/api/cart", Some(&token), &cart), configure(db.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body), cart);

    let (status, body) = send(get("/api/cart", Some(&token)), configure(db.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body), cart);

    let (_, body) = send(get("/api/cart", Some(&user_token("u2"))), configure(db.clone())).await;
    assert_eq!(parse(&body), json!({ "items": [] }));

    let bad = json!({ "items": [{ "productId": "p1", "quantity": 0 }] });
    let (status, _) = send(put("/api/cart", Some(&token), &bad), configure(db.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    place_order(&db, "u1").await;
    let (_, body) = send(get("/api/cart", Some(&token)), configure(db.clone())).await;
    assert_eq!(parse(&body), json!({ "items": [] }));
    tear_down(db).await;
}
