use std::{sync::Arc, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use livique_engine::{
    events::{EventHandlers, EventProducers},
    CartApi,
    InventoryApi,
    OrderFlowApi,
    OtpApi,
    PushSubscriptionApi,
    SqliteDatabase,
};
use livique_notify::{MailClient, NotificationDispatcher, OtpMailer, PushClient};
use log::*;

use crate::{
    auth::TokenVerifier,
    config::ServerConfig,
    errors::ServerError,
    middleware::JwtMiddlewareFactory,
    routes::{
        health,
        AllOrdersRoute,
        CheckoutRoute,
        DecreaseStockRoute,
        MyCartRoute,
        MyOrdersRoute,
        OrderByIdRoute,
        OrdersForUserRoute,
        OtpRequestRoute,
        OtpVerifyRoute,
        PaymentWebhookRoute,
        PushSubscribeRoute,
        UpdateCartRoute,
        UpdateTrackingRoute,
        VerifyPaymentRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, config.max_db_connections)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let mailer = MailClient::new(config.notify.mail.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let push = PushClient::new(config.notify.push.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let dispatcher = Arc::new(NotificationDispatcher::new(
        mailer.clone(),
        push,
        db.clone(),
        config.notify.mail.operator_email.clone(),
        config.notify.timeout,
    ));
    let handlers = EventHandlers::new(config.event_buffer_size, dispatcher.hooks());
    let producers = handlers.producers();
    handlers.start_handlers().await;
    info!("📬️ Notification handlers are running");
    let srv = create_server_instance(config, db, producers, mailer)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Malformed JSON bodies get the same `{message}` error shape as every other failure.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| ServerError::InvalidRequestBody(err.to_string()).into())
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
    mailer: MailClient,
) -> Result<Server, ServerError> {
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone(), producers.clone(), config.order_flow.clone());
        let inventory_api = InventoryApi::new(db.clone());
        let cart_api = CartApi::new(db.clone());
        let push_api = PushSubscriptionApi::new(db.clone());
        let otp_api = OtpApi::new(db.clone(), config.otp_ttl);
        let otp_mailer = OtpMailer::new(mailer.clone(), config.notify.timeout);
        let verifier = TokenVerifier::new(&config.auth);
        // Routes that require a bearer token
        let api_scope = web::scope("/api")
            .wrap(JwtMiddlewareFactory::new(verifier))
            .service(CheckoutRoute::<SqliteDatabase>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(AllOrdersRoute::<SqliteDatabase>::new())
            .service(OrdersForUserRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(UpdateTrackingRoute::<SqliteDatabase>::new())
            .service(VerifyPaymentRoute::<SqliteDatabase>::new())
            .service(DecreaseStockRoute::<SqliteDatabase>::new())
            .service(MyCartRoute::<SqliteDatabase>::new())
            .service(UpdateCartRoute::<SqliteDatabase>::new())
            .service(PushSubscribeRoute::<SqliteDatabase>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("lvq::access_log"))
            .app_data(json_config())
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(inventory_api))
            .app_data(web::Data::new(cart_api))
            .app_data(web::Data::new(push_api))
            .app_data(web::Data::new(otp_api))
            .app_data(web::Data::new(otp_mailer))
            .app_data(web::Data::new(config.options))
            .service(health)
            .service(PaymentWebhookRoute::<SqliteDatabase>::new())
            .service(OtpRequestRoute::<SqliteDatabase, MailClient>::new())
            .service(OtpVerifyRoute::<SqliteDatabase>::new())
            .service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
