//! Request handler definitions
//!
//! Define each route and its handler here. Handlers only translate between HTTP and the engine APIs. Anything more
//! than that belongs in the engine.
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Any I/O (database, mail relay) must be awaited, never blocked on.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder, ResponseError};
use livique_engine::{
    db_types::{OrderId, PaymentMethod, ProductId, UserId},
    order_objects::WebhookOutcome,
    traits::{CartManagement, InventoryManagement, OrderManagement, OtpStore, PushSubscriptionManagement},
    CartApi,
    InventoryApi,
    OrderFlowApi,
    OrderFlowError,
    OtpApi,
    PushSubscriptionApi,
};
use livique_notify::{Mailer, OtpMailer};
use log::*;
use serde_json::json;

use crate::{
    auth::{JwtClaims, Role},
    config::ServerOptions,
    data_objects::{
        CartResponse,
        CartUpdateRequest,
        CheckoutRequest,
        JsonResponse,
        OtpRequest,
        OtpVerifyRequest,
        PaymentVerificationRequest,
        PaymentVerificationResponse,
        PushSubscriptionRequest,
        QuantityRequest,
        TrackingUpdateRequest,
    },
    errors::{AuthError, ServerError},
    helpers::get_remote_ip,
};

/// Header carrying the gateway's HMAC over the raw webhook body.
pub const WEBHOOK_SIGNATURE_HEADER: &str = "X-Razorpay-Signature";

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ where requires [$($roles:expr),*])  => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds)++ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Checkout  ----------------------------------------------------
route!(checkout => Post "/orders" impl OrderManagement where requires [Role::User]);
/// Cash-on-delivery checkout for the calling user.
///
/// Returns `201 Created` with the stored order. Invalid input is a 400 with a `{message}` body, and a storage failure
/// is a 500 with the same shape.
pub async fn checkout<B: OrderManagement>(
    claims: JwtClaims,
    body: web::Json<CheckoutRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let mut request = body.into_inner();
    debug!("💻️ POST checkout for {} with {} items", claims.sub, request.items.len());
    let contact = claims.contact(request.user_name.take(), request.user_email.take());
    let draft = request.into_draft(PaymentMethod::CashOnDelivery);
    let order = api.process_cod_order(claims.user_id(), contact, draft).await?;
    Ok(HttpResponse::Created().json(order))
}

//----------------------------------------------   Payments  ----------------------------------------------------
route!(verify_payment => Post "/payment/verify" impl OrderManagement where requires [Role::User]);
/// The storefront relays the gateway's checkout callback here, together with the cart that was paid for.
///
/// The response is always `{success, ...}`:
/// * `200 {success: true, orderId}` once the order is stored.
/// * `400 {success: false, message: "Invalid signature"}` if the gateway signature does not check out. Nothing is
///   written.
/// * `500 {success: false, message, error}` if the payment was genuine but the order could not be stored. An operator
///   alert goes out in this case, since the customer has been charged.
pub async fn verify_payment<B: OrderManagement>(
    claims: JwtClaims,
    body: web::Json<PaymentVerificationRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner();
    let user_id = match &request.user_id {
        Some(id) if !id.is_empty() && !claims.can_access(id) => {
            warn!("💻️ {} tried to verify a payment on behalf of {id}", claims.sub);
            return Err(AuthError::InsufficientPermissions("Cannot verify payments for another user".into()).into());
        },
        Some(id) if !id.is_empty() => id.clone(),
        _ => claims.sub.clone(),
    };
    let (payment, mut checkout) = match request.into_parts() {
        Ok(parts) => parts,
        Err(e) => return Ok(verification_failure(e)),
    };
    debug!("💻️ POST verify_payment {} for {user_id}", payment.gateway_payment_id);
    let contact = claims.contact(checkout.user_name.take(), checkout.user_email.take());
    let draft = checkout.into_draft(PaymentMethod::Gateway);
    match api.process_gateway_payment(&user_id, contact, payment, draft).await {
        Ok(order) => Ok(HttpResponse::Ok().json(PaymentVerificationResponse::success(order.order_id))),
        Err(OrderFlowError::PersistenceError(e)) => Ok(HttpResponse::InternalServerError().json(
            PaymentVerificationResponse::failure("Payment was received but the order could not be saved").with_error(e),
        )),
        Err(e) => Ok(verification_failure(e.into())),
    }
}

fn verification_failure(e: ServerError) -> HttpResponse {
    HttpResponse::build(e.status_code()).json(PaymentVerificationResponse::failure(e.to_string()))
}

route!(payment_webhook => Post "/payment/webhook" impl OrderManagement);
/// Asynchronous gateway notifications.
///
/// The signature is checked against the raw body and the outcome is logged. Nothing is stored, and the gateway always
/// gets `{status: "ok"}` so that it does not retry.
pub async fn payment_webhook<B: OrderManagement>(
    req: HttpRequest,
    body: web::Bytes,
    api: web::Data<OrderFlowApi<B>>,
    options: web::Data<ServerOptions>,
) -> HttpResponse {
    let peer = get_remote_ip(&req, *options.get_ref()).map(|ip| ip.to_string()).unwrap_or_else(|| "unknown".into());
    let signature = req.headers().get(WEBHOOK_SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
    let outcome = api.process_payment_webhook(body.as_ref(), signature);
    match outcome {
        WebhookOutcome::Verified { .. } => debug!("💻️ Gateway webhook from {peer} accepted"),
        _ => info!("💻️ Gateway webhook from {peer} was not verified: {outcome:?}"),
    }
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(my_orders => Get "/orders" impl OrderManagement where requires [Role::User]);
pub async fn my_orders<B: OrderManagement>(
    claims: JwtClaims,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET my_orders for {}", claims.sub);
    let orders = api.orders_for_user(claims.user_id()).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(all_orders => Get "/orders/all" impl OrderManagement where requires [Role::Admin]);
pub async fn all_orders<B: OrderManagement>(api: web::Data<OrderFlowApi<B>>) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET all_orders");
    let orders = api.all_orders().await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(orders_for_user => Get "/orders/user/{user_id}" impl OrderManagement where requires [Role::Admin]);
pub async fn orders_for_user<B: OrderManagement>(
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = UserId::from(path.into_inner());
    debug!("💻️ GET orders_for_user({user_id})");
    let orders = api.orders_for_user(&user_id).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_by_id => Get "/order/{order_id}" impl OrderManagement where requires [Role::User]);
/// Users can only see their own orders. Someone else's order looks exactly like a missing one.
pub async fn order_by_id<B: OrderManagement>(
    claims: JwtClaims,
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId::from(path.into_inner());
    debug!("💻️ GET order_by_id({order_id})");
    let order = api.order_by_id(&order_id).await?.filter(|o| claims.can_access(&o.user_id));
    match order {
        Some(order) => Ok(HttpResponse::Ok().json(order)),
        None => Err(ServerError::NoRecordFound(format!("Order {order_id} was not found"))),
    }
}

route!(update_tracking => Put "/order/{order_id}/tracking" impl OrderManagement where requires [Role::Admin]);
pub async fn update_tracking<B: OrderManagement>(
    path: web::Path<String>,
    body: web::Json<TrackingUpdateRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId::from(path.into_inner());
    debug!("💻️ PUT tracking for {order_id}");
    let order = api.assign_tracking(&order_id, &body.tracking_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Inventory  ----------------------------------------------------
route!(decrease_stock => Post "/product/{id}/decrease" impl InventoryManagement where requires [Role::Admin]);
pub async fn decrease_stock<B: InventoryManagement>(
    path: web::Path<String>,
    body: web::Json<QuantityRequest>,
    api: web::Data<InventoryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product_id = ProductId::from(path.into_inner());
    debug!("💻️ POST decrease {product_id} by {}", body.quantity);
    let product = api.decrease_quantity(&product_id, body.quantity).await?;
    Ok(HttpResponse::Ok().json(product))
}

//----------------------------------------------   Cart  ----------------------------------------------------
route!(my_cart => Get "/cart" impl CartManagement where requires [Role::User]);
pub async fn my_cart<B: CartManagement>(
    claims: JwtClaims,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET cart for {}", claims.sub);
    let items = api.cart(claims.user_id()).await?;
    Ok(HttpResponse::Ok().json(CartResponse { items }))
}

route!(update_cart => Put "/cart" impl CartManagement where requires [Role::User]);
pub async fn update_cart<B: CartManagement>(
    claims: JwtClaims,
    body: web::Json<CartUpdateRequest>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ PUT cart for {} with {} lines", claims.sub, body.items.len());
    if let Some(item) = body.items.iter().find(|i| i.quantity < 1) {
        return Err(ServerError::ValidationError(format!("Quantity for {} must be at least 1", item.product_id)));
    }
    let items = api.replace_cart(claims.user_id(), &body.items).await?;
    Ok(HttpResponse::Ok().json(CartResponse { items }))
}

//----------------------------------------------   Push  ----------------------------------------------------
route!(push_subscribe => Post "/push/subscribe" impl PushSubscriptionManagement where requires [Role::Admin]);
pub async fn push_subscribe<B: PushSubscriptionManagement>(
    claims: JwtClaims,
    body: web::Json<PushSubscriptionRequest>,
    api: web::Data<PushSubscriptionApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST push subscription for {}", claims.sub);
    let subscription = api.subscribe(body.into_inner().into()).await?;
    Ok(HttpResponse::Created().json(subscription))
}

//----------------------------------------------   OTP  ----------------------------------------------------
route!(otp_request => Post "/otp/request" impl OtpStore, Mailer);
/// Emails a six digit code to the given address. Any previous code for the address stops working.
pub async fn otp_request<S: OtpStore, M: Mailer>(
    body: web::Json<OtpRequest>,
    otp: web::Data<OtpApi<S>>,
    mailer: web::Data<OtpMailer<M>>,
) -> Result<HttpResponse, ServerError> {
    if !body.email.contains('@') {
        return Err(ServerError::ValidationError("A valid email address is required".into()));
    }
    let issued = otp.issue(&body.email).await?;
    mailer.send_code(&issued.key, &issued.code, issued.expires_at).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Verification code sent",
        "expiresAt": issued.expires_at,
    })))
}

route!(otp_verify => Post "/otp/verify" impl OtpStore);
pub async fn otp_verify<S: OtpStore>(
    body: web::Json<OtpVerifyRequest>,
    otp: web::Data<OtpApi<S>>,
) -> Result<HttpResponse, ServerError> {
    otp.verify(&body.email, &body.code).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Code verified")))
}
