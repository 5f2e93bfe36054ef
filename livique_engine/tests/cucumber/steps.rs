use cucumber::{gherkin::Step, then, when};
use livique_common::{Money, Secret};
use livique_engine::{
    db_types::{
        AddressType,
        CustomerContact,
        GatewayPayment,
        OrderItem,
        PaymentMethod,
        PaymentStatus,
        ProductId,
        ShippingAddress,
    },
    helpers::calculate_payment_signature,
    order_objects::{CheckoutDraft, ClientTotals},
    traits::InventoryManagement,
    OrderFlowError,
};

use crate::cucumber::{world::KEY_SECRET, LiviqueWorld};

fn address() -> ShippingAddress {
    ShippingAddress {
        full_name: "Ravi Kumar".into(),
        mobile: "+919812345678".into(),
        street: "4 Park Street".into(),
        city: "Kolkata".into(),
        state: "West Bengal".into(),
        zip_code: "700016".into(),
        address_type: AddressType::Work,
    }
}

/// Reads a `| id | price | quantity | delivery |` table into order items.
fn items_from_table(step: &Step) -> Vec<OrderItem> {
    let Some(table) = step.table.as_ref() else {
        return vec![];
    };
    table
        .rows
        .iter()
        .skip(1)
        .map(|row| OrderItem {
            product_id: ProductId::from(row[0].as_str()),
            name: format!("Product {}", row[0]),
            unit_price: Money::from_rupees(row[1].parse().expect("price")),
            quantity: row[2].parse().expect("quantity"),
            image_ref: None,
            delivery_label: None,
            delivery_charge: Money::from_rupees(row[3].parse().expect("delivery")),
        })
        .collect()
}

fn draft(items: Vec<OrderItem>, method: PaymentMethod) -> CheckoutDraft {
    CheckoutDraft {
        items,
        address: Some(address()),
        payment_method: Some(method),
        payment_status: None,
        client_totals: ClientTotals::default(),
    }
}

fn contact() -> CustomerContact {
    CustomerContact::new(Some("Ravi Kumar".into()), Some("ravi@example.in".into()))
}

#[when("I check out with cash on delivery")]
async fn cod_checkout(world: &mut LiviqueWorld, step: &Step) {
    let items = items_from_table(step);
    let user = world.user();
    let result = world.api().process_cod_order(&user, contact(), draft(items, PaymentMethod::CashOnDelivery)).await;
    world.record(result);
}

#[when(expr = "the gateway confirms payment {word} for gateway order {word}")]
async fn gateway_checkout(world: &mut LiviqueWorld, step: &Step, payment_id: String, gateway_order_id: String) {
    let secret = Secret::new(KEY_SECRET.to_string());
    let signature = calculate_payment_signature(&gateway_order_id, &payment_id, &secret).expect("secret");
    gateway_callback(world, step, payment_id, gateway_order_id, signature).await;
}

#[when(expr = "a forged callback claims payment {word} for gateway order {word}")]
async fn forged_checkout(world: &mut LiviqueWorld, step: &Step, payment_id: String, gateway_order_id: String) {
    let secret = Secret::new("not-the-real-secret".to_string());
    let signature = calculate_payment_signature(&gateway_order_id, &payment_id, &secret).expect("secret");
    gateway_callback(world, step, payment_id, gateway_order_id, signature).await;
}

async fn gateway_callback(
    world: &mut LiviqueWorld,
    step: &Step,
    gateway_payment_id: String,
    gateway_order_id: String,
    gateway_signature: String,
) {
    let items = items_from_table(step);
    let user = world.user();
    let payment = GatewayPayment { gateway_order_id, gateway_payment_id, gateway_signature };
    let result =
        world.api().process_gateway_payment(&user, contact(), payment, draft(items, PaymentMethod::Gateway)).await;
    world.record(result);
}

#[when(expr = "the admin ships the last order with tracking id {string}")]
async fn ship_last_order(world: &mut LiviqueWorld, tracking_id: String) {
    let order_id = world.last_order.as_ref().expect("no order has been placed").order_id.clone();
    let result = world.api().assign_tracking(&order_id, &tracking_id).await;
    world.record(result);
}

#[then(expr = "the order totals are {int} + {int} = {int}")]
async fn check_totals(world: &mut LiviqueWorld, subtotal: i64, delivery: i64, total: i64) {
    let order = world.last_order.as_ref().expect("no order");
    assert_eq!(order.subtotal, Money::from_rupees(subtotal));
    assert_eq!(order.delivery_charges, Money::from_rupees(delivery));
    assert_eq!(order.total, Money::from_rupees(total));
}

#[then(expr = "the order payment status is {word}")]
async fn check_payment_status(world: &mut LiviqueWorld, status: String) {
    let order = world.last_order.as_ref().expect("no order");
    let expected: PaymentStatus = status.parse().expect("payment status");
    assert_eq!(order.payment_status, expected);
}

#[then(expr = "the order status is {word}")]
async fn check_status(world: &mut LiviqueWorld, status: String) {
    let order = world.last_order.as_ref().expect("no order");
    let stored = world.api().order_by_id(&order.order_id).await.expect("lookup").expect("order not stored");
    assert_eq!(stored.status, status);
}

#[then(expr = "the request fails with {string}")]
async fn check_error(world: &mut LiviqueWorld, message: String) {
    let err = world.last_error.as_ref().expect("expected an error");
    assert_eq!(err.to_string(), message);
}

#[then("the request is rejected as invalid")]
async fn check_validation_error(world: &mut LiviqueWorld) {
    assert!(matches!(world.last_error, Some(OrderFlowError::ValidationError(_))));
}

#[then(expr = "there are {int} orders for me")]
async fn count_orders(world: &mut LiviqueWorld, n: usize) {
    let user = world.user();
    let orders = world.api().orders_for_user(&user).await.expect("orders");
    assert_eq!(orders.len(), n);
}

#[then(expr = "product {word} has {int} units in stock and is {word}")]
async fn check_stock(world: &mut LiviqueWorld, id: String, quantity: i64, state: String) {
    let product = world.db().fetch_product(&ProductId::from(id.as_str())).await.expect("fetch").expect("no product");
    assert_eq!(product.quantity, quantity);
    let in_stock = match state.as_str() {
        "available" => true,
        "sold-out" => false,
        s => panic!("unknown stock state {s}"),
    };
    assert_eq!(product.in_stock, in_stock);
}

#[then(expr = "the tracking id is {string}")]
async fn check_tracking(world: &mut LiviqueWorld, tracking_id: String) {
    let order = world.last_order.as_ref().expect("no order");
    assert_eq!(order.tracking_id.as_deref(), Some(tracking_id.as_str()));
    assert!(order.tracking_updated_at.is_some());
}
