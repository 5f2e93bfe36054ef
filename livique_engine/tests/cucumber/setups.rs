use cucumber::given;
use livique_engine::{
    db_types::{NewProduct, ProductId, UserId},
    traits::InventoryManagement,
};

use crate::cucumber::{LiviqueWorld, OrderSystem};

#[given("a fresh install")]
async fn fresh_database(world: &mut LiviqueWorld) {
    world.system = Some(OrderSystem::new(false).await);
}

#[given("a fresh install where gateway orders adjust inventory")]
async fn fresh_database_gateway_stock(world: &mut LiviqueWorld) {
    world.system = Some(OrderSystem::new(true).await);
}

#[given(expr = "product {word} has {int} units in stock")]
async fn seed_product(world: &mut LiviqueWorld, id: String, quantity: i64) {
    let product = NewProduct::new(ProductId::from(id.as_str()), format!("Product {id}"), quantity);
    world.db().insert_product(product).await.expect("Error seeding product");
}

#[given(expr = "I am signed in as {word}")]
async fn sign_in(world: &mut LiviqueWorld, user: String) {
    world.user = Some(UserId::from(user));
}
