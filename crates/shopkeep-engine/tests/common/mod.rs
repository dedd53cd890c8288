//! Shared setup for engine integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use shopkeep_core::{Customer, EntityRef, Product};
use shopkeep_db::{Database, DbConfig};
use shopkeep_engine::{Engine, EngineConfig};
use uuid::Uuid;

pub async fn memory_engine(config: EngineConfig) -> (Database, Engine) {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let engine = Engine::new(db.clone(), config);
    (db, engine)
}

/// File-backed store with several connections, for tests with real writers
/// competing for the lock.
pub async fn file_engine(dir: &Path, config: EngineConfig) -> (Database, Engine) {
    let db_config = DbConfig::new(dir.join("shop.db"))
        .max_connections(8)
        .busy_timeout(Duration::from_secs(10));
    let db = Database::new(db_config).await.unwrap();
    let engine = Engine::new(db.clone(), config);
    (db, engine)
}

pub async fn seed_product(
    db: &Database,
    legacy_id: Option<i64>,
    name: &str,
    price_cents: i64,
    stock: Option<i64>,
) -> Product {
    let id = Uuid::new_v4().to_string();
    seed_product_with_id(db, &id, legacy_id, name, price_cents, stock).await
}

/// Like [`seed_product`] but under a caller-chosen `id`, stored verbatim.
pub async fn seed_product_with_id(
    db: &Database,
    id: &str,
    legacy_id: Option<i64>,
    name: &str,
    price_cents: i64,
    stock: Option<i64>,
) -> Product {
    let now = Utc::now();
    let id = id.to_string();
    let product = Product {
        sku: format!("SKU-{}", &id[..8]),
        id,
        legacy_id,
        name: name.to_string(),
        price_cents,
        cost_cents: None,
        stock,
        expires_at: None,
        created_at: now,
        updated_at: now,
    };
    db.products().insert(&product).await.unwrap()
}

pub async fn seed_customer(db: &Database, legacy_id: Option<i64>, name: &str) -> Customer {
    let now = Utc::now();
    let customer = Customer {
        id: Uuid::new_v4().to_string(),
        legacy_id,
        name: name.to_string(),
        phone: Some("+923001234567".to_string()),
        created_at: now,
        updated_at: now,
    };
    db.customers().insert(&customer).await.unwrap()
}

pub async fn stock_of(db: &Database, product: &Product) -> Option<i64> {
    db.products()
        .get(&EntityRef::parse(&product.id))
        .await
        .unwrap()
        .unwrap()
        .stock
}
