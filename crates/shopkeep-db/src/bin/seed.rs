//! # Seed Data Generator
//!
//! Populates a development database with a catalog and a customer directory
//! that mix migrated rows (carrying a legacy numeric key) and native rows.
//!
//! ## Usage
//! ```bash
//! # 200 products, 40 customers (default)
//! cargo run -p shopkeep-db --bin seed
//!
//! # Custom amounts and path
//! cargo run -p shopkeep-db --bin seed -- --products 1000 --customers 100 --db ./data/shop.db
//! ```
//!
//! ## Generated Rows
//! - Every other product and customer is "migrated": `legacy_id` = 1000 + n
//! - Every fifth product does not track stock (`stock = NULL`)
//! - Every third product has no known cost

use chrono::{Duration, Utc};
use shopkeep_core::validation::{validate_product_name, validate_sku};
use shopkeep_core::{Customer, Product};
use shopkeep_db::{Database, DbConfig};
use std::env;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

const PRODUCT_NAMES: &[(&str, &str)] = &[
    ("RICE", "Basmati Rice"),
    ("FLOUR", "Wheat Flour"),
    ("SUGAR", "White Sugar"),
    ("OIL", "Cooking Oil"),
    ("TEA", "Black Tea"),
    ("MILK", "Powdered Milk"),
    ("SOAP", "Laundry Soap"),
    ("SALT", "Iodised Salt"),
    ("LENTIL", "Red Lentils"),
    ("BEAN", "Kidney Beans"),
];

const SIZES: &[(&str, i64)] = &[("500g", 0), ("1kg", 150), ("2kg", 320), ("5kg", 700)];

const CUSTOMER_NAMES: &[&str] = &[
    "Amina Yusuf",
    "Bilal Ahmed",
    "Chiara Rossi",
    "Dmitri Volkov",
    "Esi Mensah",
    "Farah Khan",
    "Goran Petrovic",
    "Hana Sato",
];

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,shopkeep=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    let mut products: usize = 200;
    let mut customers: usize = 40;
    let mut db_path = String::from("./shopkeep_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--products" | "-p" => {
                if i + 1 < args.len() {
                    products = args[i + 1].parse().unwrap_or(products);
                    i += 1;
                }
            }
            "--customers" | "-c" => {
                if i + 1 < args.len() {
                    customers = args[i + 1].parse().unwrap_or(customers);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Shopkeep Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -p, --products <N>   Products to generate (default: 200)");
                println!("  -c, --customers <N>  Customers to generate (default: 40)");
                println!("  -d, --db <PATH>      Database file (default: ./shopkeep_dev.db)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            other => warn!(argument = other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    info!(path = %db_path, products, customers, "Seeding database");

    let db = Database::new(DbConfig::new(&db_path)).await?;

    let existing = db.products().count().await?;
    if existing > 0 {
        warn!(existing, "Database already has products; skipping seed");
        db.close().await;
        return Ok(());
    }

    let start = std::time::Instant::now();

    let mut inserted = 0usize;
    for n in 0..products {
        let product = generate_product(n);
        if let Err(e) = validate_sku(&product.sku).and(validate_product_name(&product.name)) {
            warn!(sku = %product.sku, error = %e, "Skipping invalid product");
            continue;
        }
        match db.products().insert(&product).await {
            Ok(_) => inserted += 1,
            Err(e) => warn!(sku = %product.sku, error = %e, "Failed to insert product"),
        }
    }

    let mut directory = 0usize;
    for n in 0..customers {
        match db.customers().insert(&generate_customer(n)).await {
            Ok(_) => directory += 1,
            Err(e) => warn!(n, error = %e, "Failed to insert customer"),
        }
    }

    info!(
        products = inserted,
        customers = directory,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Seed complete"
    );

    db.close().await;
    Ok(())
}

/// Legacy key for migrated rows (every even `n`).
fn legacy_key(n: usize) -> Option<i64> {
    (n % 2 == 0).then(|| 1000 + n as i64)
}

fn generate_product(n: usize) -> Product {
    let now = Utc::now();
    let (code, name) = PRODUCT_NAMES[n % PRODUCT_NAMES.len()];
    let (size, addon) = SIZES[(n / PRODUCT_NAMES.len()) % SIZES.len()];

    let price_cents = 199 + ((n * 37) % 900) as i64 + addon;
    let cost_cents = (n % 3 != 0).then(|| price_cents * (60 + (n % 20) as i64) / 100);
    let stock = (n % 5 != 0).then(|| (n % 60) as i64);
    // Perishables get an expiry marker a few months out.
    let expires_at = (n % 4 == 0).then(|| now + Duration::days(30 + (n % 120) as i64));

    Product {
        id: Uuid::new_v4().to_string(),
        legacy_id: legacy_key(n),
        sku: format!("{}-{}-{:04}", code, size.to_uppercase(), n),
        name: format!("{} {}", name, size),
        price_cents,
        cost_cents,
        stock,
        expires_at,
        created_at: now,
        updated_at: now,
    }
}

fn generate_customer(n: usize) -> Customer {
    let now = Utc::now();
    let base = CUSTOMER_NAMES[n % CUSTOMER_NAMES.len()];
    let name = if n < CUSTOMER_NAMES.len() {
        base.to_string()
    } else {
        format!("{} {}", base, n / CUSTOMER_NAMES.len() + 1)
    };

    Customer {
        id: Uuid::new_v4().to_string(),
        legacy_id: legacy_key(n),
        name,
        phone: Some(format!("+92300{:07}", n)),
        created_at: now,
        updated_at: now,
    }
}
