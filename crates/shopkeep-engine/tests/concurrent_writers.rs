//! Competing writers on a file-backed store with a multi-connection pool.

mod common;

use common::{file_engine, seed_product, stock_of};
use shopkeep_core::settlement::OverpaymentPolicy;
use shopkeep_core::{CartEntry, CoreError, Money, PaymentStatus};
use shopkeep_engine::{EngineConfig, EngineError, SaleOptions, StockPolicy};
use tempfile::TempDir;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_payments_are_serialized_per_sale() {
    let dir = TempDir::new().unwrap();
    let (db, engine) = file_engine(dir.path(), EngineConfig::default()).await;
    let product = seed_product(&db, None, "Powdered Milk", 1000, None).await;

    let sale = engine
        .sales()
        .create_sale(&[CartEntry::product(&product.id, 1)], SaleOptions::credit(Money::zero()))
        .await
        .unwrap();

    // 15 payments of 100 against a balance of 1000: exactly ten fit.
    let mut handles = Vec::new();
    for _ in 0..15 {
        let engine = engine.clone();
        let sale_id = sale.id.clone();
        handles.push(tokio::spawn(async move {
            engine
                .ledger()
                .record_payment(&sale_id, Money::from_cents(100), None)
                .await
        }));
    }

    let mut accepted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(EngineError::Domain(
                CoreError::SaleAlreadyPaid(_) | CoreError::Overpayment { .. },
            )) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(accepted, 10);

    let stored = engine.ledger().get_sale(&sale.id).await.unwrap();
    assert_eq!(stored.paid_amount_cents, 1000);
    assert_eq!(stored.outstanding_amount_cents, 0);
    assert_eq!(stored.status, PaymentStatus::Paid);
    assert_eq!(engine.ledger().payments_for(&sale.id).await.unwrap().len(), 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sales_never_lose_a_decrement() {
    let dir = TempDir::new().unwrap();
    let (db, engine) = file_engine(dir.path(), EngineConfig::default()).await;
    let product = seed_product(&db, Some(9), "Red Lentils", 250, Some(50)).await;

    let mut handles = Vec::new();
    for _ in 0..12 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine
                .sales()
                .create_sale(&[CartEntry::product("9", 2)], SaleOptions::cash())
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(stock_of(&db, &product).await, Some(50 - 24));
    assert_eq!(db.sales().count().await.unwrap(), 12);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn strict_stock_never_oversells() {
    let dir = TempDir::new().unwrap();
    let config = EngineConfig::default().with_stock_policy(StockPolicy::Strict);
    let (db, engine) = file_engine(dir.path(), config).await;
    let product = seed_product(&db, None, "Kidney Beans", 300, Some(5)).await;

    let mut handles = Vec::new();
    for _ in 0..10 {
        let engine = engine.clone();
        let product_id = product.id.clone();
        handles.push(tokio::spawn(async move {
            engine
                .sales()
                .create_sale(&[CartEntry::product(product_id, 1)], SaleOptions::cash())
                .await
        }));
    }

    let mut sold = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => sold += 1,
            Err(EngineError::Domain(CoreError::InsufficientStock { .. })) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(sold, 5);
    assert_eq!(stock_of(&db, &product).await, Some(0));
    assert_eq!(db.sales().count().await.unwrap(), 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn accept_policy_counts_every_concurrent_payment() {
    let dir = TempDir::new().unwrap();
    let config = EngineConfig::default().with_overpayment_policy(OverpaymentPolicy::Accept);
    let (_db, engine) = file_engine(dir.path(), config).await;

    let sale = engine
        .sales()
        .create_sale(
            &[CartEntry::service("catering", 1).with_unit_price(Money::from_cents(500))],
            SaleOptions::credit(Money::zero()),
        )
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let engine = engine.clone();
        let sale_id = sale.id.clone();
        handles.push(tokio::spawn(async move {
            engine
                .ledger()
                .record_payment(&sale_id, Money::from_cents(100), None)
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stored = engine.ledger().get_sale(&sale.id).await.unwrap();
    assert_eq!(stored.paid_amount_cents, 800);
    assert_eq!(stored.outstanding_amount_cents, 0);
}
