//! # Product Repository
//!
//! The catalog accessor: reads products by either identity scheme and
//! applies stock changes inside the caller's unit of work.
//!
//! ## Stock Updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                                │
//! │                                                                         │
//! │  ❌ WRONG: read, compute, write back                                   │
//! │     SELECT stock ... → 10;  UPDATE products SET stock = 7              │
//! │                                                                         │
//! │  ✅ CORRECT: atomic delta inside the sale's transaction                │
//! │     UPDATE products SET stock = stock - 3 WHERE ... AND stock IS NOT NULL│
//! │                                                                         │
//! │  Sale A: sells 3 → stock - 3                                           │
//! │  Sale B: sells 2 → stock - 2                                           │
//! │  Both commit: -3 + -2 = -5, no lost update                             │
//! │                                                                         │
//! │  Strict variant adds `AND stock >= qty`: a sale that lost the race     │
//! │  matches no row and its whole transaction is rolled back.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use shopkeep_core::{EntityRef, Product};
use sqlx::{Sqlite, SqliteExecutor, SqlitePool};
use tracing::debug;

use super::BindFilter;
use crate::error::DbResult;

const PRODUCT_COLUMNS: &str = "id, legacy_id, sku, name, price_cents, cost_cents, stock, \
                               expires_at, created_at, updated_at";

/// Outcome of a conditional stock decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockDecrement {
    /// Stock was decremented; carries the new level.
    Applied { remaining: i64 },
    /// Product does not track stock; nothing changed.
    Untracked,
    /// Tracked stock is below the requested quantity; nothing changed.
    Insufficient { available: i64 },
    /// No product matches the reference.
    Missing,
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// // Pool-backed
/// let product = repo.get(&EntityRef::parse("1042")).await?;
///
/// // Inside a transaction
/// ProductRepository::adjust_stock(&mut *tx, &entity_ref, -3, now).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by reference, outside any transaction.
    pub async fn get(&self, entity_ref: &EntityRef) -> DbResult<Option<Product>> {
        Self::find(&self.pool, entity_ref).await
    }

    /// Gets a product by reference on any executor.
    ///
    /// Inside a transaction this reflects stock adjustments already made by
    /// that same transaction.
    pub async fn find<'e, E>(executor: E, entity_ref: &EntityRef) -> DbResult<Option<Product>>
    where
        E: SqliteExecutor<'e>,
    {
        let filter = entity_ref.filter();
        let sql = format!(
            "SELECT {} FROM products WHERE {}",
            PRODUCT_COLUMNS,
            filter.sql_predicate(1)
        );

        let product = sqlx::query_as::<Sqlite, Product>(&sql)
            .bind_filter(&filter)
            .fetch_optional(executor)
            .await?;

        debug!(
            reference = %entity_ref,
            column = filter.column(),
            found = product.is_some(),
            "Product lookup"
        );
        Ok(product)
    }

    /// Applies `delta` to a product's stock as one atomic increment,
    /// stamping `updated_at`.
    ///
    /// ## Returns
    /// * `Ok(Some(level))` - New stock level
    /// * `Ok(None)` - Product untracked (`stock IS NULL`) or missing; no-op
    pub async fn adjust_stock<'e, E>(
        executor: E,
        entity_ref: &EntityRef,
        delta: i64,
        updated_at: DateTime<Utc>,
    ) -> DbResult<Option<i64>>
    where
        E: SqliteExecutor<'e>,
    {
        let filter = entity_ref.filter();
        let sql = format!(
            "UPDATE products SET stock = stock + ?1, updated_at = ?2 \
             WHERE {} AND stock IS NOT NULL RETURNING stock",
            filter.sql_predicate(3)
        );

        let remaining = sqlx::query_scalar::<Sqlite, i64>(&sql)
            .bind(delta)
            .bind(updated_at)
            .bind_filter(&filter)
            .fetch_optional(executor)
            .await?;

        debug!(reference = %entity_ref, delta, remaining = ?remaining, "Adjusted stock");
        Ok(remaining)
    }

    /// Decrements stock only if at least `quantity` is available.
    ///
    /// Needs a connection (not the pool) because a miss is followed by a
    /// second read to explain it; both must see the same transaction.
    pub async fn decrement_stock_checked(
        conn: &mut sqlx::SqliteConnection,
        entity_ref: &EntityRef,
        quantity: i64,
        updated_at: DateTime<Utc>,
    ) -> DbResult<StockDecrement> {
        let filter = entity_ref.filter();
        let sql = format!(
            "UPDATE products SET stock = stock - ?1, updated_at = ?2 \
             WHERE {} AND stock IS NOT NULL AND stock >= ?1 RETURNING stock",
            filter.sql_predicate(3)
        );

        let remaining = sqlx::query_scalar::<Sqlite, i64>(&sql)
            .bind(quantity)
            .bind(updated_at)
            .bind_filter(&filter)
            .fetch_optional(&mut *conn)
            .await?;

        let outcome = match remaining {
            Some(remaining) => StockDecrement::Applied { remaining },
            None => match Self::find(&mut *conn, entity_ref).await? {
                None => StockDecrement::Missing,
                Some(Product { stock: None, .. }) => StockDecrement::Untracked,
                Some(Product {
                    stock: Some(available),
                    ..
                }) => StockDecrement::Insufficient { available },
            },
        };

        debug!(reference = %entity_ref, quantity, outcome = ?outcome, "Checked stock decrement");
        Ok(outcome)
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - SKU or legacy key already exists
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        debug!(sku = %product.sku, legacy_id = ?product.legacy_id, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, legacy_id, sku, name,
                price_cents, cost_cents, stock, expires_at,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&product.id)
        .bind(product.legacy_id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(product.price_cents)
        .bind(product.cost_cents)
        .bind(product.stock)
        .bind(product.expires_at)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product.clone())
    }

    /// Counts products (diagnostics, seeding).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
