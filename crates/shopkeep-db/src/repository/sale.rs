//! # Sale Repository
//!
//! Database operations for sales. Lines are embedded in the sale row as a
//! JSON array; they are written once with the sale and never touched again.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. CREATE (sale coordinator, one transaction)                         │
//! │     └── insert() → row with items JSON, totals, opening settlement     │
//! │     └── (stock decrements happen in the same transaction)              │
//! │                                                                         │
//! │  2. PAY (credit ledger, one transaction per payment)                   │
//! │     └── lock_for_update() → take the write lock before reading         │
//! │     └── find()            → fresh balance                              │
//! │     └── update_settlement() → paid / outstanding / status             │
//! │                                                                         │
//! │  Nothing else ever writes to `sales`.                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use shopkeep_core::settlement::Settlement;
use shopkeep_core::{EntityRef, PaymentStatus, Sale, SaleLine};
use sqlx::{Sqlite, SqliteExecutor, SqlitePool};
use tracing::debug;

use super::BindFilter;
use crate::error::{DbError, DbResult};

const SALE_COLUMNS: &str = "id, legacy_id, items, customer_id, customer_legacy_id, \
                            total_cents, total_items, on_credit, paid_amount_cents, \
                            outstanding_amount_cents, status, notes, created_at, updated_at";

/// Raw `sales` row; `items` is still JSON text.
#[derive(Debug, sqlx::FromRow)]
struct SaleRow {
    id: String,
    legacy_id: Option<i64>,
    items: String,
    customer_id: Option<String>,
    customer_legacy_id: Option<i64>,
    total_cents: i64,
    total_items: i64,
    on_credit: bool,
    paid_amount_cents: i64,
    outstanding_amount_cents: i64,
    status: PaymentStatus,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SaleRow> for Sale {
    type Error = DbError;

    fn try_from(row: SaleRow) -> DbResult<Self> {
        let items: Vec<SaleLine> = serde_json::from_str(&row.items)?;

        Ok(Sale {
            id: row.id,
            legacy_id: row.legacy_id,
            items,
            customer_id: row.customer_id,
            customer_legacy_id: row.customer_legacy_id,
            customer_name: None,
            total_cents: row.total_cents,
            total_items: row.total_items,
            on_credit: row.on_credit,
            paid_amount_cents: row.paid_amount_cents,
            outstanding_amount_cents: row.outstanding_amount_cents,
            status: row.status,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by reference, outside any transaction.
    pub async fn get(&self, entity_ref: &EntityRef) -> DbResult<Option<Sale>> {
        Self::find(&self.pool, entity_ref).await
    }

    /// Gets a sale by reference on any executor.
    pub async fn find<'e, E>(executor: E, entity_ref: &EntityRef) -> DbResult<Option<Sale>>
    where
        E: SqliteExecutor<'e>,
    {
        let filter = entity_ref.filter();
        let sql = format!(
            "SELECT {} FROM sales WHERE {}",
            SALE_COLUMNS,
            filter.sql_predicate(1)
        );

        let row = sqlx::query_as::<Sqlite, SaleRow>(&sql)
            .bind_filter(&filter)
            .fetch_optional(executor)
            .await?;

        debug!(reference = %entity_ref, found = row.is_some(), "Sale lookup");
        row.map(Sale::try_from).transpose()
    }

    /// Inserts a sale with its lines embedded.
    pub async fn insert<'e, E>(executor: E, sale: &Sale) -> DbResult<()>
    where
        E: SqliteExecutor<'e>,
    {
        debug!(
            id = %sale.id,
            lines = sale.items.len(),
            total_cents = sale.total_cents,
            on_credit = sale.on_credit,
            "Inserting sale"
        );

        let items = serde_json::to_string(&sale.items)?;

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, legacy_id, items, customer_id, customer_legacy_id,
                total_cents, total_items, on_credit,
                paid_amount_cents, outstanding_amount_cents, status,
                notes, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8,
                ?9, ?10, ?11,
                ?12, ?13, ?14
            )
            "#,
        )
        .bind(&sale.id)
        .bind(sale.legacy_id)
        .bind(items)
        .bind(&sale.customer_id)
        .bind(sale.customer_legacy_id)
        .bind(sale.total_cents)
        .bind(sale.total_items)
        .bind(sale.on_credit)
        .bind(sale.paid_amount_cents)
        .bind(sale.outstanding_amount_cents)
        .bind(sale.status)
        .bind(&sale.notes)
        .bind(sale.created_at)
        .bind(sale.updated_at)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Takes the database write lock on behalf of one sale.
    ///
    /// SQLite has no `SELECT ... FOR UPDATE`; a no-op `UPDATE` is the first
    /// statement of the transaction instead, so the re-read that follows
    /// cannot be stale. Returns `false` if no row has this id.
    pub async fn lock_for_update<'e, E>(executor: E, sale_id: &str) -> DbResult<bool>
    where
        E: SqliteExecutor<'e>,
    {
        let result = sqlx::query("UPDATE sales SET updated_at = updated_at WHERE id = ?1")
            .bind(sale_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Writes a new balance. The only mutation a stored sale ever sees.
    pub async fn update_settlement<'e, E>(
        executor: E,
        sale_id: &str,
        settlement: &Settlement,
        updated_at: DateTime<Utc>,
    ) -> DbResult<()>
    where
        E: SqliteExecutor<'e>,
    {
        debug!(
            id = %sale_id,
            paid_cents = settlement.paid.cents(),
            outstanding_cents = settlement.outstanding.cents(),
            status = settlement.status.as_str(),
            "Updating sale settlement"
        );

        let result = sqlx::query(
            r#"
            UPDATE sales SET
                paid_amount_cents = ?2,
                outstanding_amount_cents = ?3,
                status = ?4,
                updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(sale_id)
        .bind(settlement.paid.cents())
        .bind(settlement.outstanding.cents())
        .bind(settlement.status)
        .bind(updated_at)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale", sale_id));
        }

        Ok(())
    }

    /// Counts sales (diagnostics, tests).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
