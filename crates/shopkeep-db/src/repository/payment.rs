//! # Payment Repository
//!
//! Append-only storage for credit payments. Rows are never updated.

use shopkeep_core::{EntityRef, Payment};
use sqlx::{Sqlite, SqliteExecutor, SqlitePool};
use tracing::debug;

use super::BindFilter;
use crate::error::DbResult;

const PAYMENT_COLUMNS: &str = "id, legacy_id, sale_id, sale_legacy_id, customer_id, \
                               customer_legacy_id, amount_cents, note, created_at";

#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: SqlitePool,
}

impl PaymentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PaymentRepository { pool }
    }

    /// Gets a payment by reference.
    pub async fn get(&self, entity_ref: &EntityRef) -> DbResult<Option<Payment>> {
        let filter = entity_ref.filter();
        let sql = format!(
            "SELECT {} FROM payments WHERE {}",
            PAYMENT_COLUMNS,
            filter.sql_predicate(1)
        );

        let payment = sqlx::query_as::<Sqlite, Payment>(&sql)
            .bind_filter(&filter)
            .fetch_optional(&self.pool)
            .await?;

        Ok(payment)
    }

    /// Payments of one sale (by native sale id), in the order recorded.
    pub async fn list_for_sale<'e, E>(executor: E, sale_id: &str) -> DbResult<Vec<Payment>>
    where
        E: SqliteExecutor<'e>,
    {
        let sql = format!(
            "SELECT {} FROM payments WHERE sale_id = ?1 ORDER BY rowid",
            PAYMENT_COLUMNS
        );

        let payments = sqlx::query_as::<Sqlite, Payment>(&sql)
            .bind(sale_id)
            .fetch_all(executor)
            .await?;

        Ok(payments)
    }

    /// Appends a payment.
    pub async fn insert<'e, E>(executor: E, payment: &Payment) -> DbResult<()>
    where
        E: SqliteExecutor<'e>,
    {
        debug!(
            id = %payment.id,
            sale_id = %payment.sale_id,
            amount_cents = payment.amount_cents,
            "Recording payment"
        );

        sqlx::query(
            r#"
            INSERT INTO payments (
                id, legacy_id, sale_id, sale_legacy_id,
                customer_id, customer_legacy_id,
                amount_cents, note, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&payment.id)
        .bind(payment.legacy_id)
        .bind(&payment.sale_id)
        .bind(payment.sale_legacy_id)
        .bind(&payment.customer_id)
        .bind(payment.customer_legacy_id)
        .bind(payment.amount_cents)
        .bind(&payment.note)
        .bind(payment.created_at)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM payments")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
