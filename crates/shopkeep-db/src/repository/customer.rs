//! # Customer Repository
//!
//! The customer directory. The engine only reads from it; `insert` exists
//! for seeding and tests.

use shopkeep_core::{Customer, EntityRef};
use sqlx::{Sqlite, SqliteExecutor, SqlitePool};
use tracing::debug;

use super::BindFilter;
use crate::error::DbResult;

#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Gets a customer by reference, outside any transaction.
    pub async fn get(&self, entity_ref: &EntityRef) -> DbResult<Option<Customer>> {
        Self::find(&self.pool, entity_ref).await
    }

    pub async fn find<'e, E>(executor: E, entity_ref: &EntityRef) -> DbResult<Option<Customer>>
    where
        E: SqliteExecutor<'e>,
    {
        let filter = entity_ref.filter();
        let sql = format!(
            "SELECT id, legacy_id, name, phone, created_at, updated_at \
             FROM customers WHERE {}",
            filter.sql_predicate(1)
        );

        let customer = sqlx::query_as::<Sqlite, Customer>(&sql)
            .bind_filter(&filter)
            .fetch_optional(executor)
            .await?;

        debug!(reference = %entity_ref, found = customer.is_some(), "Customer lookup");
        Ok(customer)
    }

    pub async fn insert(&self, customer: &Customer) -> DbResult<Customer> {
        debug!(id = %customer.id, legacy_id = ?customer.legacy_id, "Inserting customer");

        sqlx::query(
            "INSERT INTO customers (id, legacy_id, name, phone, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&customer.id)
        .bind(customer.legacy_id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(customer.clone())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
