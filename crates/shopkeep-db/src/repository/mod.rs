//! # Repository Module
//!
//! Database repository implementations.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Two ways into every repository                                         │
//! │                                                                         │
//! │  db.products().get(&entity_ref)          ← pool, outside any tx        │
//! │       │                                                                 │
//! │       └──► ProductRepository::find(&pool, &entity_ref)                 │
//! │                                                                         │
//! │  ProductRepository::find(&mut *tx, &entity_ref)  ← inside a unit of    │
//! │                                                     work (sees its own │
//! │                                                     uncommitted writes)│
//! │                                                                         │
//! │  Every lookup goes through EntityRef::filter(), so `id` and            │
//! │  `legacy_id` references work against every table.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalog accessor
//! - [`CustomerRepository`](customer::CustomerRepository) - Customer directory
//! - [`SaleRepository`](sale::SaleRepository) - Sales with embedded lines
//! - [`PaymentRepository`](payment::PaymentRepository) - Credit payments

pub mod customer;
pub mod payment;
pub mod product;
pub mod sale;

use shopkeep_core::identity::{FilterValue, LookupFilter};
use sqlx::query::{Query, QueryAs, QueryScalar};
use sqlx::sqlite::SqliteArguments;
use sqlx::Sqlite;

/// Binds a [`LookupFilter`] value onto a query built from
/// [`LookupFilter::sql_predicate`].
pub(crate) trait BindFilter: Sized {
    fn bind_filter(self, filter: &LookupFilter) -> Self;
}

impl<'q> BindFilter for Query<'q, Sqlite, SqliteArguments<'q>> {
    fn bind_filter(self, filter: &LookupFilter) -> Self {
        match filter.value() {
            FilterValue::Text(value) => self.bind(value.clone()),
            FilterValue::Integer(value) => self.bind(*value),
        }
    }
}

impl<'q, O> BindFilter for QueryAs<'q, Sqlite, O, SqliteArguments<'q>> {
    fn bind_filter(self, filter: &LookupFilter) -> Self {
        match filter.value() {
            FilterValue::Text(value) => self.bind(value.clone()),
            FilterValue::Integer(value) => self.bind(*value),
        }
    }
}

impl<'q, O> BindFilter for QueryScalar<'q, Sqlite, O, SqliteArguments<'q>> {
    fn bind_filter(self, filter: &LookupFilter) -> Self {
        match filter.value() {
            FilterValue::Text(value) => self.bind(value.clone()),
            FilterValue::Integer(value) => self.bind(*value),
        }
    }
}
