//! # shopkeep-engine: Sales & Credit Transaction Engine
//!
//! Creates multi-line sales, moves inventory, opens credit balances and
//! records payments against them. Each public operation is one atomic unit
//! of work over the shopkeep-db store.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shopkeep Layers                                  │
//! │                                                                         │
//! │   Sales API                         Payments API                        │
//! │       │                                   │                             │
//! │       ▼                                   ▼                             │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 shopkeep-engine (THIS CRATE)                    │   │
//! │  │                                                                 │   │
//! │  │   SaleCoordinator ──► LineItemPricer        CreditLedger        │   │
//! │  │         │                   │                    │              │   │
//! │  └─────────┼───────────────────┼────────────────────┼──────────────┘   │
//! │            ▼                   ▼                    ▼                   │
//! │  shopkeep-core (pricing, settlement, identity)                          │
//! │  shopkeep-db   (catalog, customers, sales, payments)                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! use shopkeep_core::{CartEntry, Money};
//! use shopkeep_db::{Database, DbConfig};
//! use shopkeep_engine::{Engine, EngineConfig, SaleOptions};
//!
//! let db = Database::new(DbConfig::new("shop.db")).await?;
//! let engine = Engine::new(db, EngineConfig::from_env());
//!
//! let sale = engine
//!     .sales()
//!     .create_sale(&[CartEntry::product("1042", 3)], SaleOptions::credit(Money::from_cents(500)))
//!     .await?;
//! engine.ledger().record_payment(&sale.id, Money::from_cents(1000), None).await?;
//! ```

use chrono::{DateTime, SubsecRound, Utc};
use shopkeep_db::Database;

pub mod config;
mod directory;
pub mod error;
pub mod ledger;
pub mod pricer;
pub mod sales;

pub use config::{EngineConfig, StockPolicy};
pub use error::{EngineError, EngineResult, ErrorBody, ErrorCode, ErrorKind};
pub use ledger::CreditLedger;
pub use pricer::LineItemPricer;
pub use sales::{SaleCoordinator, SaleOptions};

/// Entry point holding one coordinator and one ledger over a shared pool.
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
    sales: SaleCoordinator,
    ledger: CreditLedger,
}

impl Engine {
    pub fn new(db: Database, config: EngineConfig) -> Self {
        Engine {
            config,
            sales: SaleCoordinator::new(db.clone(), config),
            ledger: CreditLedger::new(db, config),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn sales(&self) -> &SaleCoordinator {
        &self.sales
    }

    pub fn ledger(&self) -> &CreditLedger {
        &self.ledger
    }
}

/// Current time at millisecond precision, matching what the store keeps.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::now;
    use shopkeep_core::{Customer, Product};
    use shopkeep_db::{Database, DbConfig};
    use uuid::Uuid;

    pub async fn database() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub async fn product(
        db: &Database,
        legacy_id: Option<i64>,
        price_cents: i64,
        stock: Option<i64>,
        cost_cents: Option<i64>,
    ) -> Product {
        let id = Uuid::new_v4().to_string();
        let product = Product {
            sku: format!("SKU-{}", &id[..8]),
            id,
            legacy_id,
            name: "Wheat Flour 2kg".to_string(),
            price_cents,
            cost_cents,
            stock,
            expires_at: None,
            created_at: now(),
            updated_at: now(),
        };
        db.products().insert(&product).await.unwrap()
    }

    pub async fn customer(db: &Database, legacy_id: Option<i64>, name: &str) -> Customer {
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            legacy_id,
            name: name.to_string(),
            phone: None,
            created_at: now(),
            updated_at: now(),
        };
        db.customers().insert(&customer).await.unwrap()
    }
}
