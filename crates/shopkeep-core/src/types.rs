//! # Domain Types
//!
//! Core domain types used throughout the sales & credit engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │    Payment      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id / legacy_id │   │  id / legacy_id │   │  id / legacy_id │       │
//! │  │  price_cents    │   │  items: [Line]  │   │  sale_id (+leg.)│       │
//! │  │  cost_cents?    │   │  total_cents    │   │  amount_cents   │       │
//! │  │  stock?         │   │  paid / owed    │   │  note?          │       │
//! │  └─────────────────┘   │  status         │   └─────────────────┘       │
//! │                        └─────────────────┘                              │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Customer     │   │    SaleLine     │   │ PaymentStatus   │       │
//! │  │  id / legacy_id │   │  (embedded)     │   │  Pending        │       │
//! │  │  name           │   │  product|service│   │  PartiallyPaid  │       │
//! │  └─────────────────┘   └─────────────────┘   │  Paid           │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity
//! Every entity has:
//! - `id`: UUID v4 assigned by the current store
//! - `legacy_id`: optional integer key carried over from the relational store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::identity::EntityRef;
use crate::money::Money;
use crate::settlement::Settlement;

// =============================================================================
// Product
// =============================================================================

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Native identifier (UUID v4).
    pub id: String,

    /// Key from the relational store, if this row was migrated.
    pub legacy_id: Option<i64>,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    /// Display name, frozen into sale lines.
    pub name: String,

    /// Selling price in cents.
    pub price_cents: i64,

    /// Unit cost in cents, when the catalog knows it.
    pub cost_cents: Option<i64>,

    /// Current stock level. `None` means stock is not tracked.
    pub stock: Option<i64>,

    /// Expiry marker (read by the alert scanner, carried here untouched).
    #[ts(as = "Option<String>")]
    pub expires_at: Option<DateTime<Utc>>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    #[inline]
    pub fn cost(&self) -> Option<Money> {
        self.cost_cents.map(Money::from_cents)
    }

    #[inline]
    pub fn tracks_stock(&self) -> bool {
        self.stock.is_some()
    }

    /// Checks if `quantity` can be sold (in stock or untracked).
    pub fn can_sell(&self, quantity: i64) -> bool {
        match self.stock {
            Some(stock) => stock >= quantity,
            None => true,
        }
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A customer from the directory. Read-only for the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub legacy_id: Option<i64>,
    pub name: String,
    pub phone: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Payment Status
// =============================================================================

/// Derived payment status of a sale.
///
/// ```text
/// pending ──(partial payment)──► partially_paid ──(outstanding = 0)──► paid
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Nothing paid yet, balance outstanding.
    Pending,
    /// Some paid, some outstanding.
    PartiallyPaid,
    /// Nothing outstanding.
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::PartiallyPaid => "partially_paid",
            PaymentStatus::Paid => "paid",
        }
    }
}

// =============================================================================
// Sale Line
// =============================================================================

/// What a sale line refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    Product,
    Service,
}

/// A line item embedded in a sale.
///
/// Uses the snapshot pattern: name, unit price and unit cost are frozen at
/// the time of sale and `line_total_cents` is never recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleLine {
    pub kind: LineKind,
    /// Native id of the product (product lines only).
    pub product_id: Option<String>,
    /// Legacy key of the product, when it has one.
    pub product_legacy_id: Option<i64>,
    /// Service reference exactly as supplied (service lines only).
    pub service_ref: Option<String>,
    /// Product name at time of sale, or the service reference.
    pub name_snapshot: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub unit_cost_cents: i64,
    /// `quantity × unit_price_cents`.
    pub line_total_cents: i64,
}

impl SaleLine {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }

    /// Reference to the catalog product this line decrements, if any.
    pub fn product_ref(&self) -> Option<EntityRef> {
        match self.kind {
            LineKind::Product => self.product_id.as_deref().map(EntityRef::from_native_id),
            LineKind::Service => None,
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A sale with its lines embedded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub legacy_id: Option<i64>,
    pub items: Vec<SaleLine>,
    pub customer_id: Option<String>,
    pub customer_legacy_id: Option<i64>,
    /// Filled from the customer directory when returned to callers.
    /// Not persisted.
    pub customer_name: Option<String>,
    pub total_cents: i64,
    pub total_items: i64,
    pub on_credit: bool,
    pub paid_amount_cents: i64,
    pub outstanding_amount_cents: i64,
    pub status: PaymentStatus,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn paid(&self) -> Money {
        Money::from_cents(self.paid_amount_cents)
    }

    #[inline]
    pub fn outstanding(&self) -> Money {
        Money::from_cents(self.outstanding_amount_cents)
    }

    /// Current balance as a [`Settlement`].
    pub fn settlement(&self) -> Settlement {
        Settlement {
            paid: self.paid(),
            outstanding: self.outstanding(),
            status: self.status,
        }
    }

    /// Reference to the customer, preferring the native id.
    pub fn customer_ref(&self) -> Option<EntityRef> {
        match (&self.customer_id, self.customer_legacy_id) {
            (Some(id), _) => Some(EntityRef::from_native_id(id)),
            (None, Some(key)) => Some(EntityRef::Legacy(key)),
            (None, None) => None,
        }
    }
}

// =============================================================================
// Payment
// =============================================================================

/// A payment recorded against a credit sale. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Payment {
    pub id: String,
    pub legacy_id: Option<i64>,
    pub sale_id: String,
    pub sale_legacy_id: Option<i64>,
    pub customer_id: Option<String>,
    pub customer_legacy_id: Option<i64>,
    /// Amount paid in cents.
    pub amount_cents: i64,
    pub note: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Payment {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

/// Result of recording a payment: the new record and the refreshed sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentReceipt {
    pub payment: Payment,
    pub sale: Sale,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(stock: Option<i64>) -> Product {
        let now = Utc::now();
        Product {
            id: "550e8400-e29b-41d4-a716-446655440000".to_string(),
            legacy_id: Some(7),
            sku: "COKE-330".to_string(),
            name: "Coca-Cola 330ml".to_string(),
            price_cents: 500,
            cost_cents: None,
            stock,
            expires_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_can_sell() {
        assert!(product(Some(3)).can_sell(3));
        assert!(!product(Some(2)).can_sell(3));
        assert!(product(None).can_sell(10_000));
        assert!(!product(None).tracks_stock());
    }

    #[test]
    fn test_payment_status_serialization() {
        let json = serde_json::to_string(&PaymentStatus::PartiallyPaid).unwrap();
        assert_eq!(json, "\"partially_paid\"");
        assert_eq!(PaymentStatus::PartiallyPaid.as_str(), "partially_paid");
    }

    #[test]
    fn test_line_product_ref() {
        let line = SaleLine {
            kind: LineKind::Product,
            product_id: Some("550e8400-e29b-41d4-a716-446655440000".to_string()),
            product_legacy_id: None,
            service_ref: None,
            name_snapshot: "Coke".to_string(),
            quantity: 2,
            unit_price_cents: 100,
            unit_cost_cents: 60,
            line_total_cents: 200,
        };
        assert!(matches!(line.product_ref(), Some(EntityRef::Native(_))));

        let service = SaleLine {
            kind: LineKind::Service,
            product_id: None,
            service_ref: Some("repair".to_string()),
            ..line
        };
        assert_eq!(service.product_ref(), None);
    }
}
