//! # Line Pricing
//!
//! Turns a cart entry plus (optionally) its catalog product into a validated
//! [`SaleLine`].
//!
//! ## Line Calculation Flow
//! ```text
//! CartEntry { reference, quantity, unit_price_override?, kind }
//!      │
//!      ├── quantity in 1..=MAX_ITEM_QUANTITY?     no → InvalidQuantity
//!      │
//!      ├── kind == product
//!      │     ├── product resolved?                no → ProductNotFound
//!      │     └── tracked stock >= quantity?       no → InsufficientStock
//!      │
//!      ├── unit_price = override | product price | 0 (service)
//!      │                 negative?                   → InvalidPrice
//!      ├── unit_cost  = product cost | CostPolicy fallback
//!      └── line_total = quantity × unit_price     overflow → InvalidPrice
//! ```
//!
//! Catalog lookups are the caller's job; everything here is pure.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{LineKind, Product, SaleLine};
use crate::validation::{validate_quantity, validate_unit_price};

// =============================================================================
// Cost Policy
// =============================================================================

/// Unit cost used when the catalog does not know a product's cost.
///
/// One global setting, fixed when the pricer is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostPolicy {
    /// Unknown cost is recorded as zero.
    #[default]
    Zero,
    /// Unknown cost is recorded as the line's unit selling price.
    SellingPrice,
}

impl CostPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CostPolicy::Zero => "zero",
            CostPolicy::SellingPrice => "selling_price",
        }
    }

    /// Fallback cost for a line priced at `unit_price`.
    pub fn fallback(&self, unit_price: Money) -> Money {
        match self {
            CostPolicy::Zero => Money::zero(),
            CostPolicy::SellingPrice => unit_price,
        }
    }
}

impl fmt::Display for CostPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CostPolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zero" => Ok(CostPolicy::Zero),
            "selling_price" | "price" => Ok(CostPolicy::SellingPrice),
            other => Err(ValidationError::InvalidFormat {
                field: "cost policy".to_string(),
                reason: format!("expected 'zero' or 'selling_price', got '{}'", other),
            }),
        }
    }
}

// =============================================================================
// Cart Entry
// =============================================================================

/// One requested line of a sale, as received from the Sales API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEntry {
    /// Product reference (either identity scheme) or opaque service reference.
    pub reference: String,
    pub quantity: i64,
    pub unit_price_override: Option<Money>,
    pub kind: LineKind,
}

impl CartEntry {
    pub fn product(reference: impl Into<String>, quantity: i64) -> Self {
        CartEntry {
            reference: reference.into(),
            quantity,
            unit_price_override: None,
            kind: LineKind::Product,
        }
    }

    pub fn service(reference: impl Into<String>, quantity: i64) -> Self {
        CartEntry {
            reference: reference.into(),
            quantity,
            unit_price_override: None,
            kind: LineKind::Service,
        }
    }

    /// Sets a unit price that replaces the catalog price.
    pub fn with_unit_price(mut self, price: Money) -> Self {
        self.unit_price_override = Some(price);
        self
    }

    /// Checks the quantity alone. Runs before any catalog lookup.
    pub fn check_quantity(&self) -> CoreResult<()> {
        validate_quantity(self.quantity).map_err(|_| CoreError::InvalidQuantity {
            reference: self.reference.clone(),
            quantity: self.quantity,
        })
    }
}

// =============================================================================
// Priced Line
// =============================================================================

/// A validated line plus the product it will decrement (product lines only).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLine {
    pub line: SaleLine,
    pub product: Option<Product>,
}

impl PricedLine {
    #[inline]
    pub fn line_total(&self) -> Money {
        self.line.line_total()
    }
}

/// Prices one cart entry.
///
/// `product` is the catalog lookup result for product entries and is ignored
/// for services.
///
/// ## Example
/// ```rust
/// use shopkeep_core::pricing::{price_line, CartEntry, CostPolicy};
/// use shopkeep_core::Money;
///
/// let entry = CartEntry::service("haircut", 2).with_unit_price(Money::from_cents(1200));
/// let priced = price_line(&entry, None, CostPolicy::SellingPrice).unwrap();
/// assert_eq!(priced.line.line_total_cents, 2400);
/// assert_eq!(priced.line.unit_cost_cents, 1200);
/// ```
pub fn price_line(
    entry: &CartEntry,
    product: Option<&Product>,
    policy: CostPolicy,
) -> CoreResult<PricedLine> {
    entry.check_quantity()?;

    let product = match entry.kind {
        LineKind::Product => {
            let product =
                product.ok_or_else(|| CoreError::ProductNotFound(entry.reference.clone()))?;
            if !product.can_sell(entry.quantity) {
                return Err(CoreError::InsufficientStock {
                    product: product.name.clone(),
                    available: product.stock.unwrap_or_default(),
                    requested: entry.quantity,
                });
            }
            Some(product)
        }
        LineKind::Service => None,
    };

    let unit_price = entry
        .unit_price_override
        .or_else(|| product.map(Product::price))
        .unwrap_or_else(Money::zero);
    validate_unit_price(unit_price).map_err(|e| CoreError::InvalidPrice {
        reference: entry.reference.clone(),
        reason: e.to_string(),
    })?;

    let unit_cost = product
        .and_then(Product::cost)
        .unwrap_or_else(|| policy.fallback(unit_price));

    let line_total = unit_price
        .checked_mul_quantity(entry.quantity)
        .ok_or_else(|| CoreError::InvalidPrice {
            reference: entry.reference.clone(),
            reason: "line total overflows".to_string(),
        })?;

    let line = match product {
        Some(p) => SaleLine {
            kind: LineKind::Product,
            product_id: Some(p.id.clone()),
            product_legacy_id: p.legacy_id,
            service_ref: None,
            name_snapshot: p.name.clone(),
            quantity: entry.quantity,
            unit_price_cents: unit_price.cents(),
            unit_cost_cents: unit_cost.cents(),
            line_total_cents: line_total.cents(),
        },
        None => SaleLine {
            kind: LineKind::Service,
            product_id: None,
            product_legacy_id: None,
            service_ref: Some(entry.reference.clone()),
            name_snapshot: entry.reference.clone(),
            quantity: entry.quantity,
            unit_price_cents: unit_price.cents(),
            unit_cost_cents: unit_cost.cents(),
            line_total_cents: line_total.cents(),
        },
    };

    Ok(PricedLine {
        line,
        product: product.cloned(),
    })
}

/// Sale-level sums over priced lines: `(total, total_items)`.
pub fn summarize(lines: &[PricedLine]) -> CoreResult<(Money, i64)> {
    let mut total = Money::zero();
    let mut items: i64 = 0;

    for priced in lines {
        total = total
            .checked_add(priced.line_total())
            .ok_or_else(|| CoreError::InvalidPrice {
                reference: priced.line.name_snapshot.clone(),
                reason: "sale total overflows".to_string(),
            })?;
        // Bounded by MAX_CART_ITEMS × MAX_ITEM_QUANTITY.
        items += priced.line.quantity;
    }

    Ok((total, items))
}

// =============================================================================
// Unit Tests
// =============================================================================
