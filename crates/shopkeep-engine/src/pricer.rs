//! # Line-Item Pricer
//!
//! Resolves each cart entry against the catalog and turns it into a priced
//! [`SaleLine`](shopkeep_core::SaleLine). The arithmetic lives in
//! [`shopkeep_core::pricing`]; this half only fetches the product.
//!
//! Pricing runs before the sale transaction opens, so its stock check is
//! advisory: another sale may take the same units before this one commits.

use shopkeep_core::pricing::{self, CartEntry, CostPolicy, PricedLine};
use shopkeep_core::{EntityRef, LineKind};
use shopkeep_db::Database;
use tracing::debug;

use crate::error::EngineResult;

/// Prices cart entries with one fixed [`CostPolicy`].
#[derive(Debug, Clone)]
pub struct LineItemPricer {
    db: Database,
    cost_policy: CostPolicy,
}

impl LineItemPricer {
    pub fn new(db: Database, cost_policy: CostPolicy) -> Self {
        LineItemPricer { db, cost_policy }
    }

    pub fn cost_policy(&self) -> CostPolicy {
        self.cost_policy
    }

    /// Prices one entry.
    ///
    /// ## Errors
    /// * `InvalidQuantity` - checked before any catalog lookup
    /// * `ProductNotFound` - no product under either identity scheme
    /// * `InsufficientStock` - tracked stock below the requested quantity
    /// * `InvalidPrice` - negative unit price or overflowing line total
    pub async fn price(&self, entry: &CartEntry) -> EngineResult<PricedLine> {
        entry.check_quantity()?;

        let product = match entry.kind {
            LineKind::Product => {
                let entity_ref = EntityRef::parse(&entry.reference);
                self.db.products().get(&entity_ref).await?
            }
            LineKind::Service => None,
        };

        let priced = pricing::price_line(entry, product.as_ref(), self.cost_policy)?;

        debug!(
            reference = %entry.reference,
            kind = ?entry.kind,
            quantity = entry.quantity,
            line_total_cents = priced.line.line_total_cents,
            "Priced line"
        );
        Ok(priced)
    }

    /// Prices a whole cart in order, stopping at the first failure.
    pub async fn price_cart(&self, cart: &[CartEntry]) -> EngineResult<Vec<PricedLine>> {
        let mut lines = Vec::with_capacity(cart.len());
        for entry in cart {
            lines.push(self.price(entry).await?);
        }
        Ok(lines)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
