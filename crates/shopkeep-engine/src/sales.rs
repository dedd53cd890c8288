//! # Sale Transaction Coordinator
//!
//! Creates a sale from a cart as one unit of work.
//!
//! ## Sale Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          create_sale                                    │
//! │                                                                         │
//! │  1. Validate cart shape, initial paid, notes        (no I/O)           │
//! │  2. Price every entry                                (catalog reads)    │
//! │  3. Totals + opening settlement                      (no I/O)           │
//! │  4. Link customer                                    (best-effort)      │
//! │  ─────────────────────── BEGIN ───────────────────────                  │
//! │  5. INSERT sale with embedded lines                                     │
//! │  6. Decrement stock per product line (stock policy)                     │
//! │  ─────────────────────── COMMIT ──────────────────────                  │
//! │  Any failure between BEGIN and COMMIT rolls everything back.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Steps 1-4 hold no connection across the transaction, so the coordinator
//! also works on a single-connection in-memory database.

use serde::{Deserialize, Serialize};
use shopkeep_core::pricing::{self, CartEntry, PricedLine};
use shopkeep_core::settlement::Settlement;
use shopkeep_core::validation::{validate_initial_paid, validate_note};
use shopkeep_core::{CoreError, Money, Product, Sale, MAX_CART_ITEMS};
use shopkeep_db::{Database, DbError, ProductRepository, SaleRepository, StockDecrement};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::{EngineConfig, StockPolicy};
use crate::directory::{self, CustomerLink};
use crate::error::{EngineError, EngineResult};
use crate::pricer::LineItemPricer;

/// Sale-level options supplied alongside the cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleOptions {
    /// Customer reference in either identity scheme.
    pub customer_ref: Option<String>,
    pub on_credit: bool,
    /// Amount paid up front. Only meaningful for credit sales.
    pub initial_paid: Money,
    pub notes: Option<String>,
}

impl SaleOptions {
    /// A sale paid in full at the counter.
    pub fn cash() -> Self {
        SaleOptions::default()
    }

    /// A credit sale with `initial_paid` received up front.
    pub fn credit(initial_paid: Money) -> Self {
        SaleOptions {
            on_credit: true,
            initial_paid,
            ..SaleOptions::default()
        }
    }

    pub fn customer(mut self, reference: impl Into<String>) -> Self {
        self.customer_ref = Some(reference.into());
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Creates sales atomically.
#[derive(Debug, Clone)]
pub struct SaleCoordinator {
    db: Database,
    pricer: LineItemPricer,
    stock_policy: StockPolicy,
}

impl SaleCoordinator {
    pub fn new(db: Database, config: EngineConfig) -> Self {
        SaleCoordinator {
            pricer: LineItemPricer::new(db.clone(), config.cost_policy),
            db,
            stock_policy: config.stock_policy,
        }
    }

    pub fn pricer(&self) -> &LineItemPricer {
        &self.pricer
    }

    /// Creates a sale with all of its lines.
    ///
    /// On success the sale is stored and every tracked product line's stock
    /// has dropped by its quantity. On failure nothing was written.
    ///
    /// ## Errors
    /// * `EmptyCart`, `CartTooLarge`, `InvalidAmount` - checked first, in that order
    /// * Pricer errors (`InvalidQuantity`, `ProductNotFound`, `InsufficientStock`, `InvalidPrice`)
    /// * `InsufficientStock` - under [`StockPolicy::Strict`], when a concurrent sale
    ///   took the stock after pricing
    /// * `TransactionAborted` - storage failure inside the unit of work
    pub async fn create_sale(&self, cart: &[CartEntry], options: SaleOptions) -> EngineResult<Sale> {
        if cart.is_empty() {
            return Err(CoreError::EmptyCart.into());
        }
        if cart.len() > MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            }
            .into());
        }
        validate_initial_paid(options.initial_paid).map_err(|e| CoreError::InvalidAmount {
            reason: e.to_string(),
        })?;
        validate_note(options.notes.as_deref())?;

        let lines = self.pricer.price_cart(cart).await?;
        let (total, total_items) = pricing::summarize(&lines)?;
        let settlement = Settlement::opening(total, options.on_credit, options.initial_paid);

        let customer = match options.customer_ref.as_deref() {
            Some(raw) => directory::link_customer(&self.db, raw).await,
            None => CustomerLink::default(),
        };

        let now = crate::now();
        let mut sale = Sale {
            id: Uuid::new_v4().to_string(),
            legacy_id: None,
            items: lines.iter().map(|priced| priced.line.clone()).collect(),
            customer_id: customer.id,
            customer_legacy_id: customer.legacy_id,
            customer_name: None,
            total_cents: total.cents(),
            total_items,
            on_credit: options.on_credit,
            paid_amount_cents: settlement.paid.cents(),
            outstanding_amount_cents: settlement.outstanding.cents(),
            status: settlement.status,
            notes: options.notes,
            created_at: now,
            updated_at: now,
        };

        self.persist(&sale, &lines).await?;

        info!(
            sale_id = %sale.id,
            lines = sale.items.len(),
            total_cents = sale.total_cents,
            on_credit = sale.on_credit,
            status = sale.status.as_str(),
            "Sale created"
        );

        sale.customer_name = customer.name;
        Ok(sale)
    }

    /// Writes the sale and its stock movements in one transaction.
    async fn persist(&self, sale: &Sale, lines: &[PricedLine]) -> EngineResult<()> {
        let abort = |e: DbError| EngineError::aborted("create_sale", e);

        let mut tx = self.db.begin().await.map_err(abort)?;

        SaleRepository::insert(&mut *tx, sale).await.map_err(abort)?;

        for priced in lines {
            let Some(product_ref) = priced.line.product_ref() else {
                continue;
            };
            let quantity = priced.line.quantity;

            match self.stock_policy {
                StockPolicy::Advisory => {
                    let remaining = ProductRepository::adjust_stock(
                        &mut *tx,
                        &product_ref,
                        -quantity,
                        sale.created_at,
                    )
                    .await
                    .map_err(abort)?;

                    match remaining {
                        Some(level) if level < 0 => warn!(
                            sale_id = %sale.id,
                            product = %priced.line.name_snapshot,
                            stock = level,
                            "Stock went negative; oversold"
                        ),
                        Some(_) => {}
                        // Tracked at pricing but no row matched now.
                        None if priced.product.as_ref().is_some_and(Product::tracks_stock) => {
                            return Err(CoreError::ProductNotFound(product_ref.to_string()).into());
                        }
                        None => {}
                    }
                }
                StockPolicy::Strict => {
                    let outcome = ProductRepository::decrement_stock_checked(
                        &mut *tx,
                        &product_ref,
                        quantity,
                        sale.created_at,
                    )
                    .await
                    .map_err(abort)?;

                    match outcome {
                        StockDecrement::Applied { .. } | StockDecrement::Untracked => {}
                        StockDecrement::Insufficient { available } => {
                            warn!(
                                sale_id = %sale.id,
                                product = %priced.line.name_snapshot,
                                available,
                                requested = quantity,
                                "Stock taken by a concurrent sale; rolling back"
                            );
                            return Err(CoreError::InsufficientStock {
                                product: priced.line.name_snapshot.clone(),
                                available,
                                requested: quantity,
                            }
                            .into());
                        }
                        StockDecrement::Missing => {
                            return Err(CoreError::ProductNotFound(product_ref.to_string()).into());
                        }
                    }
                }
            }
        }

        tx.commit().await.map_err(|e| abort(e.into()))?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
