//! # Credit Ledger
//!
//! Records payments against credit sales.
//!
//! ## Payment Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         record_payment                                  │
//! │                                                                         │
//! │  amount > 0? ──► resolve sale ──► on credit?                            │
//! │  ─────────────────────── BEGIN ───────────────────────                  │
//! │  lock_for_update(sale)     write lock taken before reading              │
//! │  re-read sale              sees every committed payment                 │
//! │  apply_payment             overpayment policy                           │
//! │  update_settlement + INSERT payment                                     │
//! │  ─────────────────────── COMMIT ──────────────────────                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Two payments on the same sale queue on the SQLite write lock, so neither
//! can compute its new balance from a stale read.

use shopkeep_core::settlement::OverpaymentPolicy;
use shopkeep_core::validation::{validate_note, validate_payment_amount};
use shopkeep_core::{CoreError, EntityRef, Money, Payment, PaymentReceipt, Sale};
use shopkeep_db::{Database, DbError, PaymentRepository, SaleRepository};
use tracing::info;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::directory;
use crate::error::{EngineError, EngineResult};

/// Applies payments to credit sales, one transaction per payment.
#[derive(Debug, Clone)]
pub struct CreditLedger {
    db: Database,
    overpayment_policy: OverpaymentPolicy,
}

impl CreditLedger {
    pub fn new(db: Database, config: EngineConfig) -> Self {
        CreditLedger {
            db,
            overpayment_policy: config.overpayment_policy,
        }
    }

    /// Records one payment against a credit sale.
    ///
    /// ## Errors
    /// * `InvalidAmount` - amount is zero or negative
    /// * `SaleNotFound` - no sale under either identity scheme
    /// * `NotOnCredit` - the sale was paid in full at creation
    /// * `SaleAlreadyPaid`, `Overpayment` - only under [`OverpaymentPolicy::Reject`]
    /// * `TransactionAborted` - storage failure inside the unit of work
    pub async fn record_payment(
        &self,
        sale_ref: &str,
        amount: Money,
        note: Option<String>,
    ) -> EngineResult<PaymentReceipt> {
        validate_payment_amount(amount).map_err(|e| CoreError::InvalidAmount {
            reason: e.to_string(),
        })?;
        validate_note(note.as_deref())?;

        let entity_ref = EntityRef::parse(sale_ref);
        let sale = self
            .db
            .sales()
            .get(&entity_ref)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_ref.to_string()))?;
        if !sale.on_credit {
            return Err(CoreError::NotOnCredit(sale_ref.to_string()).into());
        }

        let (payment, mut sale) = self.apply(sale_ref, &sale.id, amount, note).await?;

        info!(
            sale_id = %sale.id,
            payment_id = %payment.id,
            amount_cents = payment.amount_cents,
            outstanding_cents = sale.outstanding_amount_cents,
            status = sale.status.as_str(),
            "Payment recorded"
        );

        directory::attach_customer_name(&self.db, &mut sale).await;
        Ok(PaymentReceipt { payment, sale })
    }

    /// The locked read-modify-write. Returns the new payment and the sale
    /// as committed.
    async fn apply(
        &self,
        sale_ref: &str,
        sale_id: &str,
        amount: Money,
        note: Option<String>,
    ) -> EngineResult<(Payment, Sale)> {
        let abort = |e: DbError| EngineError::aborted("record_payment", e);

        let mut tx = self.db.begin().await.map_err(abort)?;

        if !SaleRepository::lock_for_update(&mut *tx, sale_id)
            .await
            .map_err(abort)?
        {
            return Err(CoreError::SaleNotFound(sale_ref.to_string()).into());
        }

        let mut sale = SaleRepository::find(&mut *tx, &EntityRef::from_native_id(sale_id))
            .await
            .map_err(abort)?
            .ok_or_else(|| CoreError::SaleNotFound(sale_ref.to_string()))?;
        if !sale.on_credit {
            return Err(CoreError::NotOnCredit(sale_ref.to_string()).into());
        }

        let settlement = sale
            .settlement()
            .apply_payment(sale_ref, amount, self.overpayment_policy)?;
        let now = crate::now();

        SaleRepository::update_settlement(&mut *tx, &sale.id, &settlement, now)
            .await
            .map_err(abort)?;

        let payment = Payment {
            id: Uuid::new_v4().to_string(),
            legacy_id: None,
            sale_id: sale.id.clone(),
            sale_legacy_id: sale.legacy_id,
            customer_id: sale.customer_id.clone(),
            customer_legacy_id: sale.customer_legacy_id,
            amount_cents: amount.cents(),
            note,
            created_at: now,
        };
        PaymentRepository::insert(&mut *tx, &payment)
            .await
            .map_err(abort)?;

        tx.commit().await.map_err(|e| abort(e.into()))?;

        sale.paid_amount_cents = settlement.paid.cents();
        sale.outstanding_amount_cents = settlement.outstanding.cents();
        sale.status = settlement.status;
        sale.updated_at = now;

        Ok((payment, sale))
    }

    /// Payments of a sale, oldest first.
    pub async fn payments_for(&self, sale_ref: &str) -> EngineResult<Vec<Payment>> {
        let sale = self.find_sale(sale_ref).await?;
        let payments = PaymentRepository::list_for_sale(self.db.pool(), &sale.id).await?;
        Ok(payments)
    }

    /// A sale by reference, with the customer name attached when known.
    pub async fn get_sale(&self, sale_ref: &str) -> EngineResult<Sale> {
        let mut sale = self.find_sale(sale_ref).await?;
        directory::attach_customer_name(&self.db, &mut sale).await;
        Ok(sale)
    }

    async fn find_sale(&self, sale_ref: &str) -> EngineResult<Sale> {
        let sale = self
            .db
            .sales()
            .get(&EntityRef::parse(sale_ref))
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_ref.to_string()))?;
        Ok(sale)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sales::{SaleCoordinator, SaleOptions};
    use crate::testing;
    use shopkeep_core::{CartEntry, PaymentStatus};

    async fn credit_sale(db: &Database, total: i64, initial: i64) -> Sale {
        SaleCoordinator::new(db.clone(), EngineConfig::default())
            .create_sale(
                &[CartEntry::service("layaway", 1).with_unit_price(Money::from_cents(total))],
                SaleOptions::credit(Money::from_cents(initial)),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_rejects_non_positive_amounts() {
        let db = testing::database().await;
        let sale = credit_sale(&db, 1000, 0).await;
        let ledger = CreditLedger::new(db.clone(), EngineConfig::default());

        for cents in [0, -100] {
            let err = ledger
                .record_payment(&sale.id, Money::from_cents(cents), None)
                .await
                .unwrap_err();
            assert!(matches!(err, EngineError::Domain(CoreError::InvalidAmount { .. })));
        }
        assert_eq!(db.payments().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_sale() {
        let db = testing::database().await;
        let ledger = CreditLedger::new(db, EngineConfig::default());

        for raw in ["550e8400-e29b-41d4-a716-446655440000", "12", "junk"] {
            let err = ledger
                .record_payment(raw, Money::from_cents(100), None)
                .await
                .unwrap_err();
            assert!(matches!(err, EngineError::Domain(CoreError::SaleNotFound(ref r)) if r == raw));
        }
    }

    #[tokio::test]
    async fn test_partial_then_full_payment() {
        let db = testing::database().await;
        let sale = credit_sale(&db, 1500, 500).await;
        let ledger = CreditLedger::new(db.clone(), EngineConfig::default());

        let first = ledger
            .record_payment(&sale.id, Money::from_cents(400), Some("cash".into()))
            .await
            .unwrap();
        assert_eq!(first.sale.paid_amount_cents, 900);
        assert_eq!(first.sale.outstanding_amount_cents, 600);
        assert_eq!(first.sale.status, PaymentStatus::PartiallyPaid);
        assert_eq!(first.payment.note.as_deref(), Some("cash"));

        let second = ledger
            .record_payment(&sale.id, Money::from_cents(600), None)
            .await
            .unwrap();
        assert_eq!(second.sale.status, PaymentStatus::Paid);
        assert_eq!(second.sale.outstanding_amount_cents, 0);

        let stored = ledger.get_sale(&sale.id).await.unwrap();
        assert_eq!(stored.settlement(), second.sale.settlement());

        let payments = ledger.payments_for(&sale.id).await.unwrap();
        let amounts: Vec<i64> = payments.iter().map(|p| p.amount_cents).collect();
        assert_eq!(amounts, vec![400, 600]);
        assert_eq!(
            payments.iter().map(|p| p.amount_cents).sum::<i64>(),
            stored.paid_amount_cents - 500
        );
    }

    #[tokio::test]
    async fn test_reject_policy_guards_total() {
        let db = testing::database().await;
        let sale = credit_sale(&db, 1000, 0).await;
        let ledger = CreditLedger::new(db.clone(), EngineConfig::default());

        let err = ledger
            .record_payment(&sale.id, Money::from_cents(1001), None)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Domain(CoreError::Overpayment { .. })));

        ledger
            .record_payment(&sale.id, Money::from_cents(1000), None)
            .await
            .unwrap();
        let err = ledger
            .record_payment(&sale.id, Money::from_cents(1), None)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Domain(CoreError::SaleAlreadyPaid(_))));
        assert_eq!(db.payments().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_accept_policy_lets_paid_exceed_total() {
        let db = testing::database().await;
        let sale = credit_sale(&db, 1000, 0).await;
        let ledger = CreditLedger::new(
            db.clone(),
            EngineConfig::default().with_overpayment_policy(OverpaymentPolicy::Accept),
        );

        let receipt = ledger
            .record_payment(&sale.id, Money::from_cents(1200), None)
            .await
            .unwrap();
        assert_eq!(receipt.sale.paid_amount_cents, 1200);
        assert_eq!(receipt.sale.outstanding_amount_cents, 0);
        assert_eq!(receipt.sale.status, PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn test_payment_copies_customer_keys() {
        let db = testing::database().await;
        let customer = testing::customer(&db, Some(31), "Hana Sato").await;
        let sale = SaleCoordinator::new(db.clone(), EngineConfig::default())
            .create_sale(
                &[CartEntry::service("tab", 1).with_unit_price(Money::from_cents(700))],
                SaleOptions::credit(Money::zero()).customer(&customer.id),
            )
            .await
            .unwrap();

        let receipt = CreditLedger::new(db, EngineConfig::default())
            .record_payment(&sale.id, Money::from_cents(300), None)
            .await
            .unwrap();

        assert_eq!(receipt.payment.customer_id.as_deref(), Some(customer.id.as_str()));
        assert_eq!(receipt.payment.customer_legacy_id, Some(31));
        assert_eq!(receipt.payment.sale_id, sale.id);
        assert_eq!(receipt.sale.customer_name.as_deref(), Some("Hana Sato"));
    }
}
