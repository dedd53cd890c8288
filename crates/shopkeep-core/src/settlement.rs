//! # Settlement
//!
//! Paid / outstanding / status arithmetic for sales.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Opening a sale                                                         │
//! │                                                                         │
//! │                    on_credit = false         on_credit = true           │
//! │  paid              total                     min(initial, total)        │
//! │  outstanding       0                         max(0, total - paid)       │
//! │                                                                         │
//! │  Applying a payment (credit sales only)                                 │
//! │                                                                         │
//! │  paid'        = paid + amount                                           │
//! │  outstanding' = max(0, outstanding - amount)                            │
//! │                                                                         │
//! │  Status                                                                 │
//! │  outstanding == 0            → paid                                     │
//! │  outstanding > 0, paid > 0   → partially_paid                           │
//! │  outstanding > 0, paid == 0  → pending                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::PaymentStatus;

// =============================================================================
// Overpayment Policy
// =============================================================================

/// What the ledger does with a payment that would take `paid` past `total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverpaymentPolicy {
    /// Refuse payments on settled sales and payments above the balance.
    #[default]
    Reject,
    /// Accept any positive payment; `paid` grows, `outstanding` stops at 0.
    Accept,
}

impl OverpaymentPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverpaymentPolicy::Reject => "reject",
            OverpaymentPolicy::Accept => "accept",
        }
    }
}

impl fmt::Display for OverpaymentPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OverpaymentPolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(OverpaymentPolicy::Reject),
            "accept" => Ok(OverpaymentPolicy::Accept),
            other => Err(ValidationError::InvalidFormat {
                field: "overpayment policy".to_string(),
                reason: format!("expected 'reject' or 'accept', got '{}'", other),
            }),
        }
    }
}

// =============================================================================
// Status Derivation
// =============================================================================

impl PaymentStatus {
    /// Derives the status from a balance.
    ///
    /// ## Example
    /// ```rust
    /// use shopkeep_core::{Money, PaymentStatus};
    ///
    /// let status = PaymentStatus::derive(Money::from_cents(500), Money::from_cents(1000));
    /// assert_eq!(status, PaymentStatus::PartiallyPaid);
    /// ```
    pub fn derive(paid: Money, outstanding: Money) -> Self {
        if !outstanding.is_positive() {
            PaymentStatus::Paid
        } else if paid.is_positive() {
            PaymentStatus::PartiallyPaid
        } else {
            PaymentStatus::Pending
        }
    }
}

// =============================================================================
// Settlement
// =============================================================================

/// Balance of a sale at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub paid: Money,
    pub outstanding: Money,
    pub status: PaymentStatus,
}

impl Settlement {
    /// Balance of a freshly created sale.
    ///
    /// `initial_paid` is ignored for cash sales and capped at `total` for
    /// credit sales. Negative amounts are rejected earlier by
    /// [`validate_initial_paid`](crate::validation::validate_initial_paid).
    pub fn opening(total: Money, on_credit: bool, initial_paid: Money) -> Self {
        let (paid, outstanding) = if on_credit {
            let paid = initial_paid.min(total).clamp_non_negative();
            (paid, (total - paid).clamp_non_negative())
        } else {
            (total, Money::zero())
        };

        Settlement {
            paid,
            outstanding,
            status: PaymentStatus::derive(paid, outstanding),
        }
    }

    #[inline]
    pub fn is_settled(&self) -> bool {
        self.status == PaymentStatus::Paid
    }

    /// Applies one payment to this balance.
    ///
    /// Under [`OverpaymentPolicy::Reject`], a settled sale fails with
    /// `SaleAlreadyPaid` and an amount above `outstanding` fails with
    /// `Overpayment`. Under `Accept` neither check runs.
    ///
    /// ## Example
    /// ```rust
    /// use shopkeep_core::settlement::{OverpaymentPolicy, Settlement};
    /// use shopkeep_core::{Money, PaymentStatus};
    ///
    /// let open = Settlement::opening(Money::from_cents(1500), true, Money::from_cents(500));
    /// let next = open
    ///     .apply_payment("sale-1", Money::from_cents(1000), OverpaymentPolicy::Reject)
    ///     .unwrap();
    /// assert_eq!(next.paid.cents(), 1500);
    /// assert_eq!(next.status, PaymentStatus::Paid);
    /// ```
    pub fn apply_payment(
        &self,
        sale_id: &str,
        amount: Money,
        policy: OverpaymentPolicy,
    ) -> CoreResult<Settlement> {
        if !amount.is_positive() {
            return Err(CoreError::InvalidAmount {
                reason: format!("payment must be positive, got {}", amount),
            });
        }

        if policy == OverpaymentPolicy::Reject {
            if self.is_settled() {
                return Err(CoreError::SaleAlreadyPaid(sale_id.to_string()));
            }
            if amount > self.outstanding {
                return Err(CoreError::Overpayment {
                    sale_id: sale_id.to_string(),
                    amount,
                    outstanding: self.outstanding,
                });
            }
        }

        let paid = self
            .paid
            .checked_add(amount)
            .ok_or_else(|| CoreError::InvalidAmount {
                reason: "paid amount overflows".to_string(),
            })?;
        let outstanding = (self.outstanding - amount).clamp_non_negative();

        Ok(Settlement {
            paid,
            outstanding,
            status: PaymentStatus::derive(paid, outstanding),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn cents(c: i64) -> Money {
        Money::from_cents(c)
    }

    #[test]
    fn test_cash_sale_is_paid_in_full() {
        let s = Settlement::opening(cents(1500), false, cents(200));
        assert_eq!(s.paid, cents(1500));
        assert_eq!(s.outstanding, Money::zero());
        assert_eq!(s.status, PaymentStatus::Paid);
    }

    #[test]
    fn test_credit_sale_opening_states() {
        let partial = Settlement::opening(cents(1500), true, cents(500));
        assert_eq!(partial.paid, cents(500));
        assert_eq!(partial.outstanding, cents(1000));
        assert_eq!(partial.status, PaymentStatus::PartiallyPaid);

        let pending = Settlement::opening(cents(1500), true, Money::zero());
        assert_eq!(pending.status, PaymentStatus::Pending);

        // Initial payment is capped at the total.
        let capped = Settlement::opening(cents(1500), true, cents(9000));
        assert_eq!(capped.paid, cents(1500));
        assert_eq!(capped.outstanding, Money::zero());
        assert_eq!(capped.status, PaymentStatus::Paid);
    }

    #[test]
    fn test_zero_total_credit_sale_is_paid() {
        let s = Settlement::opening(Money::zero(), true, Money::zero());
        assert_eq!(s.status, PaymentStatus::Paid);
    }

    #[test]
    fn test_partial_then_full_payment() {
        let open = Settlement::opening(cents(1500), true, Money::zero());
        let first = open
            .apply_payment("s", cents(400), OverpaymentPolicy::Reject)
            .unwrap();
        assert_eq!(first.status, PaymentStatus::PartiallyPaid);
        assert_eq!(first.paid + first.outstanding, cents(1500));

        let second = first
            .apply_payment("s", cents(1100), OverpaymentPolicy::Reject)
            .unwrap();
        assert!(second.is_settled());
        assert_eq!(second.paid, cents(1500));
    }

    #[test]
    fn test_reject_policy_guards() {
        let open = Settlement::opening(cents(1000), true, Money::zero());
        assert_eq!(
            open.apply_payment("s-9", cents(1001), OverpaymentPolicy::Reject),
            Err(CoreError::Overpayment {
                sale_id: "s-9".to_string(),
                amount: cents(1001),
                outstanding: cents(1000),
            })
        );

        let paid = Settlement::opening(cents(1000), false, Money::zero());
        assert_eq!(
            paid.apply_payment("s-9", cents(1), OverpaymentPolicy::Reject),
            Err(CoreError::SaleAlreadyPaid("s-9".to_string()))
        );
    }

    #[test]
    fn test_accept_policy_clamps_outstanding() {
        let open = Settlement::opening(cents(1000), true, cents(600));
        let over = open
            .apply_payment("s", cents(700), OverpaymentPolicy::Accept)
            .unwrap();
        assert_eq!(over.paid, cents(1300));
        assert_eq!(over.outstanding, Money::zero());
        assert_eq!(over.status, PaymentStatus::Paid);

        let again = over
            .apply_payment("s", cents(50), OverpaymentPolicy::Accept)
            .unwrap();
        assert_eq!(again.paid, cents(1350));
        assert_eq!(again.outstanding, Money::zero());
    }

    #[test]
    fn test_non_positive_amount_is_rejected_under_any_policy() {
        let open = Settlement::opening(cents(1000), true, Money::zero());
        for policy in [OverpaymentPolicy::Reject, OverpaymentPolicy::Accept] {
            assert!(matches!(
                open.apply_payment("s", Money::zero(), policy),
                Err(CoreError::InvalidAmount { .. })
            ));
        }
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("reject".parse(), Ok(OverpaymentPolicy::Reject));
        assert_eq!(" Accept ".parse(), Ok(OverpaymentPolicy::Accept));
        assert!("maybe".parse::<OverpaymentPolicy>().is_err());
    }
}
