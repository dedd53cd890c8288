//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE BALANCE PROBLEM                                                    │
//! │                                                                         │
//! │  A credit sale must satisfy, forever:                                   │
//! │    paid_amount + outstanding_amount == total                            │
//! │                                                                         │
//! │  With floats, 0.1 + 0.2 != 0.3 and the equation drifts after a few      │
//! │  partial payments. With integer minor units it is exact.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use shopkeep_core::money::Money;
//!
//! let price = Money::from_cents(500);
//! let line = price.checked_mul_quantity(3).unwrap();
//! assert_eq!(line.cents(), 1500);
//!
//! let outstanding = (line - Money::from_cents(2000)).clamp_non_negative();
//! assert!(outstanding.is_zero());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// Signed so that intermediate results such as `outstanding - amount` can be
/// represented before clamping.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// `max(0, self)`.
    ///
    /// ## Example
    /// ```rust
    /// use shopkeep_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(-250).clamp_non_negative(), Money::zero());
    /// assert_eq!(Money::from_cents(250).clamp_non_negative().cents(), 250);
    /// ```
    #[inline]
    pub fn clamp_non_negative(self) -> Self {
        Money(self.0.max(0))
    }

    /// Multiplies a unit price by a quantity, returning `None` on overflow.
    ///
    /// ## User Workflow
    /// ```text
    /// Product: Coca-Cola $2.99
    /// Quantity: 3
    ///      │
    ///      ▼
    /// checked_mul_quantity(3) ← THIS FUNCTION
    ///      │
    ///      ▼
    /// Line Total: $8.97
    /// ```
    #[inline]
    pub fn checked_mul_quantity(&self, qty: i64) -> Option<Self> {
        self.0.checked_mul(qty).map(Money)
    }

    /// Adds two amounts, returning `None` on overflow.
    #[inline]
    pub fn checked_add(&self, other: Money) -> Option<Self> {
        self.0.checked_add(other.0).map(Money)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-friendly rendering (`$12.34`, `-$5.50`). UI formatting lives with
/// the caller.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}${}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
