//! # Error Types
//!
//! Domain-specific error types for shopkeep-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  shopkeep-core errors (this file)                                      │
//! │  ├── CoreError        - Validation & business-rule failures            │
//! │  └── ValidationError  - Field-level input failures                     │
//! │                                                                         │
//! │  shopkeep-db errors (separate crate)                                   │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  shopkeep-engine errors                                                │
//! │  └── EngineError      - What Sales/Payments API callers see            │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError ← DbError             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant here is raised before any write happens, so callers can
//! treat all of them as "nothing changed".

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// The cart submitted for a sale has no entries.
    #[error("Cart is empty")]
    EmptyCart,

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// A line quantity is zero, negative or above the per-line maximum.
    #[error("Invalid quantity {quantity} for {reference}")]
    InvalidQuantity { reference: String, quantity: i64 },

    /// A unit price is negative, or the line total does not fit in Money.
    #[error("Invalid price for {reference}: {reason}")]
    InvalidPrice { reference: String, reason: String },

    /// A payment (or initial paid) amount is not strictly positive.
    #[error("Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    /// Product cannot be found by any identity scheme.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Insufficient stock to complete sale.
    ///
    /// ## User Workflow
    /// ```text
    /// Cart line (qty: 5)
    ///      │
    ///      ▼
    /// Check stock: available=2
    ///      │
    ///      ▼
    /// InsufficientStock { product: "COKE", available: 2, requested: 5 }
    /// ```
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// Sale not found.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Payment attempted against a sale that was not sold on credit.
    #[error("Sale {0} is not on credit")]
    NotOnCredit(String),

    /// Payment attempted against a sale whose balance is already settled.
    #[error("Sale {0} is already paid")]
    SaleAlreadyPaid(String),

    /// Payment larger than the remaining balance.
    #[error("Payment of {amount} exceeds outstanding balance {outstanding} on sale {sale_id}")]
    Overpayment {
        sale_id: String,
        amount: Money,
        outstanding: Money,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// True for caller-fixable input errors (as opposed to business rules).
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CoreError::EmptyCart
                | CoreError::CartTooLarge { .. }
                | CoreError::InvalidQuantity { .. }
                | CoreError::InvalidPrice { .. }
                | CoreError::InvalidAmount { .. }
                | CoreError::Validation(_)
        )
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., unknown policy name).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
