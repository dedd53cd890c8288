//! # Validation Module
//!
//! Field-level input checks shared by the pricer, the coordinator and the
//! credit ledger.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Where each check runs                                                  │
//! │                                                                         │
//! │  create_sale     validate_quantity (per line)                          │
//! │                  validate_unit_price (per line)                        │
//! │                  validate_initial_paid │ validate_note                 │
//! │                                                                         │
//! │  record_payment  validate_payment_amount ─► validate_note              │
//! │                                                                         │
//! │  catalog insert  validate_sku ─► validate_product_name                 │
//! │                                                                         │
//! │  All of these run before a transaction is opened.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use shopkeep_core::validation::{validate_payment_amount, validate_quantity};
//! use shopkeep_core::Money;
//!
//! assert!(validate_quantity(5).is_ok());
//! assert!(validate_payment_amount(Money::zero()).is_err());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::MAX_ITEM_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest note accepted on a sale or a payment.
pub const MAX_NOTE_LEN: usize = 500;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU.
///
/// ## Rules
/// - Not empty after trimming, at most 50 characters
/// - Letters, digits, `-` and `_` only
///
/// ## Example
/// ```rust
/// use shopkeep_core::validation::validate_sku;
///
/// assert!(validate_sku("RICE-5KG").is_ok());
/// assert!(validate_sku("rice 5kg").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.chars().count() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a product or customer display name (1..=200 characters).
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates an optional free-text note.
pub fn validate_note(note: Option<&str>) -> ValidationResult<()> {
    match note {
        Some(text) if text.chars().count() > MAX_NOTE_LEN => Err(ValidationError::TooLong {
            field: "note".to_string(),
            max: MAX_NOTE_LEN,
        }),
        _ => Ok(()),
    }
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed [`MAX_ITEM_QUANTITY`]
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a unit price. Zero is allowed (free items, unpriced services).
///
/// ## Example
/// ```rust
/// use shopkeep_core::money::Money;
/// use shopkeep_core::validation::validate_unit_price;
///
/// assert!(validate_unit_price(Money::from_cents(0)).is_ok());
/// assert!(validate_unit_price(Money::from_cents(-1)).is_err());
/// ```
pub fn validate_unit_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: "unit price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a payment amount. Must be strictly positive.
pub fn validate_payment_amount(amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "payment amount".to_string(),
        });
    }

    Ok(())
}

/// Validates the amount paid up front on a sale. Zero is allowed.
pub fn validate_initial_paid(amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: "initial paid amount".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
