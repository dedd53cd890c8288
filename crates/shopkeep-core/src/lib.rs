//! # shopkeep-core: Pure Business Logic for the Shopkeep engine
//!
//! Everything the sales & credit engine decides without touching storage
//! lives here: money arithmetic, identifier classification, line pricing and
//! balance settlement.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shopkeep Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Sales API / Payments API (callers)                 │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │          shopkeep-engine (coordinator, credit ledger)           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ shopkeep-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────────────┐  │   │
//! │  │   │  money   │ │ identity │ │ pricing  │ │   settlement     │  │   │
//! │  │   │  Money   │ │EntityRef │ │PricedLine│ │ paid/outstanding │  │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 shopkeep-db (Database Layer)                    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Customer, Sale, SaleLine, Payment, PaymentReceipt)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`identity`] - Dual-identity references and lookup filters
//! - [`pricing`] - Line-item pricing rules and cost policy
//! - [`settlement`] - Paid/outstanding/status derivation for credit sales
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use shopkeep_core::identity::{EntityRef, IdentityKind};
//! use shopkeep_core::money::Money;
//! use shopkeep_core::settlement::Settlement;
//!
//! let legacy = EntityRef::parse("1042");
//! assert_eq!(legacy.kind(), IdentityKind::LegacyNumeric);
//!
//! let opening = Settlement::opening(Money::from_cents(1500), true, Money::from_cents(500));
//! assert_eq!(opening.outstanding.cents(), 1000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod identity;
pub mod money;
pub mod pricing;
pub mod settlement;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use identity::{EntityRef, IdentityKind, LookupFilter, Resolution};
pub use money::Money;
pub use pricing::{CartEntry, CostPolicy, PricedLine};
pub use settlement::{OverpaymentPolicy, Settlement};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single sale.
///
/// ## Business Reason
/// Prevents runaway carts and keeps the embedded line array bounded.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line.
///
/// ## Business Reason
/// Catches accidental over-ordering (typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 9_999;
