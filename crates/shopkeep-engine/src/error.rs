//! # Engine Error Type
//!
//! What Sales and Payments API callers see when an operation fails.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Shopkeep                               │
//! │                                                                         │
//! │  create_sale / record_payment                                           │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Input or rule broken? ─── CoreError ───────────────┐                  │
//! │         │                                           │                  │
//! │         ▼                                           ▼                  │
//! │  Storage failed inside the tx? ── DbError ──► EngineError ──► caller   │
//! │         │                    (TransactionAborted)   ▲                  │
//! │         ▼                                           │                  │
//! │  Storage failed outside a tx? ── DbError ───────────┘                  │
//! │                              (Storage)                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`EngineError::kind`] groups every failure into validation, business rule
//! or infrastructure. Only infrastructure failures are worth retrying, and
//! none of them leave partial writes behind.

use serde::Serialize;
use shopkeep_core::CoreError;
use shopkeep_db::DbError;
use thiserror::Error;
use tracing::error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Engine operation errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Input validation or business-rule failure. Nothing was written.
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// A storage call failed inside a unit of work; it was rolled back.
    #[error("Transaction aborted during {operation}: {source}")]
    TransactionAborted {
        operation: &'static str,
        #[source]
        source: DbError,
    },

    /// A storage call failed outside any unit of work.
    #[error("Storage error: {0}")]
    Storage(#[from] DbError),

    /// An engine policy could not be parsed.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Coarse classification of an [`EngineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The caller sent something invalid.
    Validation,
    /// The request was well-formed but the current state refuses it.
    BusinessRule,
    /// Storage or configuration failed.
    Infrastructure,
}

/// Machine-readable error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    EmptyCart,
    CartTooLarge,
    InvalidQuantity,
    InvalidPrice,
    InvalidAmount,
    ValidationError,
    ProductNotFound,
    InsufficientStock,
    SaleNotFound,
    NotOnCredit,
    SaleAlreadyPaid,
    Overpayment,
    TransactionAborted,
    DatabaseError,
    ConfigError,
}

/// Serializable error body handed to API callers.
///
/// ```json
/// { "code": "NOT_ON_CREDIT", "kind": "business_rule", "message": "Sale 42 is not on credit" }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub kind: ErrorKind,
    pub message: String,
    pub retryable: bool,
}

impl EngineError {
    /// Wraps a storage failure from inside a transaction.
    pub fn aborted(operation: &'static str, source: DbError) -> Self {
        error!(operation, error = %source, "Transaction aborted");
        EngineError::TransactionAborted { operation, source }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Domain(e) if e.is_validation() => ErrorKind::Validation,
            EngineError::Domain(_) => ErrorKind::BusinessRule,
            EngineError::TransactionAborted { .. }
            | EngineError::Storage(_)
            | EngineError::Config(_) => ErrorKind::Infrastructure,
        }
    }

    /// Whether the whole operation may simply be tried again.
    ///
    /// Aborted transactions left no trace, so they always qualify. Other
    /// storage failures only when the cause is transient (lock contention,
    /// exhausted pool, lost connection).
    pub fn is_retryable(&self) -> bool {
        match self {
            EngineError::TransactionAborted { .. } => true,
            EngineError::Storage(e) => e.is_transient(),
            EngineError::Domain(_) | EngineError::Config(_) => false,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            EngineError::Domain(e) => match e {
                CoreError::EmptyCart => ErrorCode::EmptyCart,
                CoreError::CartTooLarge { .. } => ErrorCode::CartTooLarge,
                CoreError::InvalidQuantity { .. } => ErrorCode::InvalidQuantity,
                CoreError::InvalidPrice { .. } => ErrorCode::InvalidPrice,
                CoreError::InvalidAmount { .. } => ErrorCode::InvalidAmount,
                CoreError::Validation(_) => ErrorCode::ValidationError,
                CoreError::ProductNotFound(_) => ErrorCode::ProductNotFound,
                CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
                CoreError::SaleNotFound(_) => ErrorCode::SaleNotFound,
                CoreError::NotOnCredit(_) => ErrorCode::NotOnCredit,
                CoreError::SaleAlreadyPaid(_) => ErrorCode::SaleAlreadyPaid,
                CoreError::Overpayment { .. } => ErrorCode::Overpayment,
            },
            EngineError::TransactionAborted { .. } => ErrorCode::TransactionAborted,
            EngineError::Storage(_) => ErrorCode::DatabaseError,
            EngineError::Config(_) => ErrorCode::ConfigError,
        }
    }

    /// The underlying domain error, if this is one.
    pub fn as_domain(&self) -> Option<&CoreError> {
        match self {
            EngineError::Domain(e) => Some(e),
            _ => None,
        }
    }

    /// Storage details stay in the logs; callers get a generic message.
    pub fn to_body(&self) -> ErrorBody {
        let message = match self {
            EngineError::Storage(_) => "Database operation failed".to_string(),
            EngineError::TransactionAborted { operation, .. } => {
                format!("{} failed and was rolled back", operation)
            }
            other => other.to_string(),
        };

        ErrorBody {
            code: self.code(),
            kind: self.kind(),
            message,
            retryable: self.is_retryable(),
        }
    }
}

impl From<shopkeep_core::ValidationError> for EngineError {
    fn from(err: shopkeep_core::ValidationError) -> Self {
        EngineError::Domain(CoreError::Validation(err))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use shopkeep_core::Money;

    #[test]
    fn test_kinds() {
        assert_eq!(
            EngineError::from(CoreError::EmptyCart).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            EngineError::from(CoreError::NotOnCredit("42".into())).kind(),
            ErrorKind::BusinessRule
        );
        assert_eq!(
            EngineError::from(DbError::PoolExhausted).kind(),
            ErrorKind::Infrastructure
        );
    }

    #[test]
    fn test_retryable() {
        let aborted = EngineError::TransactionAborted {
            operation: "create_sale",
            source: DbError::QueryFailed("disk I/O error".into()),
        };
        assert!(aborted.is_retryable());
        assert!(EngineError::Storage(DbError::Busy("database is locked".into())).is_retryable());
        assert!(!EngineError::Storage(DbError::InvalidData("bad row".into())).is_retryable());
        assert!(!EngineError::from(CoreError::SaleAlreadyPaid("1".into())).is_retryable());
    }

    #[test]
    fn test_body_hides_storage_details() {
        let err = EngineError::Storage(DbError::QueryFailed("no such table: sales".into()));
        let body = err.to_body();
        assert_eq!(body.code, ErrorCode::DatabaseError);
        assert!(!body.message.contains("sales"));

        let err = EngineError::from(CoreError::Overpayment {
            sale_id: "7".into(),
            amount: Money::from_cents(500),
            outstanding: Money::from_cents(200),
        });
        let json = serde_json::to_value(err.to_body()).unwrap();
        assert_eq!(json["code"], "OVERPAYMENT");
        assert_eq!(json["kind"], "business_rule");
        assert_eq!(json["retryable"], false);
    }
}
