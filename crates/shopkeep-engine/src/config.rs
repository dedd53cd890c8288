//! # Engine Configuration
//!
//! Policies fixed when the engine is constructed. Operations never read the
//! environment themselves.
//!
//! ## Environment Variables
//! | Variable | Values | Default |
//! |----------|--------|---------|
//! | `SHOPKEEP_COST_POLICY` | `zero`, `selling_price` | `zero` |
//! | `SHOPKEEP_STOCK_POLICY` | `advisory`, `strict` | `advisory` |
//! | `SHOPKEEP_OVERPAYMENT_POLICY` | `reject`, `accept` | `reject` |

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use shopkeep_core::settlement::OverpaymentPolicy;
use shopkeep_core::{CostPolicy, ValidationError};
use tracing::warn;

use crate::error::{EngineError, EngineResult};

pub const COST_POLICY_VAR: &str = "SHOPKEEP_COST_POLICY";
pub const STOCK_POLICY_VAR: &str = "SHOPKEEP_STOCK_POLICY";
pub const OVERPAYMENT_POLICY_VAR: &str = "SHOPKEEP_OVERPAYMENT_POLICY";

// =============================================================================
// Stock Policy
// =============================================================================

/// How stock is decremented when a sale commits.
///
/// ```text
/// Advisory: pre-check at pricing ──► stock = stock - qty (may go negative, logged)
/// Strict:   pre-check at pricing ──► stock = stock - qty only if stock >= qty,
///                                    otherwise the whole sale rolls back
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StockPolicy {
    #[default]
    Advisory,
    Strict,
}

impl StockPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockPolicy::Advisory => "advisory",
            StockPolicy::Strict => "strict",
        }
    }
}

impl fmt::Display for StockPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StockPolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "advisory" => Ok(StockPolicy::Advisory),
            "strict" => Ok(StockPolicy::Strict),
            other => Err(ValidationError::InvalidFormat {
                field: "stock policy".to_string(),
                reason: format!("unknown policy '{}'", other),
            }),
        }
    }
}

// =============================================================================
// Engine Config
// =============================================================================

/// Engine-wide policies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngineConfig {
    /// Unit cost recorded when the catalog has none.
    pub cost_policy: CostPolicy,
    pub stock_policy: StockPolicy,
    /// Whether payments may push `paid` past the sale total.
    pub overpayment_policy: OverpaymentPolicy,
}

impl EngineConfig {
    pub fn with_cost_policy(mut self, policy: CostPolicy) -> Self {
        self.cost_policy = policy;
        self
    }

    pub fn with_stock_policy(mut self, policy: StockPolicy) -> Self {
        self.stock_policy = policy;
        self
    }

    pub fn with_overpayment_policy(mut self, policy: OverpaymentPolicy) -> Self {
        self.overpayment_policy = policy;
        self
    }

    /// Loads configuration from environment variables.
    ///
    /// Unset variables keep their default. Unparseable values are logged
    /// and also fall back to the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = EngineConfig::default();

        EngineConfig {
            cost_policy: lenient(&lookup, COST_POLICY_VAR, defaults.cost_policy),
            stock_policy: lenient(&lookup, STOCK_POLICY_VAR, defaults.stock_policy),
            overpayment_policy: lenient(
                &lookup,
                OVERPAYMENT_POLICY_VAR,
                defaults.overpayment_policy,
            ),
        }
    }

    /// Like [`from_lookup`](Self::from_lookup) but fails on the first
    /// unparseable value instead of falling back.
    pub fn try_from_lookup<F>(lookup: F) -> EngineResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = EngineConfig::default();

        Ok(EngineConfig {
            cost_policy: strict(&lookup, COST_POLICY_VAR, defaults.cost_policy)?,
            stock_policy: strict(&lookup, STOCK_POLICY_VAR, defaults.stock_policy)?,
            overpayment_policy: strict(
                &lookup,
                OVERPAYMENT_POLICY_VAR,
                defaults.overpayment_policy,
            )?,
        })
    }
}

fn strict<F, T>(lookup: &F, key: &str, default: T) -> EngineResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr<Err = ValidationError>,
{
    match lookup(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e: ValidationError| EngineError::Config(format!("{}: {}", key, e))),
        None => Ok(default),
    }
}

fn lenient<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr<Err = ValidationError> + fmt::Display + Copy,
{
    strict(lookup, key, default).unwrap_or_else(|e| {
        warn!(key, error = %e, fallback = %default, "Ignoring invalid engine setting");
        default
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::from_lookup(lookup(&[]));
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.cost_policy, CostPolicy::Zero);
        assert_eq!(config.stock_policy, StockPolicy::Advisory);
        assert_eq!(config.overpayment_policy, OverpaymentPolicy::Reject);
    }

    #[test]
    fn test_overrides() {
        let config = EngineConfig::from_lookup(lookup(&[
            (COST_POLICY_VAR, "selling_price"),
            (STOCK_POLICY_VAR, "Strict"),
            (OVERPAYMENT_POLICY_VAR, "accept"),
        ]));
        assert_eq!(config.cost_policy, CostPolicy::SellingPrice);
        assert_eq!(config.stock_policy, StockPolicy::Strict);
        assert_eq!(config.overpayment_policy, OverpaymentPolicy::Accept);
    }

    #[test]
    fn test_invalid_value_falls_back_or_fails() {
        let pairs = [(STOCK_POLICY_VAR, "sometimes"), (COST_POLICY_VAR, "price")];

        let lenient = EngineConfig::from_lookup(lookup(&pairs));
        assert_eq!(lenient.stock_policy, StockPolicy::Advisory);
        assert_eq!(lenient.cost_policy, CostPolicy::SellingPrice);

        let err = EngineConfig::try_from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(err, EngineError::Config(ref msg) if msg.contains(STOCK_POLICY_VAR)));
    }
}
