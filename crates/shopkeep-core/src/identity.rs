//! # Identity Resolver
//!
//! Every entity the engine touches may be referenced two ways:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Dual-Key Identity Pattern                            │
//! │                                                                         │
//! │  Incoming reference            Kind               Lookup filter         │
//! │  ──────────────────            ────               ─────────────         │
//! │  "9f1c…-…-…-…-…" (UUID)   ──►  Opaque        ──►  id = ?                │
//! │  "1042"                   ──►  LegacyNumeric ──►  legacy_id = ?         │
//! │  "anything-else"          ──►  Unrecognized  ──►  id = ? (literal)      │
//! │                                                                         │
//! │  `id`        : native identifier assigned by the current store         │
//! │  `legacy_id` : integer key from the old relational store, kept on      │
//! │                every migrated row (indexed)                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! References are parsed once at the boundary of an operation into an
//! [`EntityRef`]; repositories only ever see the resulting
//! [`LookupFilter`]. An unrecognized reference is not an error: it simply
//! matches nothing unless some row literally has that `id`.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Column holding the native identifier on every entity table.
pub const PRIMARY_ID_COLUMN: &str = "id";

/// Side-channel column holding the legacy numeric key.
pub const LEGACY_ID_COLUMN: &str = "legacy_id";

// =============================================================================
// Classification
// =============================================================================

/// How a raw reference was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityKind {
    Opaque,
    LegacyNumeric,
    Unrecognized,
}

/// A parsed entity reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityRef {
    /// Native identifier of the current store, kept exactly as written.
    Native(String),
    /// Historical surrogate key from the relational store.
    Legacy(i64),
    /// Anything else, matched literally against the primary id.
    Raw(String),
}

impl EntityRef {
    /// Classifies a raw reference.
    ///
    /// Only the canonical hyphenated form counts as native; a bare run of 32
    /// digits is a number, not a UUID.
    ///
    /// ## Example
    /// ```rust
    /// use shopkeep_core::identity::{EntityRef, IdentityKind};
    ///
    /// assert_eq!(EntityRef::parse("550e8400-e29b-41d4-a716-446655440000").kind(), IdentityKind::Opaque);
    /// assert_eq!(EntityRef::parse("77").kind(), IdentityKind::LegacyNumeric);
    /// assert_eq!(EntityRef::parse("-77").kind(), IdentityKind::Unrecognized);
    /// ```
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();

        if trimmed.len() == 36 {
            if Uuid::try_parse(trimmed).is_ok() {
                return EntityRef::Native(trimmed.to_string());
            }
        }

        if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(key) = trimmed.parse::<i64>() {
                return EntityRef::Legacy(key);
            }
        }

        EntityRef::Raw(raw.to_string())
    }

    pub fn kind(&self) -> IdentityKind {
        match self {
            EntityRef::Native(_) => IdentityKind::Opaque,
            EntityRef::Legacy(_) => IdentityKind::LegacyNumeric,
            EntityRef::Raw(_) => IdentityKind::Unrecognized,
        }
    }

    /// Builds the lookup filter for any entity collection.
    pub fn filter(&self) -> LookupFilter {
        match self {
            EntityRef::Native(id) => LookupFilter {
                column: PRIMARY_ID_COLUMN,
                value: FilterValue::Text(id.clone()),
            },
            EntityRef::Legacy(key) => LookupFilter {
                column: LEGACY_ID_COLUMN,
                value: FilterValue::Integer(*key),
            },
            EntityRef::Raw(raw) => LookupFilter {
                column: PRIMARY_ID_COLUMN,
                value: FilterValue::Text(raw.clone()),
            },
        }
    }

    /// Reference to an already-loaded row by its stored `id`.
    ///
    /// No re-parsing: the id is matched byte for byte, whatever its case.
    pub fn from_native_id(id: &str) -> Self {
        EntityRef::Native(id.to_string())
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityRef::Native(id) => f.write_str(id),
            EntityRef::Legacy(key) => write!(f, "{}", key),
            EntityRef::Raw(raw) => f.write_str(raw),
        }
    }
}

impl From<&str> for EntityRef {
    fn from(raw: &str) -> Self {
        EntityRef::parse(raw)
    }
}

impl From<Uuid> for EntityRef {
    fn from(uuid: Uuid) -> Self {
        EntityRef::Native(uuid.hyphenated().to_string())
    }
}

// =============================================================================
// Lookup Filter
// =============================================================================

/// Bind value carried by a [`LookupFilter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Text(String),
    Integer(i64),
}

/// A single-column equality filter, valid against any entity table.
///
/// `column` is always one of [`PRIMARY_ID_COLUMN`] or [`LEGACY_ID_COLUMN`],
/// so it is safe to splice into SQL; the value is always bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupFilter {
    column: &'static str,
    value: FilterValue,
}

impl LookupFilter {
    pub fn column(&self) -> &'static str {
        self.column
    }

    pub fn value(&self) -> &FilterValue {
        &self.value
    }

    /// Renders `<column> = ?<placeholder>`.
    ///
    /// ## Example
    /// ```rust
    /// use shopkeep_core::identity::EntityRef;
    ///
    /// assert_eq!(EntityRef::parse("12").filter().sql_predicate(1), "legacy_id = ?1");
    /// ```
    pub fn sql_predicate(&self, placeholder: usize) -> String {
        format!("{} = ?{}", self.column, placeholder)
    }
}

/// Output of [`resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub kind: IdentityKind,
    pub filter: LookupFilter,
}

/// Classifies a raw reference and builds its lookup filter in one step.
pub fn resolve(raw: &str) -> Resolution {
    let entity_ref = EntityRef::parse(raw);
    Resolution {
        kind: entity_ref.kind(),
        filter: entity_ref.filter(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const UUID: &str = "550e8400-e29b-41d4-a716-446655440000";

    #[test]
    fn test_native_id() {
        let r = EntityRef::parse(UUID);
        assert_eq!(r.kind(), IdentityKind::Opaque);
        let filter = r.filter();
        assert_eq!(filter.column(), "id");
        assert_eq!(filter.value(), &FilterValue::Text(UUID.to_string()));
    }

    #[test]
    fn test_native_id_keeps_its_case() {
        let upper = UUID.to_uppercase();
        let r = EntityRef::parse(&upper);
        assert_eq!(r.kind(), IdentityKind::Opaque);
        assert_eq!(r.filter().value(), &FilterValue::Text(upper.clone()));
        assert_eq!(r.to_string(), upper);
    }

    #[test]
    fn test_legacy_numeric() {
        let resolution = resolve("1042");
        assert_eq!(resolution.kind, IdentityKind::LegacyNumeric);
        assert_eq!(resolution.filter.column(), "legacy_id");
        assert_eq!(resolution.filter.value(), &FilterValue::Integer(1042));

        assert_eq!(EntityRef::parse("0"), EntityRef::Legacy(0));
        assert_eq!(EntityRef::parse(" 15 "), EntityRef::Legacy(15));
    }

    #[test]
    fn test_unrecognized_falls_back_to_primary_id() {
        for raw in ["-5", "+5", "12abc", "", "not-a-uuid", "99999999999999999999"] {
            let resolution = resolve(raw);
            assert_eq!(resolution.kind, IdentityKind::Unrecognized, "{raw:?}");
            assert_eq!(resolution.filter.column(), "id");
            assert_eq!(resolution.filter.value(), &FilterValue::Text(raw.to_string()));
        }
    }

    #[test]
    fn test_simple_uuid_form_is_not_native() {
        // 32 hex digits without hyphens parse as a UUID, but are not the
        // store's id shape.
        let simple = "550e8400e29b41d4a716446655440000";
        assert_eq!(EntityRef::parse(simple).kind(), IdentityKind::Unrecognized);
    }

    #[test]
    fn test_sql_predicate() {
        assert_eq!(EntityRef::parse(UUID).filter().sql_predicate(3), "id = ?3");
        assert_eq!(EntityRef::parse("8").filter().sql_predicate(1), "legacy_id = ?1");
    }

    #[test]
    fn test_display_round_trips_kind() {
        for raw in [UUID, "31", "weird"] {
            let r = EntityRef::parse(raw);
            assert_eq!(EntityRef::parse(&r.to_string()).kind(), r.kind());
        }
    }

    #[test]
    fn test_from_native_id_matches_stored_text() {
        let upper = UUID.to_uppercase();
        for stored in [UUID, upper.as_str(), "sale-a"] {
            let filter = EntityRef::from_native_id(stored).filter();
            assert_eq!(filter.column(), "id");
            assert_eq!(filter.value(), &FilterValue::Text(stored.to_string()));
        }
    }
}
