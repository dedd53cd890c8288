//! Best-effort customer lookups. A failing directory never fails a sale or
//! a payment; it only costs the caller the customer's name.

use shopkeep_core::{EntityRef, Sale};
use shopkeep_db::Database;
use tracing::warn;

/// Customer reference as it will be stored on a sale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct CustomerLink {
    pub id: Option<String>,
    pub legacy_id: Option<i64>,
    pub name: Option<String>,
}

/// Resolves a caller-supplied customer reference.
///
/// A directory hit fills in both keys and the name. On a miss (or a lookup
/// failure) the reference is kept under whichever scheme it parsed as.
pub(crate) async fn link_customer(db: &Database, raw: &str) -> CustomerLink {
    let entity_ref = EntityRef::parse(raw);

    match db.customers().get(&entity_ref).await {
        Ok(Some(customer)) => {
            return CustomerLink {
                id: Some(customer.id),
                legacy_id: customer.legacy_id,
                name: Some(customer.name),
            }
        }
        Ok(None) => warn!(reference = %entity_ref, "Customer not in directory; keeping reference"),
        Err(e) => warn!(reference = %entity_ref, error = %e, "Customer lookup failed"),
    }

    match entity_ref {
        EntityRef::Legacy(key) => CustomerLink {
            legacy_id: Some(key),
            ..CustomerLink::default()
        },
        EntityRef::Native(id) => CustomerLink {
            id: Some(id),
            ..CustomerLink::default()
        },
        EntityRef::Raw(raw) => CustomerLink {
            id: Some(raw),
            ..CustomerLink::default()
        },
    }
}

/// Fills `sale.customer_name` from the directory if possible.
pub(crate) async fn attach_customer_name(db: &Database, sale: &mut Sale) {
    let Some(entity_ref) = sale.customer_ref() else {
        return;
    };

    match db.customers().get(&entity_ref).await {
        Ok(customer) => sale.customer_name = customer.map(|c| c.name),
        Err(e) => warn!(sale_id = %sale.id, error = %e, "Could not attach customer name"),
    }
}
