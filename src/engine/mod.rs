//! The reconciliation engine: a pure function from normalized sources to a
//! [`ReconciliationResult`].
//!
//! Only the first warehouse source is consulted for rate-card and inbound
//! data; multiple warehouse files are not merged. All parcel sources are
//! flattened together. The engine holds no state and performs no I/O, so
//! reruns over identical inputs produce identical results.

use tracing::{debug, instrument};

use crate::model::{ParcelSource, ReconciliationResult, WarehouseSource};

pub mod aggregate;
pub mod rules;

/// Runs the nine detection rules over the given sources and rolls the
/// findings up into summaries and top-line metrics.
#[instrument(level = "info", skip_all, fields(warehouse = warehouse.len(), parcel = parcel.len()))]
pub fn reconcile(warehouse: &[WarehouseSource], parcel: &[ParcelSource]) -> ReconciliationResult {
    let primary = warehouse.first();
    let transactions: Vec<_> = parcel
        .iter()
        .flat_map(|source| source.transactions.iter())
        .collect();
    let backup: Vec<_> = parcel
        .iter()
        .flat_map(|source| source.backup.iter())
        .collect();

    let findings = rules::evaluate(primary, &transactions, &backup);
    debug!(finding_count = findings.len(), "rule evaluation complete");

    aggregate::summarize(findings, primary, &backup)
}
