//! The nine detection rules.
//!
//! Each rule scans whichever canonical records are present and pushes zero
//! or more findings; a rule with no applicable input simply contributes
//! nothing. Rules run in a fixed order and iterate their inputs in source
//! order, so the findings list is deterministic. Monetary equality uses
//! [`MONEY_TOLERANCE`]; quantity comparisons are exact.

use std::collections::HashSet;

use crate::fmt;
use crate::model::{
    BillWeightType, Category, Finding, FindingLabel, InboundAggregate, MONEY_TOLERANCE,
    ParcelShipmentRecord, ParcelTransaction, RateCardLine, Surcharge, WarehouseSource,
};

/// Surcharge types counted as delivery-area fees.
const DELIVERY_AREA_TYPES: [&str; 5] = ["DAS", "EDAS", "RDAS", "RESIDENTIAL", "RESIDENTIAL EXPRESS"];

/// Suffix outbound order numbers carry that parcel records omit.
const OUTBOUND_SUFFIX: &str = "-OB-1";

/// Runs every rule in order and returns the accumulated findings.
pub fn evaluate(
    warehouse: Option<&WarehouseSource>,
    transactions: &[&ParcelTransaction],
    backup: &[&ParcelShipmentRecord],
) -> Vec<Finding> {
    let rate_card: &[RateCardLine] = warehouse.map(|wh| wh.rate_card.as_slice()).unwrap_or(&[]);
    let mut findings = Vec::new();

    if let Some(wh) = warehouse {
        if let Some(totals) = &wh.inbound_totals {
            inbound_quantity_mismatch(rate_card, totals, &mut findings);
        }
    }
    rate_card_math(rate_card, &mut findings);
    phantom_charges(warehouse, backup, &mut findings);
    post_bill_adjustments(transactions, &mut findings);
    delivery_area_surcharges(backup, &mut findings);
    peak_surcharges(backup, &mut findings);
    dim_weight_opportunities(backup, &mut findings);
    if let Some(wh) = warehouse {
        inbound_discrepancies(wh, &mut findings);
    }

    findings
}

/// Rule 1: billed case/pallet handling quantities must match what the
/// inbound report says was actually received.
fn inbound_quantity_mismatch(
    rate_card: &[RateCardLine],
    totals: &InboundAggregate,
    findings: &mut Vec<Finding>,
) {
    let case_line = rate_card
        .iter()
        .find(|line| line.billing_type.contains("IB Handling - Case"));
    if let Some(line) = case_line.filter(|line| totals.cases != line.qty) {
        let extra = line.qty - totals.cases;
        findings.push(Finding {
            id: "QTY-IB-CASE".to_string(),
            category: Category::QtyMismatch,
            order: Finding::NO_ORDER.to_string(),
            label: direction_label(extra),
            description: format!(
                "Billed for {} cases but only {} were actually received ({} extra × {}/case)",
                fmt::count(line.qty),
                fmt::count(totals.cases),
                fmt::count(extra.abs()),
                fmt::money(line.rate),
            ),
            amount: extra * line.rate,
            is_overcharge: extra > 0.0,
            location: None,
            zone: None,
            service: None,
            surcharges: Vec::new(),
        });
    }

    let pallet_line = rate_card
        .iter()
        .find(|line| line.billing_type.contains("IB Handling - Pallet"));
    if let Some(line) = pallet_line.filter(|line| totals.pallets != line.qty) {
        let extra = line.qty - totals.pallets;
        findings.push(Finding {
            id: "QTY-IB-PAL".to_string(),
            category: Category::QtyMismatch,
            order: Finding::NO_ORDER.to_string(),
            label: direction_label(extra),
            description: format!(
                "Billed for {} pallets but {} were received",
                fmt::count(line.qty),
                fmt::count(totals.pallets),
            ),
            amount: extra * line.rate,
            is_overcharge: extra > 0.0,
            location: None,
            zone: None,
            service: None,
            surcharges: Vec::new(),
        });
    }
}

/// Rule 2: rate × quantity must equal the billed amount, within tolerance.
fn rate_card_math(rate_card: &[RateCardLine], findings: &mut Vec<Finding>) {
    for line in rate_card {
        let expected = line.rate * line.qty;
        let delta = line.billed - expected;
        if delta.abs() <= MONEY_TOLERANCE {
            continue;
        }
        findings.push(Finding {
            id: format!("RC-{}", line.billing_type),
            category: Category::RateCardMath,
            order: Finding::NO_ORDER.to_string(),
            label: if delta > 0.0 {
                FindingLabel::Overcharge
            } else {
                FindingLabel::Credit
            },
            description: format!(
                "{}: {} × {} should be {} but was billed as {}",
                line.billing_type,
                fmt::money(line.rate),
                fmt::count(line.qty),
                fmt::money(expected),
                fmt::money(line.billed),
            ),
            amount: delta,
            is_overcharge: delta > 0.0,
            location: None,
            zone: None,
            service: None,
            surcharges: Vec::new(),
        });
    }
}

/// Rule 3: every parcel shipment must belong to an order in the outbound
/// summary. Outbound order numbers carry a `-OB-1` suffix that parcel
/// records omit, so it is stripped before comparison.
fn phantom_charges(
    warehouse: Option<&WarehouseSource>,
    backup: &[&ParcelShipmentRecord],
    findings: &mut Vec<Finding>,
) {
    let known_orders: HashSet<String> = warehouse
        .map(|wh| {
            wh.outbound
                .iter()
                .map(|order| order.order_number.replacen(OUTBOUND_SUFFIX, "", 1))
                .collect()
        })
        .unwrap_or_default();

    for record in backup {
        if known_orders.contains(&record.order) {
            continue;
        }
        findings.push(Finding {
            id: format!("PHANTOM-{}", record.order),
            category: Category::PhantomCharge,
            order: record.order.clone(),
            label: FindingLabel::Overcharge,
            description: "Parcel charge for an order that does not exist in the Outbound Summary"
                .to_string(),
            amount: record.total,
            is_overcharge: true,
            location: Some(record.location()),
            zone: Some(record.zone.clone()),
            service: Some(record.service.clone()),
            surcharges: Vec::new(),
        });
    }
}

/// Rule 4: transactions whose billing item mentions "adjusted" were
/// re-billed after the original invoice; positive charges are increases,
/// negative ones credits. Identifiers use the transaction's position so
/// repeated adjustments on one order stay distinct across reruns.
fn post_bill_adjustments(transactions: &[&ParcelTransaction], findings: &mut Vec<Finding>) {
    for (index, txn) in transactions.iter().enumerate() {
        if !txn.item.to_lowercase().contains("adjusted") {
            continue;
        }
        if txn.charge > 0.0 {
            findings.push(Finding {
                id: format!("ADJUP-{}-{index}", txn.order),
                category: Category::PostBillIncrease,
                order: txn.order.clone(),
                label: FindingLabel::Overcharge,
                description: format!(
                    "Charge was increased by {} after the original invoice was issued",
                    fmt::money(txn.charge),
                ),
                amount: txn.charge,
                is_overcharge: true,
                location: None,
                zone: None,
                service: None,
                surcharges: Vec::new(),
            });
        } else if txn.charge < 0.0 {
            findings.push(Finding {
                id: format!("ADJDN-{}-{index}", txn.order),
                category: Category::PostBillCredit,
                order: txn.order.clone(),
                label: FindingLabel::Credit,
                description: format!(
                    "A credit of {} was applied after the original invoice",
                    fmt::money(txn.charge.abs()),
                ),
                amount: txn.charge,
                is_overcharge: false,
                location: None,
                zone: None,
                service: None,
                surcharges: Vec::new(),
            });
        }
    }
}

/// Rule 5: delivery-area surcharges (DAS/EDAS/RDAS/Residential) rolled up
/// per shipment. Informational: not counted as a billing error.
fn delivery_area_surcharges(backup: &[&ParcelShipmentRecord], findings: &mut Vec<Finding>) {
    for record in backup {
        let hits: Vec<&Surcharge> = record
            .surcharges
            .iter()
            .filter(|surcharge| DELIVERY_AREA_TYPES.contains(&surcharge.kind.as_str()))
            .collect();
        if hits.is_empty() {
            continue;
        }
        findings.push(Finding {
            id: format!("DAS-{}", record.order),
            category: Category::DeliverySurcharge,
            order: record.order.clone(),
            label: FindingLabel::Surcharge,
            description: format!(
                "Carrier delivery area surcharge: {}",
                describe_surcharges(&hits),
            ),
            amount: hits.iter().map(|surcharge| surcharge.charge).sum(),
            is_overcharge: false,
            location: Some(record.location()),
            zone: Some(record.zone.clone()),
            service: Some(record.service.clone()),
            surcharges: record.surcharges.clone(),
        });
    }
}

/// Rule 6: seasonal peak surcharges, matched by substring.
fn peak_surcharges(backup: &[&ParcelShipmentRecord], findings: &mut Vec<Finding>) {
    for record in backup {
        let peaks: Vec<&Surcharge> = record
            .surcharges
            .iter()
            .filter(|surcharge| surcharge.kind.contains("PEAK"))
            .collect();
        if peaks.is_empty() {
            continue;
        }
        findings.push(Finding {
            id: format!("PEAK-{}", record.order),
            category: Category::PeakSurcharge,
            order: record.order.clone(),
            label: FindingLabel::Surcharge,
            description: format!("Peak season surcharge: {}", describe_surcharges(&peaks)),
            amount: peaks.iter().map(|surcharge| surcharge.charge).sum(),
            is_overcharge: false,
            location: Some(record.state.clone()),
            zone: None,
            service: None,
            surcharges: Vec::new(),
        });
    }
}

/// Rule 7: shipments billed on a dimensional weight more than twice their
/// actual weight are packaging-review candidates. No dollar impact is
/// estimated for these; the amount stays 0.
fn dim_weight_opportunities(backup: &[&ParcelShipmentRecord], findings: &mut Vec<Finding>) {
    for record in backup {
        if record.bill_weight_type != Some(BillWeightType::Dimensional) {
            continue;
        }
        if record.actual_weight <= 0.0 || record.bill_weight <= 0.0 {
            continue;
        }
        if record.bill_weight <= record.actual_weight * 2.0 {
            continue;
        }
        findings.push(Finding {
            id: format!("DIM-{}", record.order),
            category: Category::DimWeight,
            order: record.order.clone(),
            label: FindingLabel::Review,
            description: format!(
                "Billed at {}lb (dimensional) but actual weight is only {}lb — smaller packaging could reduce this",
                fmt::count(record.bill_weight),
                fmt::count(record.actual_weight),
            ),
            amount: 0.0,
            is_overcharge: false,
            location: None,
            zone: None,
            service: None,
            surcharges: Vec::new(),
        });
    }
}

/// Rule 8: inbound receipt lines whose discrepancy is non-zero. Quantity
/// only; the amount stays 0.
fn inbound_discrepancies(warehouse: &WarehouseSource, findings: &mut Vec<Finding>) {
    for line in &warehouse.inbound {
        if line.discrepancy == 0.0 {
            continue;
        }
        let sign = if line.discrepancy > 0.0 { "+" } else { "" };
        findings.push(Finding {
            id: format!("IB-{}-{}", line.order, line.sku),
            category: Category::InboundDiscrepancy,
            order: line.order.clone(),
            label: if line.discrepancy < 0.0 {
                FindingLabel::Short
            } else {
                FindingLabel::Over
            },
            description: format!(
                "SKU {}: Expected {} units, received {} ({sign}{} units)",
                line.sku,
                fmt::count(line.expected),
                fmt::count(line.received),
                fmt::count(line.discrepancy),
            ),
            amount: 0.0,
            is_overcharge: false,
            location: None,
            zone: None,
            service: None,
            surcharges: Vec::new(),
        });
    }
}

fn direction_label(extra: f64) -> FindingLabel {
    if extra > 0.0 {
        FindingLabel::Overcharge
    } else {
        FindingLabel::Undercharge
    }
}

fn describe_surcharges(surcharges: &[&Surcharge]) -> String {
    surcharges
        .iter()
        .map(|surcharge| format!("{} ({})", surcharge.kind, fmt::money(surcharge.charge)))
        .collect::<Vec<_>>()
        .join(", ")
}
