//! Rolls findings into per-category summaries and top-line metrics.

use std::collections::BTreeMap;

use crate::model::{
    Category, CategorySummary, Finding, ParcelShipmentRecord, ReconciliationResult,
    WarehouseSource,
};

/// Builds the finished [`ReconciliationResult`] from the findings and the
/// sources they were derived from. Summaries are recomputed in full; nothing
/// is carried over between runs.
pub fn summarize(
    findings: Vec<Finding>,
    warehouse: Option<&WarehouseSource>,
    backup: &[&ParcelShipmentRecord],
) -> ReconciliationResult {
    let mut category_summary: BTreeMap<Category, CategorySummary> = BTreeMap::new();
    for finding in &findings {
        let entry = category_summary.entry(finding.category).or_default();
        entry.count += 1;
        if finding.is_overcharge {
            entry.overcharges += finding.amount.abs();
        } else if finding.amount < 0.0 {
            entry.credits += finding.amount.abs();
        } else {
            entry.neutral += finding.amount.abs();
        }
    }

    let total_overcharges: f64 = findings
        .iter()
        .filter(|finding| finding.is_overcharge)
        .map(|finding| finding.amount.abs())
        .sum();
    let total_credits: f64 = findings
        .iter()
        .filter(|finding| !finding.is_overcharge && finding.amount < 0.0)
        .map(|finding| finding.amount.abs())
        .sum();

    let rate_card = warehouse
        .map(|wh| wh.rate_card.clone())
        .unwrap_or_default();
    let total_orders = warehouse.map(|wh| wh.outbound.len()).unwrap_or(0);
    let total_shipments = backup.len();
    let total_warehouse_billed: f64 = rate_card.iter().map(|line| line.billed).sum();
    let total_parcel_billed: f64 = backup.iter().map(|record| record.total).sum();

    let (shipping_cost_per_order, all_in_cost_per_order) = if total_orders > 0 {
        let orders = total_orders as f64;
        (
            total_parcel_billed / orders,
            (total_parcel_billed + total_warehouse_billed) / orders,
        )
    } else {
        (0.0, 0.0)
    };

    ReconciliationResult {
        findings,
        rate_card,
        category_summary,
        total_overcharges,
        total_credits,
        net_impact: total_overcharges - total_credits,
        total_orders,
        total_shipments,
        total_warehouse_billed,
        total_parcel_billed,
        shipping_cost_per_order,
        all_in_cost_per_order,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FindingLabel;

    fn finding(category: Category, amount: f64, is_overcharge: bool) -> Finding {
        Finding {
            id: format!("{}-{amount}", category.key()),
            category,
            order: Finding::NO_ORDER.to_string(),
            label: FindingLabel::Review,
            description: String::new(),
            amount,
            is_overcharge,
            location: None,
            zone: None,
            service: None,
            surcharges: Vec::new(),
        }
    }

    #[test]
    fn net_impact_is_overcharges_minus_credits() {
        let findings = vec![
            finding(Category::RateCardMath, 50.0, true),
            finding(Category::RateCardMath, -5.0, false),
            finding(Category::PostBillCredit, -3.0, false),
            finding(Category::DeliverySurcharge, 4.5, false),
        ];

        let result = summarize(findings, None, &[]);
        assert_eq!(result.total_overcharges, 50.0);
        assert_eq!(result.total_credits, 8.0);
        assert_eq!(result.net_impact, 42.0);
    }

    #[test]
    fn empty_findings_produce_zeroed_totals() {
        let result = summarize(Vec::new(), None, &[]);
        assert_eq!(result.total_overcharges, 0.0);
        assert_eq!(result.total_credits, 0.0);
        assert_eq!(result.net_impact, 0.0);
        assert!(result.category_summary.is_empty());
    }

    #[test]
    fn category_summary_buckets_overcharge_credit_and_neutral() {
        let findings = vec![
            finding(Category::RateCardMath, 50.0, true),
            finding(Category::RateCardMath, -5.0, false),
            finding(Category::RateCardMath, 0.0, false),
            finding(Category::DeliverySurcharge, 4.5, false),
        ];

        let result = summarize(findings, None, &[]);
        let math = &result.category_summary[&Category::RateCardMath];
        assert_eq!(math.count, 3);
        assert_eq!(math.overcharges, 50.0);
        assert_eq!(math.credits, 5.0);
        assert_eq!(math.neutral, 0.0);

        let delivery = &result.category_summary[&Category::DeliverySurcharge];
        assert_eq!(delivery.count, 1);
        // Positive, non-overcharge amounts are neutral, not credits.
        assert_eq!(delivery.credits, 0.0);
        assert_eq!(delivery.neutral, 4.5);
    }

    #[test]
    fn cost_per_order_guards_against_zero_orders() {
        let record = ParcelShipmentRecord {
            order: "5001".to_string(),
            total: 12.0,
            ..ParcelShipmentRecord::default()
        };
        let result = summarize(Vec::new(), None, &[&record]);
        assert_eq!(result.total_parcel_billed, 12.0);
        assert_eq!(result.shipping_cost_per_order, 0.0);
        assert_eq!(result.all_in_cost_per_order, 0.0);
    }

    #[test]
    fn cost_per_order_divides_by_outbound_count() {
        let warehouse = WarehouseSource {
            outbound: vec![
                crate::model::OutboundOrder {
                    order_number: "A-OB-1".to_string(),
                    lines: 1.0,
                    units: 1.0,
                    carrier: String::new(),
                    channel: String::new(),
                },
                crate::model::OutboundOrder {
                    order_number: "B-OB-1".to_string(),
                    lines: 1.0,
                    units: 1.0,
                    carrier: String::new(),
                    channel: String::new(),
                },
            ],
            rate_card: vec![crate::model::RateCardLine {
                billing_type: "Storage".to_string(),
                uom: "Pallet".to_string(),
                rate: 10.0,
                qty: 3.0,
                billed: 30.0,
            }],
            ..WarehouseSource::default()
        };
        let record = ParcelShipmentRecord {
            order: "A".to_string(),
            total: 14.0,
            ..ParcelShipmentRecord::default()
        };

        let result = summarize(Vec::new(), Some(&warehouse), &[&record]);
        assert_eq!(result.total_orders, 2);
        assert_eq!(result.total_warehouse_billed, 30.0);
        assert_eq!(result.shipping_cost_per_order, 7.0);
        assert_eq!(result.all_in_cost_per_order, 22.0);
    }
}
