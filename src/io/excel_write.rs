//! Writes a finished audit out as an Excel report workbook.

use std::path::Path;

use rust_xlsxwriter::Workbook;

use crate::error::Result;
use crate::model::ReconciliationResult;

const FINDINGS_HEADERS: [&str; 9] = [
    "ID",
    "Category",
    "Order",
    "Label",
    "Description",
    "Amount",
    "Overcharge",
    "Location",
    "Service",
];

const RATE_CARD_HEADERS: [&str; 5] = ["Billing Type", "UOM", "Rate", "Quantity", "Billed"];

/// Writes the result as a three-sheet workbook: findings (autofiltered),
/// the rate-card echo, and the top-line metrics.
pub fn write_report(path: &Path, result: &ReconciliationResult) -> Result<()> {
    let mut workbook = Workbook::new();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Findings")?;
    for (col_idx, header) in FINDINGS_HEADERS.iter().enumerate() {
        worksheet.write_string(0, col_idx as u16, *header)?;
    }
    for (row_idx, finding) in result.findings.iter().enumerate() {
        let row = (row_idx + 1) as u32;
        worksheet.write_string(row, 0, &finding.id)?;
        worksheet.write_string(row, 1, finding.category.info().name)?;
        worksheet.write_string(row, 2, &finding.order)?;
        worksheet.write_string(row, 3, finding.label.to_string())?;
        worksheet.write_string(row, 4, &finding.description)?;
        worksheet.write_number(row, 5, finding.amount)?;
        worksheet.write_string(row, 6, if finding.is_overcharge { "yes" } else { "no" })?;
        worksheet.write_string(row, 7, finding.location.as_deref().unwrap_or(""))?;
        worksheet.write_string(row, 8, finding.service.as_deref().unwrap_or(""))?;
    }
    let mut table = rust_xlsxwriter::Table::new();
    table.set_autofilter(true);
    let row_end = result.findings.len().max(1) as u32;
    let col_end = (FINDINGS_HEADERS.len() - 1) as u16;
    worksheet.add_table(0, 0, row_end, col_end, &table)?;

    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Rate Card")?;
    for (col_idx, header) in RATE_CARD_HEADERS.iter().enumerate() {
        worksheet.write_string(0, col_idx as u16, *header)?;
    }
    for (row_idx, line) in result.rate_card.iter().enumerate() {
        let row = (row_idx + 1) as u32;
        worksheet.write_string(row, 0, &line.billing_type)?;
        worksheet.write_string(row, 1, &line.uom)?;
        worksheet.write_number(row, 2, line.rate)?;
        worksheet.write_number(row, 3, line.qty)?;
        worksheet.write_number(row, 4, line.billed)?;
    }

    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Summary")?;
    let metrics: [(&str, f64); 9] = [
        ("Total Overcharges", result.total_overcharges),
        ("Total Credits", result.total_credits),
        ("Net Impact", result.net_impact),
        ("Total Orders", result.total_orders as f64),
        ("Total Shipments", result.total_shipments as f64),
        ("Warehouse Billed", result.total_warehouse_billed),
        ("Parcel Billed", result.total_parcel_billed),
        ("Shipping Cost / Order", result.shipping_cost_per_order),
        ("All-In Cost / Order", result.all_in_cost_per_order),
    ];
    for (row_idx, (name, value)) in metrics.iter().enumerate() {
        worksheet.write_string(row_idx as u32, 0, *name)?;
        worksheet.write_number(row_idx as u32, 1, *value)?;
    }

    workbook.save(path)?;
    Ok(())
}
