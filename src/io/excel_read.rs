//! Workbook classification and normalization.
//!
//! Uploaded files are classified by their sheet-name signature and projected
//! into [`WarehouseSource`] or [`ParcelSource`]. Every section is optional:
//! a missing sheet leaves its field empty rather than failing the parse.
//! Numeric cells that refuse to parse coerce to 0 and leave a
//! [`CellWarning`] behind instead of sinking the whole file.

use std::io::Cursor;
use std::path::Path;

use calamine::{DataType, Range, Reader, Xlsx, open_workbook};

use crate::error::Result;
use crate::model::{
    BillWeightType, CellWarning, InboundAggregate, InboundLine, MaterialLine, OutboundOrder,
    ParcelShipmentRecord, ParcelSource, ParcelTransaction, ParsedSource, RateCardLine, ReturnLine,
    Surcharge, VasLaborLine, WarehouseSource,
};

/// Number of `Fee Surcharge Type N` / `Fee Type Charges N` column pairs on
/// the parcel backup sheet.
const SURCHARGE_SLOTS: usize = 10;

/// Classifies and normalizes a workbook on disk.
pub fn detect_path(path: &Path, file_name: &str) -> Result<ParsedSource> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    detect(&mut workbook, file_name)
}

/// Classifies and normalizes a workbook already decoded into memory, the
/// shape uploads arrive in.
pub fn detect_bytes(bytes: &[u8], file_name: &str) -> Result<ParsedSource> {
    let mut workbook = Xlsx::new(Cursor::new(bytes.to_vec()))?;
    detect(&mut workbook, file_name)
}

fn detect<R: std::io::Read + std::io::Seek>(
    workbook: &mut Xlsx<R>,
    file_name: &str,
) -> Result<ParsedSource> {
    let lowered: Vec<String> = workbook
        .sheet_names()
        .iter()
        .map(|name| name.to_lowercase())
        .collect();

    // Warehouse signatures are checked before parcel ones: a workbook
    // matching both families classifies as warehouse.
    if lowered
        .iter()
        .any(|name| name == "ob summary" || name == "vas-labor")
    {
        return Ok(ParsedSource::Warehouse(parse_warehouse(
            workbook, file_name,
        )?));
    }
    if lowered.iter().any(|name| name.contains("parcel")) {
        return Ok(ParsedSource::Parcel(parse_parcel(workbook, file_name)?));
    }
    Ok(ParsedSource::Unknown {
        file_name: file_name.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Warehouse workbook
// ---------------------------------------------------------------------------

fn parse_warehouse<R: std::io::Read + std::io::Seek>(
    workbook: &mut Xlsx<R>,
    file_name: &str,
) -> Result<WarehouseSource> {
    let mut source = WarehouseSource {
        file_name: file_name.to_string(),
        ..WarehouseSource::default()
    };

    if let Some(range) = read_sheet(workbook, "Summary")? {
        source.rate_card = parse_rate_card(&range, &mut source.warnings);
    }
    if let Some(range) = read_sheet(workbook, "OB Summary")? {
        source.outbound = parse_outbound(&range, &mut source.warnings);
    }
    if let Some(range) = read_sheet(workbook, "IB Lines")? {
        source.inbound = parse_inbound_lines(&range, &mut source.warnings);
    }
    if let Some(range) = read_sheet(workbook, "IB Report")? {
        source.inbound_totals = Some(parse_inbound_aggregate(&range, &mut source.warnings));
    }
    if let Some(range) = read_sheet(workbook, "VAS-Labor")? {
        source.vas_labor = parse_vas_labor(&range, &mut source.warnings);
    }
    if let Some(range) = read_sheet(workbook, "Materials")? {
        source.materials = parse_materials(&range, &mut source.warnings);
    }
    if let Some(range) = read_sheet(workbook, "Returns")? {
        source.returns = parse_returns(&range, &mut source.warnings);
        source.return_units = source.returns.iter().map(|line| line.received).sum();
    }

    Ok(source)
}

/// Scans the summary sheet's first column for the `Billing Type` header row,
/// then accumulates rate lines until the first blank billing type. Subtotal
/// rows (`TOTAL` in the first cell) are skipped.
fn parse_rate_card(range: &Range<DataType>, warnings: &mut Vec<CellWarning>) -> Vec<RateCardLine> {
    let header_idx = range
        .rows()
        .position(|row| cell_to_string(row.first()).contains("Billing Type"));
    let Some(header_idx) = header_idx else {
        return Vec::new();
    };

    let mut lines = Vec::new();
    for (offset, row) in range.rows().skip(header_idx + 1).enumerate() {
        let billing_type = cell_to_string(row.first());
        let billing_type = billing_type.trim();
        if billing_type.is_empty() {
            break;
        }
        if billing_type.to_uppercase().contains("TOTAL") {
            continue;
        }
        let row_number = header_idx + offset + 2;
        lines.push(RateCardLine {
            billing_type: billing_type.to_string(),
            uom: cell_to_string(row.get(1)).trim().to_string(),
            rate: coerce_number(row.get(2), "Summary", "Rate", row_number, warnings),
            qty: coerce_number(row.get(3), "Summary", "Quantity", row_number, warnings),
            billed: coerce_number(row.get(4), "Summary", "Billed", row_number, warnings),
        });
    }
    lines
}

fn parse_outbound(range: &Range<DataType>, warnings: &mut Vec<CellWarning>) -> Vec<OutboundOrder> {
    let sheet = SheetReader::new(range, "OB Summary");
    let mut orders = Vec::new();
    for row in sheet.data_rows() {
        let order_number = row.text("Order Number");
        if order_number.is_empty() {
            continue;
        }
        orders.push(OutboundOrder {
            order_number,
            lines: row.number("No of Lines", warnings),
            units: row.number("Shipped Units", warnings),
            carrier: row.text("Carrier Ship Option"),
            channel: row.text("Channel Category"),
        });
    }
    orders
}

fn parse_inbound_lines(
    range: &Range<DataType>,
    warnings: &mut Vec<CellWarning>,
) -> Vec<InboundLine> {
    let sheet = SheetReader::new(range, "IB Lines");
    let mut lines = Vec::new();
    for row in sheet.data_rows() {
        let order = row.text("Order Number");
        if order.is_empty() {
            continue;
        }
        lines.push(InboundLine {
            order,
            sku: row.text("SKU"),
            received: row.number("Received Quantity", warnings),
            expected: row.number("Expected Quantity", warnings),
            discrepancy: row.number("Receipt Discrepancy", warnings),
            status: row.text("Status"),
        });
    }
    lines
}

/// Buckets `Quantity Received` by `UOM Received`. Only Pallet, Case, and
/// Each are tracked; any other unit of measure is ignored.
fn parse_inbound_aggregate(
    range: &Range<DataType>,
    warnings: &mut Vec<CellWarning>,
) -> InboundAggregate {
    let sheet = SheetReader::new(range, "IB Report");
    let mut totals = InboundAggregate::default();
    for row in sheet.data_rows() {
        let qty = row.number("Quantity Received", warnings);
        match row.text("UOM Received").as_str() {
            "Pallet" => totals.pallets += qty,
            "Case" => totals.cases += qty,
            "Each" => totals.each += qty,
            _ => {}
        }
    }
    totals
}

fn parse_vas_labor(range: &Range<DataType>, warnings: &mut Vec<CellWarning>) -> Vec<VasLaborLine> {
    let sheet = SheetReader::new(range, "VAS-Labor");
    let mut lines = Vec::new();
    for row in sheet.data_rows() {
        let vas_type = row.text("VAS Type");
        if vas_type.is_empty() {
            continue;
        }
        lines.push(VasLaborLine {
            date: row.text("Date"),
            vas_type,
            category: row.text("Category"),
            qty: row.number("Total Quantity", warnings),
            uom: row.text("Quantity UOM"),
            notes: row.text("Notes / Activity Summary"),
        });
    }
    lines
}

/// The materials sheet carries preamble rows; the header is the first row
/// whose second column contains `Item Description`, and data rows are the
/// following rows with a non-empty second column.
fn parse_materials(range: &Range<DataType>, warnings: &mut Vec<CellWarning>) -> Vec<MaterialLine> {
    let header_idx = range
        .rows()
        .position(|row| cell_to_string(row.get(1)).contains("Item Description"));
    let Some(header_idx) = header_idx else {
        return Vec::new();
    };

    let mut lines = Vec::new();
    for (offset, row) in range.rows().skip(header_idx + 1).enumerate() {
        let item = cell_to_string(row.get(1));
        if item.trim().is_empty() {
            continue;
        }
        let row_number = header_idx + offset + 2;
        lines.push(MaterialLine {
            item: item.trim().to_string(),
            qty: coerce_number(row.get(2), "Materials", "Quantity", row_number, warnings),
            cost: coerce_number(row.get(4), "Materials", "Cost", row_number, warnings),
        });
    }
    lines
}

fn parse_returns(range: &Range<DataType>, warnings: &mut Vec<CellWarning>) -> Vec<ReturnLine> {
    let sheet = SheetReader::new(range, "Returns");
    let mut lines = Vec::new();
    for row in sheet.data_rows() {
        let order = row.text("Order Number");
        if order.is_empty() {
            continue;
        }
        lines.push(ReturnLine {
            order,
            sku: row.text("SKU"),
            received: row.number("Received Quantity", warnings),
        });
    }
    lines
}

// ---------------------------------------------------------------------------
// Parcel workbook
// ---------------------------------------------------------------------------

fn parse_parcel<R: std::io::Read + std::io::Seek>(
    workbook: &mut Xlsx<R>,
    file_name: &str,
) -> Result<ParcelSource> {
    let mut source = ParcelSource {
        file_name: file_name.to_string(),
        ..ParcelSource::default()
    };

    if let Some(range) = read_sheet(workbook, "Parcel Txns")? {
        source.transactions = parse_transactions(&range, &mut source.warnings);
    }

    let backup_sheet = workbook
        .sheet_names()
        .iter()
        .find(|name| name.contains("Parcel Backup"))
        .cloned();
    if let Some(name) = backup_sheet {
        if let Some(range) = read_sheet(workbook, &name)? {
            source.backup = parse_backup(&range, &name, &mut source.warnings);
        }
    }

    Ok(source)
}

fn parse_transactions(
    range: &Range<DataType>,
    warnings: &mut Vec<CellWarning>,
) -> Vec<ParcelTransaction> {
    let sheet = SheetReader::new(range, "Parcel Txns");
    let mut transactions = Vec::new();
    for row in sheet.data_rows() {
        let order = row.text("Order Number");
        if order.is_empty() {
            continue;
        }
        transactions.push(ParcelTransaction {
            order,
            item: row.text("Billing Item"),
            rate: row.number("Rate/Unit", warnings),
            charge: row.number("Total Charge", warnings),
        });
    }
    transactions
}

fn parse_backup(
    range: &Range<DataType>,
    sheet_name: &str,
    warnings: &mut Vec<CellWarning>,
) -> Vec<ParcelShipmentRecord> {
    let sheet = SheetReader::new(range, sheet_name);
    let mut records = Vec::new();
    for row in sheet.data_rows() {
        let order = row.text("Order Number");
        if order.is_empty() {
            continue;
        }
        let bill_weight_type = BillWeightType::parse(&row.text("Bill Weight Type"));
        let surcharges = parse_surcharges(&row, warnings);
        records.push(ParcelShipmentRecord {
            order,
            shipped_date: row.text("Shipped Date"),
            service: row.text("Service Level"),
            actual_weight: row.number("Actual Weight", warnings),
            height: row.number("Height", warnings),
            width: row.number("Width", warnings),
            length: row.number("Length", warnings),
            dim_weight: row.number("Dim Weight", warnings),
            bill_weight: row.number("Bill Weight", warnings),
            bill_weight_type,
            city: row.text("City"),
            state: row.text("State"),
            zip: row.text("Postal Code"),
            zone: row.text("Zone"),
            total: row.number("Total Amount", warnings),
            adjustment: row.number("Adjustment", warnings),
            surcharges,
        });
    }
    records
}

/// Reads the ten fixed surcharge column pairs. A slot contributes a
/// surcharge only when its type cell is non-empty and its charge cell is
/// present; populated slots keep their source-column order.
fn parse_surcharges(row: &SheetRow<'_, '_>, warnings: &mut Vec<CellWarning>) -> Vec<Surcharge> {
    let mut surcharges = Vec::new();
    for slot in 1..=SURCHARGE_SLOTS {
        let kind = row.text(&format!("Fee Surcharge Type {slot}"));
        if kind.is_empty() {
            continue;
        }
        let charge_column = format!("Fee Type Charges {slot}");
        if !row.has_value(&charge_column) {
            continue;
        }
        let charge = row.number(&charge_column, warnings);
        surcharges.push(Surcharge { kind, charge });
    }
    surcharges
}

// ---------------------------------------------------------------------------
// Sheet access helpers
// ---------------------------------------------------------------------------

fn read_sheet<R: std::io::Read + std::io::Seek>(
    workbook: &mut Xlsx<R>,
    name: &str,
) -> Result<Option<Range<DataType>>> {
    match workbook.worksheet_range(name) {
        Some(range) => Ok(Some(range?)),
        None => Ok(None),
    }
}

/// Header-indexed view over a sheet whose first row names its columns.
struct SheetReader<'a> {
    range: &'a Range<DataType>,
    sheet: &'a str,
    headers: Vec<String>,
}

impl<'a> SheetReader<'a> {
    fn new(range: &'a Range<DataType>, sheet: &'a str) -> Self {
        let headers = match range.rows().next() {
            Some(first_row) => first_row
                .iter()
                .map(|cell| cell_to_string(Some(cell)).trim().to_string())
                .collect(),
            None => Vec::new(),
        };
        Self {
            range,
            sheet,
            headers,
        }
    }

    fn column(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|name| name == header)
    }

    fn data_rows<'s>(&'s self) -> impl Iterator<Item = SheetRow<'s, 'a>> {
        self.range
            .rows()
            .enumerate()
            .skip(1)
            .map(move |(idx, cells)| SheetRow {
                sheet: self,
                cells,
                // 1-based row number within the sheet's used range.
                row_number: idx + 1,
            })
    }
}

struct SheetRow<'s, 'a> {
    sheet: &'s SheetReader<'a>,
    cells: &'a [DataType],
    row_number: usize,
}

impl SheetRow<'_, '_> {
    fn cell(&self, header: &str) -> Option<&DataType> {
        self.sheet
            .column(header)
            .and_then(|idx| self.cells.get(idx))
    }

    fn text(&self, header: &str) -> String {
        cell_to_string(self.cell(header)).trim().to_string()
    }

    fn has_value(&self, header: &str) -> bool {
        !matches!(self.cell(header), Some(DataType::Empty) | None)
    }

    fn number(&self, header: &str, warnings: &mut Vec<CellWarning>) -> f64 {
        coerce_number(
            self.cell(header),
            self.sheet.sheet,
            header,
            self.row_number,
            warnings,
        )
    }
}

fn cell_to_string(cell: Option<&DataType>) -> String {
    match cell {
        Some(DataType::String(value)) => value.clone(),
        Some(DataType::Float(value)) => value.to_string(),
        Some(DataType::Int(value)) => value.to_string(),
        Some(DataType::Bool(value)) => value.to_string(),
        Some(DataType::Empty) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Coerces a cell to a number. Empty cells are 0 without comment; a
/// non-empty cell that fails to parse is 0 with a [`CellWarning`].
fn coerce_number(
    cell: Option<&DataType>,
    sheet: &str,
    column: &str,
    row: usize,
    warnings: &mut Vec<CellWarning>,
) -> f64 {
    match cell {
        Some(DataType::Float(value)) => *value,
        Some(DataType::Int(value)) => *value as f64,
        Some(DataType::Empty) | None => 0.0,
        Some(DataType::String(value)) => {
            let cleaned = value.trim().replace(['$', ','], "");
            if cleaned.is_empty() {
                return 0.0;
            }
            match cleaned.parse::<f64>() {
                Ok(parsed) => parsed,
                Err(_) => {
                    warnings.push(CellWarning {
                        sheet: sheet.to_string(),
                        column: column.to_string(),
                        row,
                        value: value.clone(),
                    });
                    0.0
                }
            }
        }
        Some(other) => {
            warnings.push(CellWarning {
                sheet: sheet.to_string(),
                column: column.to_string(),
                row,
                value: other.to_string(),
            });
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range_from(rows: Vec<Vec<DataType>>) -> Range<DataType> {
        let height = rows.len().max(1);
        let width = rows.iter().map(Vec::len).max().unwrap_or(1).max(1);
        let mut range = Range::new((0, 0), (height as u32 - 1, width as u32 - 1));
        for (row_idx, row) in rows.into_iter().enumerate() {
            for (col_idx, cell) in row.into_iter().enumerate() {
                range.set_value((row_idx as u32, col_idx as u32), cell);
            }
        }
        range
    }

    fn text(value: &str) -> DataType {
        DataType::String(value.to_string())
    }

    #[test]
    fn rate_card_scan_stops_at_blank_and_skips_totals() {
        let range = range_from(vec![
            vec![text("Client: Acme")],
            vec![
                text("Billing Type"),
                text("UOM"),
                text("Rate"),
                text("Qty"),
                text("Billed"),
            ],
            vec![
                text("OB Handling - Unit"),
                text("Unit"),
                DataType::Float(0.5),
                DataType::Float(1000.0),
                DataType::Float(550.0),
            ],
            vec![
                text("SUBTOTAL"),
                DataType::Empty,
                DataType::Empty,
                DataType::Empty,
                DataType::Float(550.0),
            ],
            vec![
                text("IB Handling - Case"),
                text("Case"),
                DataType::Float(0.85),
                DataType::Float(1200.0),
                DataType::Float(1020.0),
            ],
            vec![DataType::Empty],
            vec![text("Notes: never reached")],
        ]);

        let mut warnings = Vec::new();
        let lines = parse_rate_card(&range, &mut warnings);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].billing_type, "OB Handling - Unit");
        assert_eq!(lines[0].billed, 550.0);
        assert_eq!(lines[1].billing_type, "IB Handling - Case");
        assert!(warnings.is_empty());
    }

    #[test]
    fn rate_card_records_warning_for_bad_numeric_cell() {
        let range = range_from(vec![
            vec![
                text("Billing Type"),
                text("UOM"),
                text("Rate"),
                text("Qty"),
                text("Billed"),
            ],
            vec![
                text("Storage - Pallet"),
                text("Pallet"),
                text("n/a"),
                DataType::Float(40.0),
                DataType::Float(600.0),
            ],
        ]);

        let mut warnings = Vec::new();
        let lines = parse_rate_card(&range, &mut warnings);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].rate, 0.0);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].column, "Rate");
        assert_eq!(warnings[0].value, "n/a");
    }

    #[test]
    fn rate_card_absent_header_yields_no_lines() {
        let range = range_from(vec![vec![text("Some unrelated sheet")]]);
        let mut warnings = Vec::new();
        assert!(parse_rate_card(&range, &mut warnings).is_empty());
    }

    #[test]
    fn inbound_aggregate_ignores_unknown_uoms() {
        let range = range_from(vec![
            vec![text("UOM Received"), text("Quantity Received")],
            vec![text("Pallet"), DataType::Float(12.0)],
            vec![text("Case"), DataType::Float(300.0)],
            vec![text("Case"), DataType::Float(200.0)],
            vec![text("Each"), DataType::Float(40.0)],
            vec![text("Carton"), DataType::Float(999.0)],
        ]);

        let mut warnings = Vec::new();
        let totals = parse_inbound_aggregate(&range, &mut warnings);
        assert_eq!(totals.pallets, 12.0);
        assert_eq!(totals.cases, 500.0);
        assert_eq!(totals.each, 40.0);
    }

    #[test]
    fn materials_header_detected_on_second_column() {
        let range = range_from(vec![
            vec![text("Packaging Materials - March")],
            vec![
                DataType::Empty,
                text("Item Description"),
                text("Qty"),
                text("Unit"),
                text("Cost"),
            ],
            vec![
                DataType::Empty,
                text("6x6x6 Box"),
                DataType::Float(500.0),
                text("Each"),
                DataType::Float(275.0),
            ],
            vec![DataType::Empty, DataType::Empty],
            vec![
                DataType::Empty,
                text("Bubble Mailer"),
                DataType::Float(200.0),
                text("Each"),
                DataType::Float(64.0),
            ],
        ]);

        let mut warnings = Vec::new();
        let materials = parse_materials(&range, &mut warnings);
        assert_eq!(materials.len(), 2);
        assert_eq!(materials[0].item, "6x6x6 Box");
        assert_eq!(materials[0].cost, 275.0);
        assert_eq!(materials[1].item, "Bubble Mailer");
    }

    #[test]
    fn backup_surcharges_keep_column_order_and_skip_empty_slots() {
        let range = range_from(vec![
            vec![
                text("Order Number"),
                text("Total Amount"),
                text("Fee Surcharge Type 1"),
                text("Fee Type Charges 1"),
                text("Fee Surcharge Type 2"),
                text("Fee Type Charges 2"),
                text("Fee Surcharge Type 3"),
                text("Fee Type Charges 3"),
            ],
            vec![
                text("5001"),
                DataType::Float(18.40),
                text("FUEL"),
                DataType::Float(1.25),
                DataType::Empty,
                DataType::Float(9.99),
                text("DAS"),
                DataType::Float(4.50),
            ],
        ]);

        let mut warnings = Vec::new();
        let records = parse_backup(&range, "Parcel Backup", &mut warnings);
        assert_eq!(records.len(), 1);
        let surcharges = &records[0].surcharges;
        assert_eq!(surcharges.len(), 2);
        assert_eq!(surcharges[0].kind, "FUEL");
        assert_eq!(surcharges[1].kind, "DAS");
        assert_eq!(surcharges[1].charge, 4.50);
    }

    #[test]
    fn numeric_order_numbers_read_as_plain_strings() {
        let range = range_from(vec![
            vec![text("Order Number"), text("Total Amount")],
            vec![DataType::Float(5001.0), DataType::Float(10.0)],
        ]);

        let mut warnings = Vec::new();
        let records = parse_backup(&range, "Parcel Backup", &mut warnings);
        assert_eq!(records[0].order, "5001");
    }

    #[test]
    fn currency_strings_coerce_without_warning() {
        let mut warnings = Vec::new();
        let cell = text("$1,234.50");
        assert_eq!(
            coerce_number(Some(&cell), "Summary", "Billed", 2, &mut warnings),
            1234.50
        );
        assert!(warnings.is_empty());
    }
}
