//! Canonical record types the reconciliation engine operates on.
//!
//! Warehouse and parcel workbooks arrive as loosely-typed spreadsheets; the
//! normalizers in [`crate::io::excel_read`] project them into the structures
//! here. Everything is an immutable snapshot once parsed: the engine only
//! reads these values and constructs fresh [`Finding`]s from them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub mod category;

pub use category::{Category, CategoryInfo, Tier};

/// Two monetary values are considered equal when they differ by no more
/// than this many dollars. Keeps float noise in spreadsheet exports from
/// producing one-cent findings.
pub const MONEY_TOLERANCE: f64 = 0.02;

/// A numeric cell that could not be parsed and was coerced to zero.
///
/// The parse itself never fails on bad numbers; instead each coercion
/// failure is recorded so the caller can surface it next to the results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellWarning {
    /// Sheet the cell was read from.
    pub sheet: String,
    /// Column header (or positional label) of the cell.
    pub column: String,
    /// 1-based row number within the sheet.
    pub row: usize,
    /// The raw cell text that failed to parse.
    pub value: String,
}

impl fmt::Display for CellWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}!{} row {}: could not parse '{}' as a number, treated as 0",
            self.sheet, self.column, self.row, self.value
        )
    }
}

/// One line of the contracted rate card, parsed from the billing summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateCardLine {
    pub billing_type: String,
    pub uom: String,
    pub rate: f64,
    pub qty: f64,
    pub billed: f64,
}

/// One fulfilled order from the outbound summary. The set of these defines
/// which orders actually exist when hunting for phantom parcel charges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundOrder {
    pub order_number: String,
    pub lines: f64,
    pub units: f64,
    pub carrier: String,
    pub channel: String,
}

/// One inbound receipt line with its expected-vs-received delta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundLine {
    pub order: String,
    pub sku: String,
    pub received: f64,
    pub expected: f64,
    pub discrepancy: f64,
    pub status: String,
}

/// Received quantities bucketed by unit of measure. Units other than
/// Pallet, Case, and Each are ignored during aggregation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InboundAggregate {
    pub pallets: f64,
    pub cases: f64,
    pub each: f64,
}

/// One value-added-service labor line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VasLaborLine {
    pub date: String,
    pub vas_type: String,
    pub category: String,
    pub qty: f64,
    pub uom: String,
    pub notes: String,
}

/// One packaging-materials line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialLine {
    pub item: String,
    pub qty: f64,
    pub cost: f64,
}

/// One customer-return receipt line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnLine {
    pub order: String,
    pub sku: String,
    pub received: f64,
}

/// Everything extracted from a warehouse (EOM billing) workbook. Each
/// section is independently optional; a missing sheet just leaves its
/// field empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WarehouseSource {
    pub file_name: String,
    pub rate_card: Vec<RateCardLine>,
    pub outbound: Vec<OutboundOrder>,
    pub inbound: Vec<InboundLine>,
    pub inbound_totals: Option<InboundAggregate>,
    pub vas_labor: Vec<VasLaborLine>,
    pub materials: Vec<MaterialLine>,
    pub returns: Vec<ReturnLine>,
    /// Sum of `Received Quantity` across all return rows.
    pub return_units: f64,
    pub warnings: Vec<CellWarning>,
}

/// One parcel invoice line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParcelTransaction {
    pub order: String,
    /// Free-text billing item description.
    pub item: String,
    pub rate: f64,
    pub charge: f64,
}

/// One carrier surcharge attached to a shipment, in source-column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Surcharge {
    #[serde(rename = "type")]
    pub kind: String,
    pub charge: f64,
}

/// Which weight the carrier billed a shipment on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BillWeightType {
    Actual,
    Dimensional,
}

impl BillWeightType {
    /// Parses the cell value; anything unrecognised is treated as absent.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "Actual" => Some(Self::Actual),
            "Dimensional" => Some(Self::Dimensional),
            _ => None,
        }
    }
}

/// Shipment-level detail from the parcel backup sheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParcelShipmentRecord {
    pub order: String,
    pub shipped_date: String,
    pub service: String,
    pub actual_weight: f64,
    pub height: f64,
    pub width: f64,
    pub length: f64,
    pub dim_weight: f64,
    pub bill_weight: f64,
    pub bill_weight_type: Option<BillWeightType>,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub zone: String,
    pub total: f64,
    pub adjustment: f64,
    /// Populated surcharge slots only, preserving source-column order.
    pub surcharges: Vec<Surcharge>,
}

impl ParcelShipmentRecord {
    /// `"City, ST 12345"` destination string used on findings.
    pub fn location(&self) -> String {
        format!("{}, {} {}", self.city, self.state, self.zip)
    }
}

/// Everything extracted from a parcel invoice workbook.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParcelSource {
    pub file_name: String,
    pub transactions: Vec<ParcelTransaction>,
    pub backup: Vec<ParcelShipmentRecord>,
    pub warnings: Vec<CellWarning>,
}

/// Outcome of classifying and normalizing one uploaded workbook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParsedSource {
    Warehouse(WarehouseSource),
    Parcel(ParcelSource),
    Unknown { file_name: String },
}

impl ParsedSource {
    pub fn file_name(&self) -> &str {
        match self {
            ParsedSource::Warehouse(source) => &source.file_name,
            ParsedSource::Parcel(source) => &source.file_name,
            ParsedSource::Unknown { file_name } => file_name,
        }
    }
}

/// Label attached to a finding, describing the direction of the issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FindingLabel {
    Overcharge,
    Undercharge,
    Credit,
    Surcharge,
    Review,
    Short,
    Over,
}

impl fmt::Display for FindingLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            FindingLabel::Overcharge => "Overcharge",
            FindingLabel::Undercharge => "Undercharge",
            FindingLabel::Credit => "Credit",
            FindingLabel::Surcharge => "Surcharge",
            FindingLabel::Review => "Review",
            FindingLabel::Short => "Short",
            FindingLabel::Over => "Over",
        };
        f.write_str(text)
    }
}

/// One priced discrepancy produced by the rule engine. Immutable once
/// created; identifiers are deterministic functions of the source data so
/// reruns over identical inputs yield identical findings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub id: String,
    pub category: Category,
    /// Order number the finding is scoped to, or `"—"` for card-level findings.
    pub order: String,
    pub label: FindingLabel,
    pub description: String,
    /// Signed dollar impact; the magnitude is the amount at stake, the sign
    /// is only meaningful together with `is_overcharge`.
    pub amount: f64,
    pub is_overcharge: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub service: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub surcharges: Vec<Surcharge>,
}

impl Finding {
    /// Placeholder used for findings not tied to a single order.
    pub const NO_ORDER: &'static str = "—";
}

/// Per-category roll-up of findings. Recomputed in full on every run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub count: usize,
    /// Sum of |amount| over overcharge findings.
    pub overcharges: f64,
    /// Sum of |amount| over non-overcharge findings with a negative amount.
    pub credits: f64,
    /// Sum of |amount| over the remaining findings.
    pub neutral: f64,
}

/// The finished audit: the sole artifact handed to persistence and display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    pub findings: Vec<Finding>,
    /// Echo of the parsed rate card for downstream display.
    pub rate_card: Vec<RateCardLine>,
    pub category_summary: BTreeMap<Category, CategorySummary>,
    pub total_overcharges: f64,
    pub total_credits: f64,
    /// `total_overcharges - total_credits`.
    pub net_impact: f64,
    pub total_orders: usize,
    pub total_shipments: usize,
    pub total_warehouse_billed: f64,
    pub total_parcel_billed: f64,
    pub shipping_cost_per_order: f64,
    pub all_in_cost_per_order: f64,
}
