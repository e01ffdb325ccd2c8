//! Fixed registry of finding categories and their display metadata.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Severity tier of a category. Ordering doubles as the default sort
/// precedence in downstream displays; the engine itself never branches
/// on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Error,
    Optimize,
    Info,
}

/// The nine finding categories, declared in rule-evaluation order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    QtyMismatch,
    RateCardMath,
    PhantomCharge,
    PostBillIncrease,
    PostBillCredit,
    DeliverySurcharge,
    PeakSurcharge,
    DimWeight,
    InboundDiscrepancy,
}

/// Static display metadata for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub tier: Tier,
    pub icon: &'static str,
}

impl Category {
    /// Every category, in rule-evaluation order.
    pub const ALL: [Category; 9] = [
        Category::QtyMismatch,
        Category::RateCardMath,
        Category::PhantomCharge,
        Category::PostBillIncrease,
        Category::PostBillCredit,
        Category::DeliverySurcharge,
        Category::PeakSurcharge,
        Category::DimWeight,
        Category::InboundDiscrepancy,
    ];

    /// Stable snake_case key, matching the serialized representation.
    pub fn key(self) -> &'static str {
        match self {
            Category::QtyMismatch => "qty_mismatch",
            Category::RateCardMath => "rate_card_math",
            Category::PhantomCharge => "phantom_charge",
            Category::PostBillIncrease => "post_bill_increase",
            Category::PostBillCredit => "post_bill_credit",
            Category::DeliverySurcharge => "delivery_surcharge",
            Category::PeakSurcharge => "peak_surcharge",
            Category::DimWeight => "dim_weight",
            Category::InboundDiscrepancy => "inbound_discrepancy",
        }
    }

    /// Display metadata for the category.
    pub fn info(self) -> CategoryInfo {
        match self {
            Category::QtyMismatch => CategoryInfo {
                name: "Quantity Mismatch",
                description: "Billed quantities don't match actual receipts",
                tier: Tier::Error,
                icon: "⚠️",
            },
            Category::RateCardMath => CategoryInfo {
                name: "Rate Card Math Error",
                description: "Rate × Quantity doesn't equal billed amount",
                tier: Tier::Error,
                icon: "🧮",
            },
            Category::PhantomCharge => CategoryInfo {
                name: "Phantom Charges",
                description: "Parcel charges for orders not in Outbound Summary",
                tier: Tier::Error,
                icon: "👻",
            },
            Category::PostBillIncrease => CategoryInfo {
                name: "Post-Bill Increases",
                description: "Charges added after the original invoice",
                tier: Tier::Error,
                icon: "📈",
            },
            Category::PostBillCredit => CategoryInfo {
                name: "Post-Bill Credits",
                description: "Credits applied after the original invoice",
                tier: Tier::Error,
                icon: "📉",
            },
            Category::DeliverySurcharge => CategoryInfo {
                name: "Delivery Area Surcharges",
                description: "DAS/EDAS/RDAS/Residential carrier fees",
                tier: Tier::Optimize,
                icon: "🚚",
            },
            Category::PeakSurcharge => CategoryInfo {
                name: "Peak Surcharges",
                description: "Seasonal peak carrier surcharges",
                tier: Tier::Optimize,
                icon: "📅",
            },
            Category::DimWeight => CategoryInfo {
                name: "Dim Weight Opportunities",
                description: "Packages billed on dimensional weight vs actual",
                tier: Tier::Optimize,
                icon: "📦",
            },
            Category::InboundDiscrepancy => CategoryInfo {
                name: "Inbound Discrepancies",
                description: "Received quantities differ from expected",
                tier: Tier::Info,
                icon: "📋",
            },
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
