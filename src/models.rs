use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::palette::Colour;

#[derive(Debug, Clone)]
pub struct Representative {
    pub id: Uuid,
    pub full_name: String,
    pub party_name: String,
    pub party_colour_code: String,
}

#[derive(Debug, Clone)]
pub struct Constituency {
    pub id: String,
    pub name: String,
    /// GeoJSON geometry, absent until boundaries have been loaded.
    pub geometry: Option<String>,
    /// Kilometres from the constituency centroid to central London.
    pub distance_to_capital: f64,
}

/// One representation period, pre-joined with the representative it seats.
#[derive(Debug, Clone)]
pub struct PeriodRow {
    pub constituency_id: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub representative: Representative,
}

/// The fixed cost-category set used by the expense store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
pub enum CostCategory {
    #[serde(rename = "Accommodation")]
    Accommodation,
    #[serde(rename = "Office Costs")]
    OfficeCosts,
    #[serde(rename = "Staffing")]
    Staffing,
    #[serde(rename = "MP Travel")]
    Travel,
    #[serde(rename = "Windup")]
    Windup,
}

impl CostCategory {
    /// Parse a store label back into a category.
    pub fn from_label(label: &str) -> Option<CostCategory> {
        match label {
            "Accommodation" => Some(CostCategory::Accommodation),
            "Office Costs" => Some(CostCategory::OfficeCosts),
            "Staffing" => Some(CostCategory::Staffing),
            "MP Travel" => Some(CostCategory::Travel),
            "Windup" => Some(CostCategory::Windup),
            _ => None,
        }
    }

    /// Label as stored in the expenses relation.
    pub fn as_label(&self) -> &'static str {
        match self {
            CostCategory::Accommodation => "Accommodation",
            CostCategory::OfficeCosts => "Office Costs",
            CostCategory::Staffing => "Staffing",
            CostCategory::Travel => "MP Travel",
            CostCategory::Windup => "Windup",
        }
    }
}

impl std::fmt::Display for CostCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_label())
    }
}

#[derive(Debug, Clone)]
pub struct ExpenseItem {
    pub representative_id: Uuid,
    pub financial_year: String,
    pub cost_category: CostCategory,
    pub amount_paid: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Incumbency {
    /// The representative seated when the fiscal year began.
    Outgoing,
    /// The representative seated through the end of the fiscal year.
    Incoming,
}

impl Incumbency {
    pub fn label(&self) -> &'static str {
        match self {
            Incumbency::Outgoing => "outgoing MP",
            Incumbency::Incoming => "incoming MP",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Metric {
    /// Total amount paid over the selected categories.
    Total,
    /// Amount paid per kilometre of distance to the capital.
    PerDistance,
}

impl Metric {
    pub fn label(&self) -> &'static str {
        match self {
            Metric::Total => "total spend",
            Metric::PerDistance => "spend per km",
        }
    }
}

/// One choropleth row per constituency, ready for the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRow {
    pub constituency_id: String,
    pub constituency_name: String,
    pub geometry: Option<String>,
    pub distance_to_capital: f64,
    pub full_name: Option<String>,
    pub party_name: Option<String>,
    pub party_colour_code: Option<String>,
    pub total_amount: i64,
    pub per_distance: Option<f64>,
    pub bin: Option<usize>,
    pub fill_colour: Option<Colour>,
    pub cost_category_label: String,
}
