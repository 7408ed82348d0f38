use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::investment::{Investment, InvestmentType};

/// Aggregate of all records sharing one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentSummary {
    #[serde(rename = "type")]
    pub investment_type: InvestmentType,

    /// Sum of `amount` over the category
    pub total_amount: f64,

    /// Number of records in the category
    pub count: usize,

    /// The records themselves, in input order
    pub investments: Vec<Investment>,
}

/// Whole-portfolio totals.
///
/// `by_fund` is keyed on the fund name alone, so positions of different
/// categories that share a name land in the same bucket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioStats {
    pub total_invested: f64,
    pub by_type: HashMap<InvestmentType, f64>,
    pub by_fund: HashMap<String, f64>,
}

/// Gain or loss of a single record against its cost basis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitLoss {
    pub profit_loss: f64,
    pub profit_loss_percentage: f64,
}

/// Performance of one `(type, fund_name)` position.
///
/// When no fund-level value was ever entered `current_value` is 0 and the
/// loss equals the full invested amount; display code is expected to treat
/// that as "no value yet" rather than a real loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundPerformance {
    pub fund_name: String,

    #[serde(rename = "type")]
    pub investment_type: InvestmentType,

    pub total_invested: f64,
    pub current_value: f64,
    pub profit_loss: f64,
    pub profit_loss_percentage: f64,
    pub investment_count: usize,
}

/// Dashboard headline figures computed from per-record current values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallPerformance {
    pub total_invested: f64,
    pub total_current_value: f64,
    pub profit_loss: f64,
    pub profit_loss_percentage: f64,
    /// False until at least one record carries a positive current value
    pub has_profit_loss: bool,
}
