use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::investment::InvestmentType;

/// Current value entered once for a whole fund position.
///
/// Persisted separately from the investment records. When present,
/// fund-level analytics prefer it over summing per-record current values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundCurrentValue {
    pub fund_name: String,

    #[serde(rename = "type")]
    pub investment_type: InvestmentType,

    /// Latest known TRY value of the whole position
    pub current_value: f64,

    /// When the value was last entered
    pub last_updated: DateTime<Utc>,
}

impl FundCurrentValue {
    pub fn new(
        fund_name: impl Into<String>,
        investment_type: InvestmentType,
        current_value: f64,
        last_updated: DateTime<Utc>,
    ) -> Self {
        Self {
            fund_name: fund_name.into(),
            investment_type,
            current_value,
            last_updated,
        }
    }

    pub fn is_position(&self, fund_name: &str, investment_type: &InvestmentType) -> bool {
        self.fund_name == fund_name && &self.investment_type == investment_type
    }
}
