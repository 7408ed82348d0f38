use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single point on the cumulative-investment chart.
///
/// Only the final point of a series ever carries `current_value` and
/// `profit_loss`; the frontend draws one marker at the right edge from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesDataPoint {
    pub date: NaiveDate,

    /// Running total of `amount` up to and including this record
    pub cumulative_invested: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_value: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profit_loss: Option<f64>,
}
