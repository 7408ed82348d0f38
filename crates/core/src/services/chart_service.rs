use crate::models::chart::TimeSeriesDataPoint;
use crate::models::fund_value::FundCurrentValue;
use crate::models::investment::Investment;
use crate::services::analytics_service::AnalyticsService;

/// Builds chart-ready series from the record collection.
///
/// The core computes all the numbers; the presentation layer only renders.
pub struct ChartService {
    analytics_service: AnalyticsService,
}

impl ChartService {
    pub fn new() -> Self {
        Self {
            analytics_service: AnalyticsService::new(),
        }
    }

    /// Cumulative invested amount over time, one point per record.
    ///
    /// Records are ordered by date (ties keep their input order) and each
    /// point carries the running `amount` total. Only the last point gets a
    /// `current_value` and `profit_loss`, so the chart can draw a single
    /// marker at its right edge:
    /// - with fund values, the total is the sum of every position's fund value
    /// - otherwise it is the sum of the records' own current values
    ///
    /// A total of zero counts as "not entered" and leaves the last point bare.
    pub fn time_series(
        &self,
        investments: &[Investment],
        fund_values: &[FundCurrentValue],
    ) -> Vec<TimeSeriesDataPoint> {
        let mut sorted: Vec<&Investment> = investments.iter().collect();
        sorted.sort_by_key(|inv| inv.date);

        let mut cumulative_invested = 0.0;
        let mut points: Vec<TimeSeriesDataPoint> = sorted
            .into_iter()
            .map(|inv| {
                cumulative_invested += inv.amount;
                TimeSeriesDataPoint {
                    date: inv.date,
                    cumulative_invested,
                    current_value: None,
                    profit_loss: None,
                }
            })
            .collect();

        let total_current_value = self.total_current_value(investments, fund_values);
        if total_current_value > 0.0 {
            if let Some(last) = points.last_mut() {
                last.current_value = Some(total_current_value);
                last.profit_loss = Some(total_current_value - last.cumulative_invested);
            }
        }

        points
    }

    fn total_current_value(&self, investments: &[Investment], fund_values: &[FundCurrentValue]) -> f64 {
        if fund_values.is_empty() {
            return investments.iter().filter_map(|inv| inv.current_value).sum();
        }
        self.analytics_service
            .all_fund_performance(investments, fund_values)
            .iter()
            .map(|perf| perf.current_value)
            .sum()
    }
}

impl Default for ChartService {
    fn default() -> Self {
        Self::new()
    }
}
