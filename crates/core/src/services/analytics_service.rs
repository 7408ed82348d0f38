use crate::models::analytics::{
    FundPerformance, InvestmentSummary, OverallPerformance, PortfolioStats, ProfitLoss,
};
use crate::models::fund_value::FundCurrentValue;
use crate::models::investment::{Investment, InvestmentType};
use crate::services::portfolio_service::PortfolioService;

/// Aggregates over the record collection: per-type summaries, portfolio
/// totals, and profit/loss per record, per fund and overall.
///
/// All amounts are TRY. Nothing here does I/O or mutates its inputs.
pub struct AnalyticsService {
    portfolio_service: PortfolioService,
}

impl AnalyticsService {
    pub fn new() -> Self {
        Self {
            portfolio_service: PortfolioService::new(),
        }
    }

    /// Group records by type, largest total first.
    ///
    /// Groups with equal totals keep the order their type first appeared in.
    pub fn calculate_summary(&self, investments: &[Investment]) -> Vec<InvestmentSummary> {
        let mut summaries: Vec<InvestmentSummary> = Vec::new();

        for inv in investments {
            match summaries
                .iter_mut()
                .find(|s| s.investment_type == inv.investment_type)
            {
                Some(summary) => {
                    summary.total_amount += inv.amount;
                    summary.count += 1;
                    summary.investments.push(inv.clone());
                }
                None => summaries.push(InvestmentSummary {
                    investment_type: inv.investment_type.clone(),
                    total_amount: inv.amount,
                    count: 1,
                    investments: vec![inv.clone()],
                }),
            }
        }

        // stable: ties keep first-seen order
        summaries.sort_by(|a, b| {
            b.total_amount
                .partial_cmp(&a.total_amount)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        summaries
    }

    /// Grand total plus per-type and per-fund-name totals.
    ///
    /// The per-fund map is keyed by name alone, so the same name under two
    /// types lands in one bucket.
    pub fn portfolio_stats(&self, investments: &[Investment]) -> PortfolioStats {
        let mut stats = PortfolioStats::default();
        for inv in investments {
            stats.total_invested += inv.amount;
            *stats
                .by_type
                .entry(inv.investment_type.clone())
                .or_insert(0.0) += inv.amount;
            *stats.by_fund.entry(inv.fund_name.clone()).or_insert(0.0) += inv.amount;
        }
        stats
    }

    /// Profit/loss of a single record against its own current value.
    ///
    /// A missing or zero current value yields zero profit and zero percent.
    pub fn profit_loss(&self, investment: &Investment) -> ProfitLoss {
        let Some(current) = investment.current_value.filter(|v| *v != 0.0) else {
            return ProfitLoss::default();
        };

        let profit_loss = current - investment.amount;
        ProfitLoss {
            profit_loss,
            profit_loss_percentage: percentage(profit_loss, investment.amount),
        }
    }

    /// Performance of one `(investment_type, fund_name)` position against its
    /// fund-level current value.
    ///
    /// Without a stored fund value the current value is 0, so profit/loss is
    /// `-total_invested`; callers should present that as "no value entered".
    pub fn fund_performance(
        &self,
        fund_name: &str,
        investment_type: &InvestmentType,
        investments: &[Investment],
        fund_values: &[FundCurrentValue],
    ) -> FundPerformance {
        let (total_invested, investment_count) = investments
            .iter()
            .filter(|inv| inv.is_position(fund_name, investment_type))
            .fold((0.0, 0), |(sum, n), inv| (sum + inv.amount, n + 1));

        let current_value = fund_values
            .iter()
            .find(|v| v.is_position(fund_name, investment_type))
            .map(|v| v.current_value)
            .unwrap_or(0.0);

        let profit_loss = current_value - total_invested;
        FundPerformance {
            fund_name: fund_name.to_string(),
            investment_type: investment_type.clone(),
            total_invested,
            current_value,
            profit_loss,
            profit_loss_percentage: percentage(profit_loss, total_invested),
            investment_count,
        }
    }

    /// [`fund_performance`](Self::fund_performance) for every position, in
    /// first-seen order.
    pub fn all_fund_performance(
        &self,
        investments: &[Investment],
        fund_values: &[FundCurrentValue],
    ) -> Vec<FundPerformance> {
        self.portfolio_service
            .funds(investments)
            .into_iter()
            .map(|(investment_type, fund_name)| {
                self.fund_performance(&fund_name, &investment_type, investments, fund_values)
            })
            .collect()
    }

    /// Portfolio-wide totals from the per-record current values.
    pub fn overall_performance(&self, investments: &[Investment]) -> OverallPerformance {
        let total_invested: f64 = investments.iter().map(|inv| inv.amount).sum();
        let total_current_value: f64 = investments
            .iter()
            .filter_map(|inv| inv.current_value)
            .sum();
        let profit_loss = total_current_value - total_invested;

        OverallPerformance {
            total_invested,
            total_current_value,
            profit_loss,
            profit_loss_percentage: percentage(profit_loss, total_invested),
            has_profit_loss: total_current_value > 0.0,
        }
    }

    /// Units held across records that carry a unit price (grams for gold,
    /// dollars for USD, and so on). Records without a price are skipped.
    pub fn fund_quantity(&self, investments: &[Investment]) -> f64 {
        investments.iter().filter_map(Investment::quantity).sum()
    }
}

impl Default for AnalyticsService {
    fn default() -> Self {
        Self::new()
    }
}

/// `delta / base * 100`, or 0 when there is no positive base.
fn percentage(delta: f64, base: f64) -> f64 {
    if base > 0.0 {
        (delta / base) * 100.0
    } else {
        0.0
    }
}
