use chrono::{DateTime, NaiveDate, Utc};

use crate::errors::CoreError;
use crate::models::fund_value::FundCurrentValue;
use crate::models::investment::{Investment, InvestmentType};

pub const FUND_NAME_MIN: usize = 2;
pub const FUND_NAME_MAX: usize = 100;
pub const NOTES_MAX: usize = 500;
pub const AMOUNT_MIN: f64 = 0.01;
pub const AMOUNT_MAX: f64 = 999_999_999.0;
pub const PRICE_MAX: f64 = 999_999_999.0;
pub const CURRENT_VALUE_MAX: f64 = 999_999_999.0;
pub const SUPPORTED_CURRENCIES: [&str; 3] = ["TRY", "USD", "EUR"];

/// Edits to the record collection: add, update, delete, and the fund-level
/// current value that gets spread over a position's records.
///
/// Pure business logic, no I/O. Every operation takes the current collection
/// and returns the next one; persisting it is the caller's job.
pub struct PortfolioService;

impl PortfolioService {
    pub fn new() -> Self {
        Self
    }

    /// Check a record against the entry-form rules.
    ///
    /// Rules:
    /// - Type must be one of the four current categories
    /// - Fund name 2..=100 characters after trimming
    /// - Amount 0.01..=999,999,999
    /// - Price and current value, when present, 0..=999,999,999
    /// - Currency, when present, one of TRY/USD/EUR
    /// - Notes at most 500 characters
    /// - Date no later than tomorrow (timezone tolerance)
    pub fn validate(&self, investment: &Investment) -> Result<(), CoreError> {
        self.validate_as_of(investment, Utc::now().date_naive())
    }

    /// [`validate`](Self::validate) against an explicit "today".
    pub fn validate_as_of(&self, investment: &Investment, today: NaiveDate) -> Result<(), CoreError> {
        if !investment.investment_type.is_canonical() {
            return Err(CoreError::ValidationError(format!(
                "Unknown investment type \"{}\"",
                investment.investment_type
            )));
        }

        let name_len = investment.fund_name.trim().chars().count();
        if !(FUND_NAME_MIN..=FUND_NAME_MAX).contains(&name_len) {
            return Err(CoreError::ValidationError(format!(
                "Fund name must be {FUND_NAME_MIN} to {FUND_NAME_MAX} characters"
            )));
        }

        if !investment.amount.is_finite() || !(AMOUNT_MIN..=AMOUNT_MAX).contains(&investment.amount) {
            return Err(CoreError::ValidationError(format!(
                "Amount must be between {AMOUNT_MIN} and {AMOUNT_MAX}"
            )));
        }

        if let Some(price) = investment.price {
            if !price.is_finite() || !(0.0..=PRICE_MAX).contains(&price) {
                return Err(CoreError::ValidationError(format!(
                    "Unit price must be between 0 and {PRICE_MAX}"
                )));
            }
        }

        if let Some(value) = investment.current_value {
            if !value.is_finite() || !(0.0..=CURRENT_VALUE_MAX).contains(&value) {
                return Err(CoreError::ValidationError(format!(
                    "Current value must be between 0 and {CURRENT_VALUE_MAX}"
                )));
            }
        }

        if let Some(currency) = investment.currency.as_deref() {
            if !SUPPORTED_CURRENCIES.contains(&currency) {
                return Err(CoreError::ValidationError(format!(
                    "Unsupported currency {currency}"
                )));
            }
        }

        if let Some(notes) = investment.notes.as_deref() {
            if notes.chars().count() > NOTES_MAX {
                return Err(CoreError::ValidationError(format!(
                    "Notes can be at most {NOTES_MAX} characters"
                )));
            }
        }

        if let Some(tomorrow) = today.succ_opt() {
            if investment.date > tomorrow {
                return Err(CoreError::ValidationError(format!(
                    "Investment date {} is in the future",
                    investment.date
                )));
            }
        }

        Ok(())
    }

    /// Append a validated record. The fund name is stored trimmed.
    pub fn add(&self, investments: &[Investment], investment: Investment) -> Result<Vec<Investment>, CoreError> {
        self.validate(&investment)?;
        if investments.iter().any(|inv| inv.id == investment.id) {
            return Err(CoreError::ValidationError(format!(
                "Duplicate investment id {}",
                investment.id
            )));
        }

        let mut next = investments.to_vec();
        next.push(normalized(investment));
        Ok(next)
    }

    /// Replace the record with `updated.id`, keeping its position in the list.
    pub fn update(&self, investments: &[Investment], updated: Investment) -> Result<Vec<Investment>, CoreError> {
        let idx = investments
            .iter()
            .position(|inv| inv.id == updated.id)
            .ok_or_else(|| CoreError::InvestmentNotFound(updated.id.clone()))?;
        self.validate(&updated)?;

        let mut next = investments.to_vec();
        next[idx] = normalized(updated);
        Ok(next)
    }

    /// Remove a record by id. Deletion is immediate; nothing is kept behind.
    pub fn remove(&self, investments: &[Investment], id: &str) -> Result<Vec<Investment>, CoreError> {
        if !investments.iter().any(|inv| inv.id == id) {
            return Err(CoreError::InvestmentNotFound(id.to_string()));
        }
        Ok(investments.iter().filter(|inv| inv.id != id).cloned().collect())
    }

    /// Spread `new_total` over `records` in proportion to each record's share
    /// of the summed `amount`.
    ///
    /// When the records sum to zero invested, the total is split evenly.
    pub fn redistribute(&self, records: &[Investment], new_total: f64) -> Result<Vec<Investment>, CoreError> {
        if !new_total.is_finite() || new_total < 0.0 {
            return Err(CoreError::ValidationError(
                "Current value must be a non-negative number".into(),
            ));
        }

        let total_invested: f64 = records.iter().map(|inv| inv.amount).sum();
        let count = records.len() as f64;

        Ok(records
            .iter()
            .map(|inv| {
                let share = if total_invested > 0.0 {
                    inv.amount / total_invested
                } else {
                    1.0 / count
                };
                inv.clone().with_current_value(new_total * share)
            })
            .collect())
    }

    /// Set a position's total current value, redistributing it over the
    /// records of that `(investment_type, fund_name)` pair. Other records are
    /// returned unchanged and in place.
    pub fn apply_fund_current_value(
        &self,
        investments: &[Investment],
        fund_name: &str,
        investment_type: &InvestmentType,
        new_total: f64,
    ) -> Result<Vec<Investment>, CoreError> {
        let position: Vec<Investment> = investments
            .iter()
            .filter(|inv| inv.is_position(fund_name, investment_type))
            .cloned()
            .collect();
        if position.is_empty() {
            return Err(CoreError::InvestmentNotFound(format!(
                "{investment_type}/{fund_name}"
            )));
        }

        let mut redistributed = self.redistribute(&position, new_total)?.into_iter();
        Ok(investments
            .iter()
            .map(|inv| {
                if inv.is_position(fund_name, investment_type) {
                    redistributed.next().unwrap_or_else(|| inv.clone())
                } else {
                    inv.clone()
                }
            })
            .collect())
    }

    /// Insert or replace the fund-level current value for a position.
    pub fn upsert_fund_value(
        &self,
        values: &[FundCurrentValue],
        fund_name: &str,
        investment_type: &InvestmentType,
        current_value: f64,
        now: DateTime<Utc>,
    ) -> Result<Vec<FundCurrentValue>, CoreError> {
        if !current_value.is_finite() || !(0.0..=CURRENT_VALUE_MAX).contains(&current_value) {
            return Err(CoreError::ValidationError(format!(
                "Current value must be between 0 and {CURRENT_VALUE_MAX}"
            )));
        }

        let entry = FundCurrentValue::new(fund_name, investment_type.clone(), current_value, now);
        let mut next = values.to_vec();
        match next.iter_mut().find(|v| v.is_position(fund_name, investment_type)) {
            Some(existing) => *existing = entry,
            None => next.push(entry),
        }
        Ok(next)
    }

    /// Distinct `(investment_type, fund_name)` positions in first-seen order.
    pub fn funds(&self, investments: &[Investment]) -> Vec<(InvestmentType, String)> {
        let mut seen: Vec<(InvestmentType, String)> = Vec::new();
        for inv in investments {
            if !seen
                .iter()
                .any(|(t, name)| t == &inv.investment_type && name == &inv.fund_name)
            {
                seen.push((inv.investment_type.clone(), inv.fund_name.clone()));
            }
        }
        seen
    }
}

impl Default for PortfolioService {
    fn default() -> Self {
        Self::new()
    }
}

fn normalized(mut investment: Investment) -> Investment {
    let trimmed = investment.fund_name.trim();
    if trimmed.len() != investment.fund_name.len() {
        investment.fund_name = trimmed.to_string();
    }
    investment
}
