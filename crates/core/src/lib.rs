pub mod errors;
pub mod models;
pub mod providers;
pub mod services;
pub mod storage;

use chrono::Utc;
use models::{
    analytics::{FundPerformance, InvestmentSummary, OverallPerformance, PortfolioStats, ProfitLoss},
    chart::TimeSeriesDataPoint,
    fund_value::FundCurrentValue,
    investment::{Investment, InvestmentType},
    price::{PriceQuote, PriceRequest},
};
#[cfg(not(target_arch = "wasm32"))]
use models::settings::Settings;
use providers::price_api::estimate_current_value;
#[cfg(not(target_arch = "wasm32"))]
use providers::price_api::PriceApiClient;
use providers::traits::PriceProvider;
use services::{
    analytics_service::AnalyticsService, chart_service::ChartService,
    portfolio_service::PortfolioService,
};
use storage::format;
use storage::manager::{PersistOutcome, StorageManager};
use storage::migration::migrate_investments;
use storage::remote::Subscription;

use errors::CoreError;

/// Main entry point for the portfolio tracker core library.
///
/// Holds the in-memory canonical collection and fund values, plus the
/// services that operate on them. Every mutation validates, updates the
/// in-memory state and persists the whole collection through the
/// [`StorageManager`].
#[must_use]
pub struct PortfolioTracker {
    storage: StorageManager,
    investments: Vec<Investment>,
    fund_values: Vec<FundCurrentValue>,
    portfolio_service: PortfolioService,
    analytics_service: AnalyticsService,
    chart_service: ChartService,
    price_provider: Option<Box<dyn PriceProvider>>,
}

impl std::fmt::Debug for PortfolioTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortfolioTracker")
            .field("investments", &self.investments.len())
            .field("fund_values", &self.fund_values.len())
            .field("storage", &self.storage)
            .field(
                "price_provider",
                &self.price_provider.as_ref().map(|p| p.name().to_string()),
            )
            .finish()
    }
}

impl PortfolioTracker {
    /// Build stores from settings: file-backed local storage in
    /// `settings.data_dir`, Firestore when cloud settings are complete, and
    /// the price endpoint when one is configured. Call [`load`](Self::load)
    /// before reading.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn open(settings: &Settings) -> Result<Self, CoreError> {
        let storage = StorageManager::from_settings(settings)?;
        let mut tracker = Self::with_storage(storage);
        if let Some(url) = &settings.price_api_url {
            tracker.price_provider = Some(Box::new(PriceApiClient::new(url.clone())));
        }
        Ok(tracker)
    }

    /// Use a custom storage wiring (tests, WASM, shared in-memory cloud).
    pub fn with_storage(storage: StorageManager) -> Self {
        Self {
            storage,
            investments: Vec::new(),
            fund_values: Vec::new(),
            portfolio_service: PortfolioService::new(),
            analytics_service: AnalyticsService::new(),
            chart_service: ChartService::new(),
            price_provider: None,
        }
    }

    /// Replace the price lookup used by [`quote_current_value`](Self::quote_current_value).
    pub fn with_price_provider(mut self, provider: Box<dyn PriceProvider>) -> Self {
        self.price_provider = Some(provider);
        self
    }

    pub fn storage(&self) -> &StorageManager {
        &self.storage
    }

    // ── Loading ─────────────────────────────────────────────────────

    /// Pull the canonical records and fund values from storage.
    pub async fn load(&mut self) {
        self.investments = self.storage.get_investments().await;
        self.fund_values = self.storage.get_fund_values().await;
    }

    /// Swap in a collection received from a cloud subscription.
    pub fn replace_investments(&mut self, investments: Vec<Investment>) {
        self.investments = investments;
    }

    /// Follow remote changes. `on_change` receives each migrated snapshot;
    /// feed it back through [`replace_investments`](Self::replace_investments).
    /// `None` when the cloud is unavailable.
    pub fn subscribe<F>(&self, on_change: F) -> Option<Subscription>
    where
        F: Fn(Vec<Investment>) + Send + Sync + 'static,
    {
        self.storage.subscribe(on_change)
    }

    // ── Record Management ───────────────────────────────────────────

    #[must_use]
    pub fn investments(&self) -> &[Investment] {
        &self.investments
    }

    #[must_use]
    pub fn get_investment(&self, id: &str) -> Option<&Investment> {
        self.investments.iter().find(|inv| inv.id == id)
    }

    /// Investments of one type, newest first.
    #[must_use]
    pub fn investments_by_type(&self, investment_type: &InvestmentType) -> Vec<&Investment> {
        let mut found: Vec<&Investment> = self
            .investments
            .iter()
            .filter(|inv| &inv.investment_type == investment_type)
            .collect();
        found.sort_by(|a, b| b.date.cmp(&a.date));
        found
    }

    /// Validate and append a record, then persist the collection.
    pub async fn add_investment(&mut self, investment: Investment) -> Result<PersistOutcome, CoreError> {
        let next = self.portfolio_service.add(&self.investments, investment)?;
        Ok(self.commit_investments(next).await)
    }

    /// Validate and replace the record with the same id, then persist.
    pub async fn update_investment(&mut self, investment: Investment) -> Result<PersistOutcome, CoreError> {
        let next = self.portfolio_service.update(&self.investments, investment)?;
        Ok(self.commit_investments(next).await)
    }

    /// Delete a record by id, then persist.
    pub async fn remove_investment(&mut self, id: &str) -> Result<PersistOutcome, CoreError> {
        let next = self.portfolio_service.remove(&self.investments, id)?;
        Ok(self.commit_investments(next).await)
    }

    /// Set a position's total current value, spread over its records in
    /// proportion to their invested amounts, then persist the records.
    pub async fn set_fund_current_value(
        &mut self,
        fund_name: &str,
        investment_type: &InvestmentType,
        new_total: f64,
    ) -> Result<PersistOutcome, CoreError> {
        let next = self.portfolio_service.apply_fund_current_value(
            &self.investments,
            fund_name,
            investment_type,
            new_total,
        )?;
        Ok(self.commit_investments(next).await)
    }

    /// Store a fund-level current value (kept apart from the records).
    pub async fn set_fund_value(
        &mut self,
        fund_name: &str,
        investment_type: &InvestmentType,
        current_value: f64,
    ) -> Result<PersistOutcome, CoreError> {
        let next = self.portfolio_service.upsert_fund_value(
            &self.fund_values,
            fund_name,
            investment_type,
            current_value,
            Utc::now(),
        )?;
        self.fund_values = next;
        Ok(self.storage.save_fund_values(&self.fund_values).await)
    }

    #[must_use]
    pub fn fund_values(&self) -> &[FundCurrentValue] {
        &self.fund_values
    }

    // ── Import / Export ─────────────────────────────────────────────

    /// Replace the whole collection with the records of a JSON backup.
    ///
    /// Imported records are migrated before they are stored. Returns the
    /// number of records imported alongside the persistence outcome.
    pub async fn import_json(&mut self, json: &str) -> Result<(usize, PersistOutcome), CoreError> {
        let imported = migrate_investments(format::import_json(json)?);
        let count = imported.len();
        Ok((count, self.commit_investments(imported).await))
    }

    pub fn export_json(&self) -> Result<String, CoreError> {
        format::export_json(&self.investments, Utc::now())
    }

    pub fn export_csv(&self) -> Result<String, CoreError> {
        format::export_csv(&self.investments)
    }

    // ── Analytics ───────────────────────────────────────────────────

    #[must_use]
    pub fn summary(&self) -> Vec<InvestmentSummary> {
        self.analytics_service.calculate_summary(&self.investments)
    }

    #[must_use]
    pub fn portfolio_stats(&self) -> PortfolioStats {
        self.analytics_service.portfolio_stats(&self.investments)
    }

    /// Profit/loss of a single record, or `None` for an unknown id.
    #[must_use]
    pub fn profit_loss(&self, id: &str) -> Option<ProfitLoss> {
        self.get_investment(id)
            .map(|inv| self.analytics_service.profit_loss(inv))
    }

    #[must_use]
    pub fn fund_performance(&self, fund_name: &str, investment_type: &InvestmentType) -> FundPerformance {
        self.analytics_service.fund_performance(
            fund_name,
            investment_type,
            &self.investments,
            &self.fund_values,
        )
    }

    #[must_use]
    pub fn all_fund_performance(&self) -> Vec<FundPerformance> {
        self.analytics_service
            .all_fund_performance(&self.investments, &self.fund_values)
    }

    #[must_use]
    pub fn overall_performance(&self) -> OverallPerformance {
        self.analytics_service.overall_performance(&self.investments)
    }

    /// Units held in a position (grams, dollars, shares) from recorded unit prices.
    #[must_use]
    pub fn fund_quantity(&self, fund_name: &str, investment_type: &InvestmentType) -> f64 {
        let position: Vec<Investment> = self
            .investments
            .iter()
            .filter(|inv| inv.is_position(fund_name, investment_type))
            .cloned()
            .collect();
        self.analytics_service.fund_quantity(&position)
    }

    // ── Charts ──────────────────────────────────────────────────────

    #[must_use]
    pub fn time_series(&self) -> Vec<TimeSeriesDataPoint> {
        self.chart_service
            .time_series(&self.investments, &self.fund_values)
    }

    // ── Price Lookup ────────────────────────────────────────────────

    /// Ask the price endpoint for a record's instrument and estimate what
    /// the record is worth now. Nothing is stored; accepting the value is up
    /// to the caller (e.g. via [`update_investment`](Self::update_investment)).
    pub async fn quote_current_value(&self, id: &str) -> Result<(PriceQuote, f64), CoreError> {
        let provider = self.price_provider.as_ref().ok_or_else(|| CoreError::Api {
            provider: "PriceApi".into(),
            message: "No price endpoint configured".into(),
        })?;
        let investment = self
            .get_investment(id)
            .ok_or_else(|| CoreError::InvestmentNotFound(id.to_string()))?;

        let request = PriceRequest {
            investment_type: investment.investment_type.clone(),
            fund_name: investment.fund_name.clone(),
            currency: investment.currency.clone(),
        };
        let quote = provider.get_current_price(&request).await?;
        let estimate = estimate_current_value(investment, &quote);
        Ok((quote, estimate))
    }

    async fn commit_investments(&mut self, next: Vec<Investment>) -> PersistOutcome {
        self.investments = next;
        self.storage.save_investments(&self.investments).await
    }
}
