use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Schema version stamped on every record written by this crate.
/// Untagged records predate it and go through the legacy sniff rules.
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

/// Currency assumed when a record carries none.
pub const DEFAULT_CURRENCY: &str = "TRY";

/// Category of an investment record.
///
/// Serialized as the plain wire string (`"fon"`, `"döviz"`, ...) so data
/// persisted by earlier versions of the app round-trips unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InvestmentType {
    /// Pooled vehicles (mutual funds, precious-metal funds)
    Fund,
    /// Foreign currency and commodity holdings (USD, EUR, physical gold)
    Currency,
    /// Listed equities
    Stock,
    /// Anything else
    Other,
    /// A retired or unrecognized category value, kept verbatim.
    /// Only the migration step should ever need to look inside.
    Legacy(String),
}

impl InvestmentType {
    /// The persisted wire value.
    pub fn as_str(&self) -> &str {
        match self {
            InvestmentType::Fund => "fon",
            InvestmentType::Currency => "döviz",
            InvestmentType::Stock => "hisse",
            InvestmentType::Other => "diğer",
            InvestmentType::Legacy(raw) => raw,
        }
    }

    /// Human-readable label shown in summaries and charts.
    pub fn label(&self) -> &str {
        match self {
            InvestmentType::Fund => "Fon",
            InvestmentType::Currency => "Döviz",
            InvestmentType::Stock => "Hisse Senedi",
            InvestmentType::Other => "Diğer",
            InvestmentType::Legacy(raw) => raw,
        }
    }

    /// True for the four categories the app currently writes.
    pub fn is_canonical(&self) -> bool {
        !matches!(self, InvestmentType::Legacy(_))
    }
}

impl From<String> for InvestmentType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "fon" => InvestmentType::Fund,
            "döviz" => InvestmentType::Currency,
            "hisse" => InvestmentType::Stock,
            "diğer" => InvestmentType::Other,
            _ => InvestmentType::Legacy(raw),
        }
    }
}

impl From<&str> for InvestmentType {
    fn from(raw: &str) -> Self {
        InvestmentType::from(raw.to_string())
    }
}

impl From<InvestmentType> for String {
    fn from(t: InvestmentType) -> Self {
        match t {
            InvestmentType::Legacy(raw) => raw,
            other => other.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for InvestmentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single investment entry: one purchase of a fund, currency, stock or other asset.
///
/// `amount` is always the TRY cost basis. `price` is the unit price at purchase
/// time and is only used to back out a quantity for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Investment {
    /// Opaque unique identifier, never reused
    pub id: String,

    /// Economic date of the transaction
    #[serde(deserialize_with = "deserialize_date")]
    pub date: NaiveDate,

    #[serde(rename = "type")]
    pub investment_type: InvestmentType,

    /// Display name; `(investment_type, fund_name)` identifies a fund position
    pub fund_name: String,

    /// TRY cost basis
    pub amount: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Latest known TRY value of this record. `None` and `Some(0.0)` both mean "not entered".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_value: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<u32>,

    /// Profit/loss figures some clients stored on the record. Carried as-is;
    /// analytics always recompute their own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profit_loss: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profit_loss_percentage: Option<f64>,

    /// Fields this version does not model, written back untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Investment {
    pub fn new(
        date: NaiveDate,
        investment_type: InvestmentType,
        fund_name: impl Into<String>,
        amount: f64,
    ) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), date, investment_type, fund_name, amount)
    }

    /// Build a record with a caller-chosen id (seed data, imports, tests).
    pub fn with_id(
        id: impl Into<String>,
        date: NaiveDate,
        investment_type: InvestmentType,
        fund_name: impl Into<String>,
        amount: f64,
    ) -> Self {
        Self {
            id: id.into(),
            date,
            investment_type,
            fund_name: fund_name.into(),
            amount,
            price: None,
            currency: None,
            notes: None,
            current_value: None,
            schema_version: Some(CURRENT_SCHEMA_VERSION),
            profit_loss: None,
            profit_loss_percentage: None,
            extra: Map::new(),
        }
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_current_value(mut self, value: f64) -> Self {
        self.current_value = Some(value);
        self
    }

    pub fn currency_or_default(&self) -> &str {
        self.currency.as_deref().unwrap_or(DEFAULT_CURRENCY)
    }

    /// Units bought (`amount / price`), if a positive unit price was recorded.
    pub fn quantity(&self) -> Option<f64> {
        match self.price {
            Some(price) if price > 0.0 => Some(self.amount / price),
            _ => None,
        }
    }

    /// Whether a usable current value has been entered.
    ///
    /// Zero is treated the same as absent. This collapses "worth nothing" into
    /// "unknown" and is kept for compatibility with existing data.
    pub fn has_current_value(&self) -> bool {
        self.current_value.is_some_and(|v| v > 0.0)
    }

    /// True when this record belongs to the `(investment_type, fund_name)` position.
    pub fn is_position(&self, fund_name: &str, investment_type: &InvestmentType) -> bool {
        self.fund_name == fund_name && &self.investment_type == investment_type
    }
}

/// Dates are written as `YYYY-MM-DD`, but older clients and hand-edited
/// backups also carry full timestamps. Only the calendar date is kept.
fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).ok_or_else(|| de::Error::custom(format!("invalid date: {raw:?}")))
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|dt| dt.date())
        })
}
