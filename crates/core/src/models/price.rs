use serde::{Deserialize, Serialize};

use super::investment::InvestmentType;

/// Request body accepted by the price-lookup endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRequest {
    #[serde(rename = "type")]
    pub investment_type: InvestmentType,

    pub fund_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

/// A price quote returned by the lookup endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    /// Unit price, denominated in `currency`
    pub price: f64,
    pub currency: String,
    /// Upstream feed the price came from (e.g. "TCMB")
    pub source: String,
    /// ISO 8601 timestamp, as reported by the endpoint
    pub last_updated: String,
}

/// Envelope returned by the lookup endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceResponse {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<PriceQuote>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
