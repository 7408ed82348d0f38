use async_trait::async_trait;
use reqwest::Client;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::investment::Investment;
use crate::models::price::{PriceQuote, PriceRequest, PriceResponse};

use super::traits::PriceProvider;

const PROVIDER: &str = "PriceApi";

/// Client for the app's price-lookup endpoint.
///
/// The endpoint proxies third-party feeds (central bank FX rates, gold
/// prices, stock quotes) and answers `{ success, data?, error? }`. This
/// client only consumes it; a failed lookup never touches stored records.
pub struct PriceApiClient {
    client: Client,
    endpoint: String,
}

impl PriceApiClient {
    /// `endpoint` is the full URL, e.g. `http://localhost:3000/api/price`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(Duration::from_secs(30));
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
            endpoint: endpoint.into(),
        }
    }
}

/// Turn the endpoint's envelope into a quote or a descriptive error.
pub fn parse_price_response(response: PriceResponse) -> Result<PriceQuote, CoreError> {
    if !response.success {
        return Err(CoreError::Api {
            provider: PROVIDER.into(),
            message: response
                .error
                .unwrap_or_else(|| "Price lookup failed".to_string()),
        });
    }

    let quote = response.data.ok_or_else(|| CoreError::Api {
        provider: PROVIDER.into(),
        message: "Successful response carried no price data".into(),
    })?;

    if !quote.price.is_finite() || quote.price <= 0.0 {
        return Err(CoreError::Api {
            provider: PROVIDER.into(),
            message: format!("Invalid price returned: {}", quote.price),
        });
    }
    Ok(quote)
}

/// Estimate a record's current TRY value from a fresh quote.
///
/// With a recorded unit price the held units are revalued at the quoted
/// price; without one the amount is scaled by the quote directly.
pub fn estimate_current_value(investment: &Investment, quote: &PriceQuote) -> f64 {
    match investment.quantity() {
        Some(units) => units * quote.price,
        None => investment.amount * quote.price,
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl PriceProvider for PriceApiClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn get_current_price(&self, request: &PriceRequest) -> Result<PriceQuote, CoreError> {
        let resp = self.client.post(&self.endpoint).json(request).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CoreError::Api {
                provider: PROVIDER.into(),
                message: format!("HTTP {}", status.as_u16()),
            });
        }

        let body: PriceResponse = resp.json().await.map_err(|e| CoreError::Api {
            provider: PROVIDER.into(),
            message: format!("Failed to parse response for {}: {e}", request.fund_name),
        })?;
        parse_price_response(body)
    }
}
