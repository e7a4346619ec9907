//! Shipping-Rate Client Wrapper
//!
//! A thin call to the external HTTP rate provider. Every failure mode —
//! transport error, timeout, non-2xx status, malformed payload, or a
//! provider-reported business error — collapses into [`ShippingError`], one
//! typed error distinguishable from every other failure kind. The checkout
//! path treats it as "proceed without shipping info", never as a reason to
//! fail. No retries happen here: one external call per order attempt keeps
//! checkout latency bounded.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Provider outage or rejection. Always absorbed by the caller.
#[derive(Debug, thiserror::Error)]
#[error("Shipping provider unavailable: {0}")]
pub struct ShippingError(pub String);

/// Quote request — destination plus declared package data.
#[derive(Debug, Clone, Serialize)]
pub struct QuoteRequest {
    pub to_province: String,
    pub to_district: String,
    pub to_ward: String,
    pub weight_grams: i64,
    pub length_cm: i64,
    pub width_cm: i64,
    pub height_cm: i64,
    pub service_type_id: i64,
}

/// Provider fee quote.
#[derive(Debug, Clone, Deserialize)]
pub struct FeeQuote {
    pub total: i64,
    #[serde(default)]
    pub service_id: i64,
    #[serde(default)]
    pub service_type_id: i64,
}

#[async_trait]
pub trait ShippingProvider: Send + Sync {
    async fn quote(&self, request: &QuoteRequest) -> Result<FeeQuote, ShippingError>;
}

/// HTTP client for the external rate provider.
#[derive(Debug, Clone)]
pub struct HttpShippingProvider {
    client: reqwest::Client,
    base_url: String,
}

impl HttpShippingProvider {
    pub fn new(base_url: impl Into<String>, timeout_ms: u64) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_millis(timeout_ms))
            .timeout(std::time::Duration::from_millis(timeout_ms))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

/// Provider envelope: `code != 200` is a business rejection even on HTTP 200.
#[derive(Debug, Deserialize)]
struct ProviderResponse {
    code: i64,
    #[serde(default)]
    message: String,
    data: Option<FeeQuote>,
}

#[async_trait]
impl ShippingProvider for HttpShippingProvider {
    async fn quote(&self, request: &QuoteRequest) -> Result<FeeQuote, ShippingError> {
        let url = format!("{}/shiip/public-api/v2/shipping-order/fee", self.base_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| ShippingError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ShippingError(format!("Provider returned {status}")));
        }

        let body: ProviderResponse = response
            .json()
            .await
            .map_err(|e| ShippingError(format!("Malformed provider payload: {e}")))?;

        if body.code != 200 {
            return Err(ShippingError(format!(
                "Provider error {}: {}",
                body.code, body.message
            )));
        }

        body.data
            .ok_or_else(|| ShippingError("Provider payload missing fee data".into()))
    }
}
