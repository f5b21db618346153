use std::collections::HashMap;

use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

const FX_API_BASE: &str = "https://api.frankfurter.app";

#[derive(Debug, Error)]
pub enum FxClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    Unexpected(String),
}

#[derive(Debug, Deserialize)]
struct FxResponse {
    #[serde(default)]
    rates: HashMap<String, Decimal>,
}

/// Public FX conversion endpoint for `{BASE}->USD` spot rates.
#[derive(Debug, Clone)]
pub struct FxClient {
    http: Client,
    base_url: String,
}

impl FxClient {
    pub fn new(http: Client) -> Self {
        Self::with_base_url(http, FX_API_BASE.into())
    }

    pub fn with_base_url(http: Client, base_url: String) -> Self {
        Self { http, base_url }
    }

    /// Current conversion rate from `base` (e.g. "EUR") to USD.
    pub async fn get_usd_rate(&self, base: &str) -> Result<Decimal, FxClientError> {
        let url = format!("{}/latest", self.base_url);
        let resp = self
            .http
            .get(&url)
            .query(&[("from", base), ("to", "USD")])
            .send()
            .await?
            .error_for_status()?;

        let body: FxResponse = resp.json().await?;
        body.rates
            .get("USD")
            .copied()
            .ok_or_else(|| FxClientError::Unexpected(format!("no USD rate for {base}")))
    }
}
