use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

const SPOT_API_BASE: &str = "https://api.coinbase.com";

#[derive(Debug, Error)]
pub enum SpotClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    Unexpected(String),
}

#[derive(Debug, Deserialize)]
struct SpotResponse {
    data: SpotData,
}

#[derive(Debug, Deserialize)]
struct SpotData {
    amount: String,
}

/// Public spot-quote endpoint for `{SYMBOL}-USD` pairs. Serves crypto
/// directly and gold/silver through tokenized commodity pairs.
#[derive(Debug, Clone)]
pub struct SpotClient {
    http: Client,
    base_url: String,
}

impl SpotClient {
    pub fn new(http: Client) -> Self {
        Self::with_base_url(http, SPOT_API_BASE.into())
    }

    pub fn with_base_url(http: Client, base_url: String) -> Self {
        Self { http, base_url }
    }

    /// Current spot price for a pair like `BTC-USD`.
    pub async fn get_spot_price(&self, pair: &str) -> Result<Decimal, SpotClientError> {
        let url = format!("{}/v2/prices/{}/spot", self.base_url, pair);
        let resp = self.http.get(&url).send().await?.error_for_status()?;

        let body: SpotResponse = resp.json().await?;
        body.data
            .amount
            .parse()
            .map_err(|_| SpotClientError::Unexpected(format!(
                "non-numeric amount: {}",
                body.data.amount
            )))
    }
}
