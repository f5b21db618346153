use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

const CHART_API_BASE: &str = "https://query1.finance.yahoo.com";

#[derive(Debug, Error)]
pub enum ChartClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    Unexpected(String),
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    indicators: Option<ChartIndicators>,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(default, rename = "regularMarketPrice")]
    regular_market_price: Option<Decimal>,
    #[serde(default, rename = "chartPreviousClose")]
    chart_previous_close: Option<Decimal>,
    #[serde(default, rename = "previousClose")]
    previous_close: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuoteSeries>,
}

#[derive(Debug, Deserialize)]
struct ChartQuoteSeries {
    #[serde(default)]
    close: Vec<Option<Decimal>>,
}

/// Parsed quote for one symbol: the most-recent-trade price plus the
/// intraday close series used as a fallback for symbols whose regular
/// market price field is absent (typical for lightly-traded BSE tickers).
#[derive(Debug, Clone, Default)]
pub struct ChartQuote {
    pub regular_market_price: Option<Decimal>,
    pub previous_close: Option<Decimal>,
    pub closes: Vec<Option<Decimal>>,
}

impl ChartQuote {
    /// Last non-null entry in the intraday close series.
    pub fn last_close(&self) -> Option<Decimal> {
        self.closes.iter().rev().flatten().copied().next()
    }

    /// Regular market price, falling back to the last intraday close,
    /// then the previous session close.
    pub fn best_price(&self) -> Option<Decimal> {
        self.regular_market_price
            .or_else(|| self.last_close())
            .or(self.previous_close)
    }
}

/// Futures/equities chart-quote endpoint. When the market is closed the
/// same endpoint returns the last close as the most recent trade.
#[derive(Debug, Clone)]
pub struct ChartClient {
    http: Client,
    base_url: String,
}

impl ChartClient {
    pub fn new(http: Client) -> Self {
        Self::with_base_url(http, CHART_API_BASE.into())
    }

    pub fn with_base_url(http: Client, base_url: String) -> Self {
        Self { http, base_url }
    }

    pub async fn get_quote(&self, symbol: &str) -> Result<ChartQuote, ChartClientError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        let resp = self
            .http
            .get(&url)
            .query(&[("interval", "1m"), ("range", "1d")])
            .send()
            .await?
            .error_for_status()?;

        let body: ChartResponse = resp.json().await?;
        let result = body
            .chart
            .result
            .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
            .ok_or_else(|| ChartClientError::Unexpected(format!("empty chart for {symbol}")))?;

        let closes = result
            .indicators
            .and_then(|i| i.quote.into_iter().next())
            .map(|q| q.close)
            .unwrap_or_default();

        Ok(ChartQuote {
            regular_market_price: result.meta.regular_market_price,
            previous_close: result
                .meta
                .previous_close
                .or(result.meta.chart_previous_close),
            closes,
        })
    }

    /// Most-recent-trade price for a symbol.
    pub async fn latest_price(&self, symbol: &str) -> Result<Option<Decimal>, ChartClientError> {
        Ok(self.get_quote(symbol).await?.regular_market_price)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
