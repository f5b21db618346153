use std::future::Future;
use std::time::Duration;

use rust_decimal::Decimal;
use tokio::time::sleep;

use crate::market::asset_key::canonical_commodity;
use crate::models::{Category, Prediction};
use crate::pricing::{
    commodity_chart_symbol, crypto_pair, forex_base, tokenized_commodity_pair, ChartClient,
    FxClient, PriceSources, SpotClient,
};

use super::legacy::recover_symbol;

const STOCK_FETCH_ATTEMPTS: u32 = 3;
const STOCK_RETRY_BACKOFF_MS: u64 = 500;

/// One per asset class: knows which rows it owns and how to sample the
/// current price for them. The batch engine drives the rest.
pub trait PriceEvaluator: Send + Sync {
    fn category(&self) -> Category;

    /// Whether prolonged fetch failure past the unlock window converts the
    /// row into a terminal "Data Unavailable" outcome. Crypto and forex
    /// simply retry on the next run instead.
    fn allows_data_unavailable(&self) -> bool;

    /// Current price for the prediction's asset from this category's
    /// source. `Ok(None)` means no price was obtainable this run; fetch
    /// errors are logged here, never propagated.
    fn fetch_price(
        &self,
        prediction: &Prediction,
    ) -> impl Future<Output = anyhow::Result<Option<Decimal>>> + Send;
}

// ---------------------------------------------------------------------------
// Crypto
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CryptoEvaluator {
    spot: SpotClient,
}

impl CryptoEvaluator {
    pub fn new(sources: &PriceSources) -> Self {
        Self {
            spot: sources.spot.clone(),
        }
    }
}

impl PriceEvaluator for CryptoEvaluator {
    fn category(&self) -> Category {
        Category::Crypto
    }

    fn allows_data_unavailable(&self) -> bool {
        false
    }

    async fn fetch_price(&self, prediction: &Prediction) -> anyhow::Result<Option<Decimal>> {
        let Some(symbol) = recover_symbol(prediction) else {
            tracing::warn!(id = %prediction.id, "No symbol recoverable for crypto prediction");
            return Ok(None);
        };

        let pair = crypto_pair(&symbol);
        match self.spot.get_spot_price(&pair).await {
            Ok(price) => Ok(Some(price)),
            Err(e) => {
                tracing::warn!(error = %e, pair = %pair, "Crypto price fetch failed");
                Ok(None)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Forex
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ForexEvaluator {
    fx: FxClient,
}

impl ForexEvaluator {
    pub fn new(sources: &PriceSources) -> Self {
        Self {
            fx: sources.fx.clone(),
        }
    }
}

impl PriceEvaluator for ForexEvaluator {
    fn category(&self) -> Category {
        Category::Forex
    }

    fn allows_data_unavailable(&self) -> bool {
        false
    }

    async fn fetch_price(&self, prediction: &Prediction) -> anyhow::Result<Option<Decimal>> {
        let Some(symbol) = recover_symbol(prediction) else {
            tracing::warn!(id = %prediction.id, "No symbol recoverable for forex prediction");
            return Ok(None);
        };

        let base = forex_base(&symbol);
        match self.fx.get_usd_rate(&base).await {
            Ok(rate) => Ok(Some(rate)),
            Err(e) => {
                tracing::warn!(error = %e, base = %base, "Forex rate fetch failed");
                Ok(None)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Commodities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CommodityEvaluator {
    spot: SpotClient,
    chart: ChartClient,
}

impl CommodityEvaluator {
    pub fn new(sources: &PriceSources) -> Self {
        Self {
            spot: sources.spot.clone(),
            chart: sources.chart.clone(),
        }
    }
}

impl PriceEvaluator for CommodityEvaluator {
    fn category(&self) -> Category {
        Category::Commodities
    }

    fn allows_data_unavailable(&self) -> bool {
        true
    }

    async fn fetch_price(&self, prediction: &Prediction) -> anyhow::Result<Option<Decimal>> {
        let Some(symbol) = recover_symbol(prediction) else {
            tracing::warn!(id = %prediction.id, "No symbol recoverable for commodity prediction");
            return Ok(None);
        };

        let canonical = canonical_commodity(&symbol);

        // Gold/silver trade as tokenized spot pairs; the rest as futures.
        if let Some(pair) = tokenized_commodity_pair(&canonical) {
            return match self.spot.get_spot_price(&pair).await {
                Ok(price) => Ok(Some(price)),
                Err(e) => {
                    tracing::warn!(error = %e, pair = %pair, "Tokenized commodity fetch failed");
                    Ok(None)
                }
            };
        }

        let chart_symbol = commodity_chart_symbol(&canonical);
        match self.chart.latest_price(&chart_symbol).await {
            Ok(price) => Ok(price),
            Err(e) => {
                tracing::warn!(error = %e, symbol = %chart_symbol, "Commodity futures fetch failed");
                Ok(None)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Indices
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct IndexEvaluator {
    chart: ChartClient,
}

impl IndexEvaluator {
    pub fn new(sources: &PriceSources) -> Self {
        Self {
            chart: sources.chart.clone(),
        }
    }
}

impl PriceEvaluator for IndexEvaluator {
    fn category(&self) -> Category {
        Category::Indices
    }

    fn allows_data_unavailable(&self) -> bool {
        true
    }

    async fn fetch_price(&self, prediction: &Prediction) -> anyhow::Result<Option<Decimal>> {
        let Some(symbol) = recover_symbol(prediction) else {
            tracing::warn!(id = %prediction.id, "No symbol recoverable for index prediction");
            return Ok(None);
        };

        match self.chart.latest_price(&symbol).await {
            Ok(price) => Ok(price),
            Err(e) => {
                tracing::warn!(error = %e, symbol = %symbol, "Index price fetch failed");
                Ok(None)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Stocks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct StockEvaluator {
    chart: ChartClient,
}

impl StockEvaluator {
    pub fn new(sources: &PriceSources) -> Self {
        Self {
            chart: sources.chart.clone(),
        }
    }
}

impl PriceEvaluator for StockEvaluator {
    fn category(&self) -> Category {
        Category::Stocks
    }

    fn allows_data_unavailable(&self) -> bool {
        true
    }

    /// Up to three attempts with a short backoff. Lightly-traded symbols
    /// (BSE in particular) often omit the regular market price field, so
    /// each attempt falls back to the last non-null intraday close, then
    /// the previous session close.
    async fn fetch_price(&self, prediction: &Prediction) -> anyhow::Result<Option<Decimal>> {
        let Some(symbol) = recover_symbol(prediction) else {
            tracing::warn!(id = %prediction.id, "No symbol recoverable for stock prediction");
            return Ok(None);
        };

        for attempt in 1..=STOCK_FETCH_ATTEMPTS {
            match self.chart.get_quote(&symbol).await {
                Ok(quote) => {
                    if let Some(price) = quote.best_price() {
                        return Ok(Some(price));
                    }
                    tracing::debug!(
                        symbol = %symbol,
                        attempt = attempt,
                        "Quote returned no usable price"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        symbol = %symbol,
                        attempt = attempt,
                        "Stock quote fetch failed"
                    );
                }
            }

            if attempt < STOCK_FETCH_ATTEMPTS {
                sleep(Duration::from_millis(STOCK_RETRY_BACKOFF_MS * attempt as u64)).await;
            }
        }

        Ok(None)
    }
}
