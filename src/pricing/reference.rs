use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::market::asset_key::canonical_commodity;
use crate::market::hours::{
    london_forex_open_reference, next_open_instant, us_market_open_reference, CutoffError,
};
use crate::models::{Category, MarketType, PredictionKind};

use super::{
    commodity_chart_symbol, crypto_pair, forex_base, tokenized_commodity_pair, PriceSources,
};

pub const SOURCE_SPOT: &str = "coinbase-spot";
pub const SOURCE_FX: &str = "frankfurter";
pub const SOURCE_CHART: &str = "yahoo-finance";

/// Result of reference resolution at creation time. `price` is None for
/// opening-mode assets whose reference is captured later by a validator;
/// `time` is then the deferred sampling instant.
#[derive(Debug, Clone, Serialize)]
pub struct ReferenceQuote {
    pub price: Option<Decimal>,
    pub time: DateTime<Utc>,
    pub source: String,
}

#[derive(Debug, Error)]
pub enum ResolveError {
    /// Opening-mode submission arrived after the session cutoff.
    #[error(transparent)]
    Cutoff(#[from] CutoffError),

    /// No price could be obtained for an intraday prediction, which would
    /// create a row that can never be evaluated.
    #[error("could not obtain a reference price for {0}")]
    PriceUnavailable(String),
}

/// Resolves the reference price for a new prediction from the correct
/// external source per asset class.
#[derive(Debug, Clone)]
pub struct ReferenceResolver {
    sources: PriceSources,
}

impl ReferenceResolver {
    pub fn new(sources: PriceSources) -> Self {
        Self { sources }
    }

    pub async fn resolve(
        &self,
        market_type: MarketType,
        category: Category,
        identifier: &str,
        kind: PredictionKind,
        now: DateTime<Utc>,
    ) -> Result<ReferenceQuote, ResolveError> {
        match market_type {
            MarketType::Stock | MarketType::Index => {
                self.resolve_exchange_quote(identifier, kind, now).await
            }
            MarketType::Global => match category {
                Category::Crypto => self.resolve_crypto(identifier, now).await,
                Category::Forex => self.resolve_forex(identifier, kind, now).await,
                Category::Commodities => self.resolve_commodity(identifier, kind, now).await,
                _ => self.resolve_exchange_quote(identifier, kind, now).await,
            },
        }
    }

    /// Crypto trades around the clock, so opening mode degenerates to an
    /// immediate spot sample.
    async fn resolve_crypto(
        &self,
        identifier: &str,
        now: DateTime<Utc>,
    ) -> Result<ReferenceQuote, ResolveError> {
        let pair = crypto_pair(identifier);
        match self.sources.spot.get_spot_price(&pair).await {
            Ok(price) => Ok(ReferenceQuote {
                price: Some(price),
                time: now,
                source: SOURCE_SPOT.into(),
            }),
            Err(e) => {
                tracing::warn!(error = %e, pair = %pair, "Spot reference fetch failed");
                Err(ResolveError::PriceUnavailable(pair))
            }
        }
    }

    async fn resolve_forex(
        &self,
        identifier: &str,
        kind: PredictionKind,
        now: DateTime<Utc>,
    ) -> Result<ReferenceQuote, ResolveError> {
        let base = forex_base(identifier);

        if kind == PredictionKind::Opening {
            let time = london_forex_open_reference(now)?;
            return Ok(ReferenceQuote {
                price: None,
                time,
                source: SOURCE_FX.into(),
            });
        }

        match self.sources.fx.get_usd_rate(&base).await {
            Ok(rate) => Ok(ReferenceQuote {
                price: Some(rate),
                time: now,
                source: SOURCE_FX.into(),
            }),
            Err(e) => {
                tracing::warn!(error = %e, base = %base, "FX reference fetch failed");
                Err(ResolveError::PriceUnavailable(format!("{base}/USD")))
            }
        }
    }

    async fn resolve_commodity(
        &self,
        identifier: &str,
        kind: PredictionKind,
        now: DateTime<Utc>,
    ) -> Result<ReferenceQuote, ResolveError> {
        let canonical = canonical_commodity(identifier);

        if kind == PredictionKind::Opening {
            let time = us_market_open_reference(now)?;
            let source = if tokenized_commodity_pair(&canonical).is_some() {
                SOURCE_SPOT
            } else {
                SOURCE_CHART
            };
            return Ok(ReferenceQuote {
                price: None,
                time,
                source: source.into(),
            });
        }

        if let Some(pair) = tokenized_commodity_pair(&canonical) {
            return match self.sources.spot.get_spot_price(&pair).await {
                Ok(price) => Ok(ReferenceQuote {
                    price: Some(price),
                    time: now,
                    source: SOURCE_SPOT.into(),
                }),
                Err(e) => {
                    tracing::warn!(error = %e, pair = %pair, "Tokenized commodity fetch failed");
                    Err(ResolveError::PriceUnavailable(canonical))
                }
            };
        }

        let symbol = commodity_chart_symbol(&canonical);
        match self.sources.chart.latest_price(&symbol).await {
            Ok(Some(price)) => Ok(ReferenceQuote {
                price: Some(price),
                time: now,
                source: SOURCE_CHART.into(),
            }),
            Ok(None) => Err(ResolveError::PriceUnavailable(canonical)),
            Err(e) => {
                tracing::warn!(error = %e, symbol = %symbol, "Commodity chart fetch failed");
                Err(ResolveError::PriceUnavailable(canonical))
            }
        }
    }

    /// Indices and stocks: most-recent-trade price from the chart endpoint.
    /// If the market is closed the endpoint naturally returns the last close.
    async fn resolve_exchange_quote(
        &self,
        identifier: &str,
        kind: PredictionKind,
        now: DateTime<Utc>,
    ) -> Result<ReferenceQuote, ResolveError> {
        if kind == PredictionKind::Opening {
            let time = next_open_instant(identifier, now)
                .ok_or_else(|| ResolveError::PriceUnavailable(identifier.to_string()))?;
            return Ok(ReferenceQuote {
                price: None,
                time,
                source: SOURCE_CHART.into(),
            });
        }

        match self.sources.chart.latest_price(identifier).await {
            Ok(Some(price)) => Ok(ReferenceQuote {
                price: Some(price),
                time: now,
                source: SOURCE_CHART.into(),
            }),
            Ok(None) => Err(ResolveError::PriceUnavailable(identifier.to_string())),
            Err(e) => {
                tracing::warn!(error = %e, symbol = %identifier, "Quote reference fetch failed");
                Err(ResolveError::PriceUnavailable(identifier.to_string()))
            }
        }
    }
}
