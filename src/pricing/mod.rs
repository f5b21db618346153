pub mod chart_client;
pub mod fx_client;
pub mod reference;
pub mod spot_client;

pub use chart_client::{ChartClient, ChartQuote};
pub use fx_client::FxClient;
pub use reference::{ReferenceQuote, ReferenceResolver, ResolveError};
pub use spot_client::SpotClient;

use std::time::Duration;

use crate::config::AppConfig;

/// Shared bundle of price-source clients, constructed once per process and
/// cloned into the creation workflow and each validator.
#[derive(Debug, Clone)]
pub struct PriceSources {
    pub spot: SpotClient,
    pub fx: FxClient,
    pub chart: ChartClient,
}

impl PriceSources {
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.price_fetch_timeout_secs))
            .build()?;

        let spot = match &config.spot_api_url {
            Some(url) => SpotClient::with_base_url(http.clone(), url.clone()),
            None => SpotClient::new(http.clone()),
        };
        let fx = match &config.fx_api_url {
            Some(url) => FxClient::with_base_url(http.clone(), url.clone()),
            None => FxClient::new(http.clone()),
        };
        let chart = match &config.chart_api_url {
            Some(url) => ChartClient::with_base_url(http.clone(), url.clone()),
            None => ChartClient::new(http),
        };

        Ok(Self { spot, fx, chart })
    }
}

/// Spot pair for a crypto identifier: `btc` -> `BTC-USD`.
pub fn crypto_pair(identifier: &str) -> String {
    let symbol: String = identifier
        .to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    format!("{symbol}-USD")
}

/// Base currency of a forex identifier: first three characters, uppercased.
pub fn forex_base(identifier: &str) -> String {
    identifier.trim().chars().take(3).collect::<String>().to_uppercase()
}

/// Tokenized proxy pair for spot-priced commodities.
pub fn tokenized_commodity_pair(canonical: &str) -> Option<String> {
    match canonical {
        "XAU" => Some("PAXG-USD".into()),
        "XAG" => Some("KAG-USD".into()),
        _ => None,
    }
}

/// Futures chart symbol for exchange-priced commodities.
pub fn commodity_chart_symbol(canonical: &str) -> String {
    match canonical {
        "WTI" => "CL=F".into(),
        "NG" => "NG=F".into(),
        other => format!("{other}=F"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crypto_pair() {
        assert_eq!(crypto_pair("btc"), "BTC-USD");
        assert_eq!(crypto_pair(" SOL "), "SOL-USD");
    }

    #[test]
    fn test_forex_base() {
        assert_eq!(forex_base("eur/usd"), "EUR");
        assert_eq!(forex_base(" gbp "), "GBP");
    }

    #[test]
    fn test_commodity_symbols() {
        assert_eq!(tokenized_commodity_pair("XAU").as_deref(), Some("PAXG-USD"));
        assert_eq!(tokenized_commodity_pair("WTI"), None);
        assert_eq!(commodity_chart_symbol("WTI"), "CL=F");
        assert_eq!(commodity_chart_symbol("NG"), "NG=F");
    }
}
