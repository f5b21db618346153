//! Legacy symbol recovery.
//!
//! Early rows were written without `asset_symbol`. For those, the provider
//! ticker is reconstructed from the canonical asset key, or as a last resort
//! from the structured title ("Category: SYMBOL - Direction (...)"). New
//! rows always carry `asset_symbol`; this module can be deleted once the
//! old rows are migrated.

use crate::models::Prediction;

/// Best-effort provider ticker for a prediction.
pub fn recover_symbol(prediction: &Prediction) -> Option<String> {
    if let Some(symbol) = prediction.asset_symbol.as_deref() {
        let symbol = symbol.trim();
        if !symbol.is_empty() {
            return Some(symbol.to_string());
        }
    }

    symbol_from_asset_key(&prediction.asset_key)
        .or_else(|| symbol_from_title(&prediction.title))
}

/// `stock:india:reliance.ns` -> `RELIANCE.NS`, `crypto:btc` -> `BTC`,
/// `forex:eur_usd` -> `EUR`.
fn symbol_from_asset_key(key: &str) -> Option<String> {
    let mut parts = key.split(':');
    let prefix = parts.next()?;

    let identifier = match prefix {
        // stock keys carry a country segment before the identifier
        "stock" => {
            parts.next()?;
            parts.next()?
        }
        "forex" => {
            let pair = parts.next()?;
            return pair.split('_').next().map(|base| base.to_uppercase());
        }
        _ => parts.next()?,
    };

    let identifier = identifier.trim();
    if identifier.is_empty() {
        None
    } else {
        Some(identifier.to_uppercase())
    }
}

/// Parse `"Crypto: BTC - Up (5m)"` style titles.
fn symbol_from_title(title: &str) -> Option<String> {
    let (_, rest) = title.split_once(':')?;
    let symbol = rest.split(" - ").next()?.trim();

    if symbol.is_empty() {
        None
    } else {
        Some(symbol.to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn prediction(symbol: Option<&str>, key: &str, title: &str) -> Prediction {
        Prediction {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            category: "Crypto".into(),
            market_type: "global".into(),
            asset_symbol: symbol.map(str::to_string),
            asset_key: key.into(),
            title: title.into(),
            direction: "Up".into(),
            prediction_type: "intraday".into(),
            duration_minutes: Some(5),
            target_date: None,
            reference_time: None,
            reference_price: None,
            final_price: None,
            data_source: None,
            outcome: None,
            evaluation_time: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_prefers_asset_symbol() {
        let p = prediction(Some("BTC"), "crypto:eth", "Crypto: SOL - Up (5m)");
        assert_eq!(recover_symbol(&p).as_deref(), Some("BTC"));
    }

    #[test]
    fn test_recovers_from_asset_key() {
        let p = prediction(None, "crypto:btc", "");
        assert_eq!(recover_symbol(&p).as_deref(), Some("BTC"));

        let p = prediction(None, "stock:india:reliance.ns", "");
        assert_eq!(recover_symbol(&p).as_deref(), Some("RELIANCE.NS"));

        let p = prediction(None, "forex:eur_usd", "");
        assert_eq!(recover_symbol(&p).as_deref(), Some("EUR"));
    }

    #[test]
    fn test_recovers_from_title() {
        let p = prediction(None, "", "Crypto: BTC - Up (next 30 minutes)");
        assert_eq!(recover_symbol(&p).as_deref(), Some("BTC"));
    }

    #[test]
    fn test_unrecoverable() {
        let p = prediction(None, "", "free-form title with no structure");
        assert_eq!(recover_symbol(&p), None);
    }
}
