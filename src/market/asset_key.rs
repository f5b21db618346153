use crate::models::{Category, MarketType};

/// Derive the canonical dedup key for an asset. Deterministic and
/// side-effect-free: two submissions naming the same logical asset must
/// produce the same key, and distinct assets must never collide.
pub fn derive_asset_key(
    market_type: MarketType,
    category: Category,
    country: Option<&str>,
    identifier: &str,
) -> String {
    match market_type {
        MarketType::Stock => {
            let country = country.unwrap_or_default().trim().to_lowercase();
            format!("stock:{}:{}", country, identifier.trim().to_lowercase())
        }
        MarketType::Index => {
            format!("index:{}", identifier.trim().to_lowercase())
        }
        MarketType::Global => match category {
            Category::Crypto => {
                format!("crypto:{}", clean_symbol(identifier).to_lowercase())
            }
            Category::Forex => {
                let base: String = identifier.trim().chars().take(3).collect();
                format!("forex:{}_usd", base.to_lowercase())
            }
            Category::Commodities => {
                format!("commodity:{}", canonical_commodity(identifier).to_lowercase())
            }
            _ => format!("global:{}", identifier.trim().to_lowercase()),
        },
    }
}

/// Collapse common commodity names onto one canonical symbol so that
/// e.g. "Gold", "GOLD futures" and "XAU" all key identically.
pub fn canonical_commodity(identifier: &str) -> String {
    let upper = identifier.to_uppercase();

    if upper.contains("GOLD") {
        return "XAU".into();
    }
    if upper.contains("SILVER") {
        return "XAG".into();
    }
    if upper.contains("CRUDE") || upper.contains("OIL") || upper.contains("WTI") {
        return "WTI".into();
    }
    if upper.contains("GAS") || upper.contains("NATURAL") || upper.contains("NG") {
        return "NG".into();
    }

    clean_symbol(identifier)
}

/// Uppercase and strip everything that is not a letter or digit.
fn clean_symbol(identifier: &str) -> String {
    identifier
        .to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
