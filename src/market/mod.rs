pub mod asset_key;
pub mod hours;

pub use asset_key::{canonical_commodity, derive_asset_key};
pub use hours::{
    london_forex_open_reference, market_status, next_open_instant, us_market_open_reference,
    CutoffError, MarketStatus,
};
