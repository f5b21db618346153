use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,

    // Shared secret for scheduler-triggered validator endpoints.
    // When unset, the trigger endpoints are open (dev mode).
    pub cron_secret: Option<String>,

    // Validation workers
    pub validators_enabled: bool,
    pub validator_interval_secs: u64,
    pub validator_batch_size: i64,

    // Price source endpoints (overridable for tests / proxies)
    pub spot_api_url: Option<String>,
    pub fx_api_url: Option<String>,
    pub chart_api_url: Option<String>,
    pub price_fetch_timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,

            cron_secret: env::var("CRON_SECRET").ok().filter(|s| !s.is_empty()),

            validators_enabled: env::var("VALIDATORS_ENABLED")
                .unwrap_or_else(|_| "true".into())
                .parse()
                .unwrap_or(true),
            validator_interval_secs: env::var("VALIDATOR_INTERVAL_SECS")
                .unwrap_or_else(|_| "60".into())
                .parse()
                .unwrap_or(60),
            validator_batch_size: env::var("VALIDATOR_BATCH_SIZE")
                .unwrap_or_else(|_| "50".into())
                .parse()
                .unwrap_or(50),

            spot_api_url: env::var("SPOT_API_URL").ok(),
            fx_api_url: env::var("FX_API_URL").ok(),
            chart_api_url: env::var("CHART_API_URL").ok(),
            price_fetch_timeout_secs: env::var("PRICE_FETCH_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".into())
                .parse()
                .unwrap_or(10),
        })
    }
}
