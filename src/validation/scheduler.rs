use chrono::Utc;
use metrics::gauge;
use sqlx::PgPool;
use tokio::time::{interval, Duration};

use crate::config::AppConfig;
use crate::db::prediction_repo;
use crate::models::Category;
use crate::pricing::PriceSources;

use super::engine::run_category_batch;

/// Interval-scheduled validation loop for one asset class. Workers share
/// nothing in-process between runs; all coordination happens through the
/// prediction rows.
pub async fn run_validator(
    pool: PgPool,
    sources: PriceSources,
    category: Category,
    interval_secs: u64,
    batch_size: i64,
) {
    tracing::info!(
        category = %category,
        interval_secs = interval_secs,
        "Validation worker started"
    );

    let mut ticker = interval(Duration::from_secs(interval_secs));

    loop {
        ticker.tick().await;

        match run_category_batch(&pool, &sources, category, batch_size, Utc::now()).await {
            Ok(summary) => {
                if summary.processed > 0 {
                    tracing::info!(
                        category = %category,
                        processed = summary.processed,
                        scanned = summary.details.len(),
                        "Validation cycle resolved predictions"
                    );
                } else {
                    tracing::debug!(
                        category = %category,
                        scanned = summary.details.len(),
                        "Validation cycle: nothing to resolve"
                    );
                }
            }
            Err(e) => {
                tracing::error!(error = %e, category = %category, "Validation cycle failed");
            }
        }

        if let Ok(pending) = prediction_repo::count_pending(&pool).await {
            gauge!("predictions_pending").set(pending as f64);
        }
    }
}

/// Spawn one independent worker per asset class.
pub fn spawn_validators(pool: &PgPool, sources: &PriceSources, config: &AppConfig) {
    for category in Category::ALL {
        let pool = pool.clone();
        let sources = sources.clone();
        let interval_secs = config.validator_interval_secs;
        let batch_size = config.validator_batch_size;

        tokio::spawn(async move {
            run_validator(pool, sources, category, interval_secs, batch_size).await;
        });
    }
}
