use chrono::{DateTime, Duration, Utc};
use metrics::counter;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::prediction_repo;
use crate::models::{judge_outcome, Category, Outcome, Prediction};
use crate::pricing::PriceSources;

use super::evaluators::{
    CommodityEvaluator, CryptoEvaluator, ForexEvaluator, IndexEvaluator, PriceEvaluator,
    StockEvaluator,
};

/// Grace period past unlock before a persistently unpriceable row is
/// terminally marked "Data Unavailable" (where the evaluator allows it).
const STALE_GRACE_HOURS: i64 = 1;

#[derive(Debug, Serialize)]
pub struct RowDetail {
    pub id: Uuid,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BatchSummary {
    pub processed: usize,
    pub details: Vec<RowDetail>,
}

fn detail(id: Uuid, action: impl Into<String>) -> RowDetail {
    RowDetail {
        id,
        action: action.into(),
        outcome: None,
    }
}

/// One validation pass over a category's pending predictions.
///
/// Each row runs through reference backfill (Phase A) and outcome
/// evaluation (Phase B) independently; a failure on one row never blocks
/// the rest of the batch.
pub async fn run_batch<E: PriceEvaluator>(
    pool: &PgPool,
    evaluator: &E,
    batch_size: i64,
    now: DateTime<Utc>,
) -> anyhow::Result<BatchSummary> {
    let pending =
        prediction_repo::get_pending_by_category(pool, evaluator.category(), batch_size).await?;

    let mut details = Vec::with_capacity(pending.len());
    let mut processed = 0usize;

    for row in pending {
        let mut prediction = row;
        let row_detail = match process_row(pool, evaluator, &mut prediction, now).await {
            Ok(d) => d,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    id = %prediction.id,
                    category = %evaluator.category(),
                    "Validation failed for row"
                );
                detail(prediction.id, format!("error: {e}"))
            }
        };

        if row_detail.outcome.is_some() {
            processed += 1;
        }
        details.push(row_detail);
    }

    Ok(BatchSummary { processed, details })
}

async fn process_row<E: PriceEvaluator>(
    pool: &PgPool,
    evaluator: &E,
    prediction: &mut Prediction,
    now: DateTime<Utc>,
) -> anyhow::Result<RowDetail> {
    let id = prediction.id;

    // Phase A — reference backfill. Opening-mode rows are created without a
    // price; the real opening price only exists once the session has begun.
    if prediction.reference_price.is_none() {
        let Some(reference_time) = prediction.reference_time.or(prediction.target_date) else {
            return Ok(detail(id, "no reference instant"));
        };

        if now < reference_time {
            return Ok(detail(id, "awaiting reference window"));
        }

        let Some(price) = evaluator.fetch_price(prediction).await? else {
            return Ok(detail(id, "reference price unavailable"));
        };

        prediction_repo::set_reference_price(pool, id, price).await?;
        prediction.reference_price = Some(price);
        if prediction.reference_time.is_none() {
            prediction.reference_time = Some(reference_time);
        }

        tracing::info!(id = %id, price = %price, "Opening reference captured");
        // fall through: the same run may already be able to evaluate
    }

    // Phase B — outcome evaluation.
    let Some(unlock) = prediction.unlock_time() else {
        return Ok(detail(id, "no unlock time"));
    };

    if now < unlock {
        return Ok(detail(id, "locked"));
    }

    let Some(reference_price) = prediction.reference_price else {
        return Ok(detail(id, "missing reference price"));
    };

    let Some(final_price) = evaluator.fetch_price(prediction).await? else {
        if evaluator.allows_data_unavailable()
            && now > unlock + Duration::hours(STALE_GRACE_HOURS)
        {
            let claimed =
                prediction_repo::claim_outcome(pool, id, None, Outcome::DataUnavailable, now)
                    .await?;
            if claimed {
                counter!("predictions_data_unavailable").increment(1);
                tracing::warn!(id = %id, "No price obtainable past stale window, marked Data Unavailable");
                return Ok(RowDetail {
                    id,
                    action: "stale".into(),
                    outcome: Some(Outcome::DataUnavailable.as_str().into()),
                });
            }
            return Ok(detail(id, "already evaluated"));
        }
        return Ok(detail(id, "final price unavailable, will retry"));
    };

    let Some(direction) = prediction.direction() else {
        return Ok(detail(id, format!("unparseable direction {:?}", prediction.direction)));
    };

    let outcome = judge_outcome(direction, reference_price, final_price);
    let claimed =
        prediction_repo::claim_outcome(pool, id, Some(final_price), outcome, now).await?;

    if !claimed {
        return Ok(detail(id, "already evaluated"));
    }

    counter!("predictions_evaluated").increment(1);
    tracing::info!(
        id = %id,
        outcome = %outcome,
        reference_price = %reference_price,
        final_price = %final_price,
        "Prediction evaluated"
    );

    Ok(RowDetail {
        id,
        action: "evaluated".into(),
        outcome: Some(outcome.as_str().into()),
    })
}

/// Run one batch for a category with its concrete evaluator.
pub async fn run_category_batch(
    pool: &PgPool,
    sources: &PriceSources,
    category: Category,
    batch_size: i64,
    now: DateTime<Utc>,
) -> anyhow::Result<BatchSummary> {
    match category {
        Category::Crypto => run_batch(pool, &CryptoEvaluator::new(sources), batch_size, now).await,
        Category::Forex => run_batch(pool, &ForexEvaluator::new(sources), batch_size, now).await,
        Category::Commodities => {
            run_batch(pool, &CommodityEvaluator::new(sources), batch_size, now).await
        }
        Category::Indices => run_batch(pool, &IndexEvaluator::new(sources), batch_size, now).await,
        Category::Stocks => run_batch(pool, &StockEvaluator::new(sources), batch_size, now).await,
    }
}
