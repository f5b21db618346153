use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Category, NewPrediction, Outcome, Prediction, PredictionKind};

/// Insert a new prediction row. Exactly one insert per successful creation.
pub async fn insert_prediction(
    pool: &PgPool,
    new: &NewPrediction,
) -> anyhow::Result<Prediction> {
    let prediction = sqlx::query_as::<_, Prediction>(
        r#"
        INSERT INTO predictions (
            user_id, category, market_type, asset_symbol, asset_key, title,
            direction, prediction_type, duration_minutes, target_date,
            reference_time, reference_price, data_source
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        RETURNING *
        "#,
    )
    .bind(new.user_id)
    .bind(&new.category)
    .bind(&new.market_type)
    .bind(&new.asset_symbol)
    .bind(&new.asset_key)
    .bind(&new.title)
    .bind(new.direction.as_str())
    .bind(new.kind.as_str())
    .bind(new.duration_minutes)
    .bind(new.target_date)
    .bind(new.reference_time)
    .bind(new.reference_price)
    .bind(&new.data_source)
    .fetch_one(pool)
    .await?;

    Ok(prediction)
}

/// Look for an existing unresolved prediction by the same user on the same
/// asset key. Intraday predictions are scoped by duration so a user can hold
/// concurrent predictions on the same asset at different timeframes; opening
/// predictions are scoped by kind.
pub async fn find_active_duplicate(
    pool: &PgPool,
    user_id: Uuid,
    asset_key: &str,
    kind: PredictionKind,
    duration_minutes: Option<i32>,
) -> anyhow::Result<Option<Prediction>> {
    let prediction = match kind {
        PredictionKind::Opening => {
            sqlx::query_as::<_, Prediction>(
                r#"
                SELECT * FROM predictions
                WHERE user_id = $1 AND asset_key = $2
                  AND prediction_type = 'opening' AND outcome IS NULL
                LIMIT 1
                "#,
            )
            .bind(user_id)
            .bind(asset_key)
            .fetch_optional(pool)
            .await?
        }
        PredictionKind::Intraday => {
            sqlx::query_as::<_, Prediction>(
                r#"
                SELECT * FROM predictions
                WHERE user_id = $1 AND asset_key = $2
                  AND prediction_type = 'intraday'
                  AND duration_minutes IS NOT DISTINCT FROM $3
                  AND outcome IS NULL
                LIMIT 1
                "#,
            )
            .bind(user_id)
            .bind(asset_key)
            .bind(duration_minutes)
            .fetch_optional(pool)
            .await?
        }
    };

    Ok(prediction)
}

/// Fetch a batch of unresolved predictions for one category, oldest first.
pub async fn get_pending_by_category(
    pool: &PgPool,
    category: Category,
    limit: i64,
) -> anyhow::Result<Vec<Prediction>> {
    let predictions = sqlx::query_as::<_, Prediction>(
        r#"
        SELECT * FROM predictions
        WHERE category = $1 AND outcome IS NULL
        ORDER BY created_at ASC
        LIMIT $2
        "#,
    )
    .bind(category.as_str())
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(predictions)
}

/// Backfill the opening reference price once the session has begun.
pub async fn set_reference_price(pool: &PgPool, id: Uuid, price: Decimal) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        UPDATE predictions
        SET reference_price = $2
        WHERE id = $1 AND reference_price IS NULL
        "#,
    )
    .bind(id)
    .bind(price)
    .execute(pool)
    .await?;

    Ok(())
}

/// Atomically claim and resolve a prediction. The `outcome IS NULL` guard
/// makes evaluation at-most-once even if two runs of the same worker
/// overlap: only the first update wins, the second affects zero rows.
pub async fn claim_outcome(
    pool: &PgPool,
    id: Uuid,
    final_price: Option<Decimal>,
    outcome: Outcome,
    evaluation_time: DateTime<Utc>,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE predictions
        SET final_price = $2, outcome = $3, evaluation_time = $4
        WHERE id = $1 AND outcome IS NULL
        "#,
    )
    .bind(id)
    .bind(final_price)
    .bind(outcome.as_str())
    .bind(evaluation_time)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// All predictions owned by a user, newest first.
pub async fn get_predictions_by_user(
    pool: &PgPool,
    user_id: Uuid,
    limit: i64,
) -> anyhow::Result<Vec<Prediction>> {
    let predictions = sqlx::query_as::<_, Prediction>(
        "SELECT * FROM predictions WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(predictions)
}

/// Count unresolved predictions across all categories.
pub async fn count_pending(pool: &PgPool) -> anyhow::Result<i64> {
    let row: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM predictions WHERE outcome IS NULL")
            .fetch_one(pool)
            .await?;

    Ok(row.0)
}
