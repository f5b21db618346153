use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Duration, Utc};
use metrics::counter;
use serde::{Deserialize, Serialize};

use crate::api::auth::AuthUser;
use crate::db::prediction_repo;
use crate::errors::AppError;
use crate::market::{derive_asset_key, market_status};
use crate::models::{
    Category, Direction, MarketType, NewPrediction, Prediction, PredictionKind,
};
use crate::pricing::ResolveError;
use crate::AppState;

#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct CreatePredictionRequest {
    #[serde(default)]
    pub title: Option<String>,
    pub category: String,
    #[serde(default)]
    pub region: Option<String>,
    pub direction: String,
    #[serde(rename = "marketType")]
    pub market_type: String,
    #[serde(default, rename = "globalAsset")]
    pub global_asset: Option<String>,
    #[serde(default, rename = "globalIdentifier")]
    pub global_identifier: Option<String>,
    #[serde(default)]
    pub timeframe: Option<String>,
    #[serde(default)]
    pub duration_minutes: Option<i32>,
    #[serde(default)]
    pub target_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub prediction_type: Option<String>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/predictions — submit a new time-locked prediction.
///
/// Exactly one insert on success, zero writes on any failure.
pub async fn create(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    Json(body): Json<CreatePredictionRequest>,
) -> Result<Json<ApiResponse<Prediction>>, AppError> {
    let now = Utc::now();

    let category = Category::from_api_str(&body.category)
        .ok_or_else(|| AppError::BadRequest(format!("unknown category: {}", body.category)))?;
    let market_type = MarketType::from_api_str(&body.market_type)
        .ok_or_else(|| AppError::BadRequest(format!("unknown market type: {}", body.market_type)))?;
    let direction = Direction::from_api_str(&body.direction)
        .ok_or_else(|| AppError::BadRequest(format!("unknown direction: {}", body.direction)))?;
    let kind = body
        .prediction_type
        .as_deref()
        .map(PredictionKind::from_api_str)
        .unwrap_or(PredictionKind::Intraday);

    let identifier = body
        .global_identifier
        .as_deref()
        .or(body.global_asset.as_deref())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("asset identifier is required".into()))?;

    let duration_minutes = compute_duration(
        kind,
        body.duration_minutes,
        body.timeframe.as_deref(),
        body.target_date,
        now,
    )?;

    // Intraday exchange-traded submissions only make sense in session.
    if kind == PredictionKind::Intraday
        && matches!(market_type, MarketType::Stock | MarketType::Index)
    {
        let status = market_status(identifier, now);
        if !status.is_open {
            return Err(AppError::MarketClosed(
                status
                    .message
                    .unwrap_or_else(|| "Market is currently closed".into()),
            ));
        }
    }

    let asset_key = derive_asset_key(market_type, category, body.region.as_deref(), identifier);

    let existing = prediction_repo::find_active_duplicate(
        &state.db,
        user_id,
        &asset_key,
        kind,
        duration_minutes,
    )
    .await?;
    if existing.is_some() {
        return Err(AppError::ActivePredictionExists);
    }

    let quote = state
        .resolver
        .resolve(market_type, category, identifier, kind, now)
        .await
        .map_err(|e| match e {
            ResolveError::Cutoff(cutoff) => AppError::BadRequest(cutoff.to_string()),
            ResolveError::PriceUnavailable(_) => AppError::Upstream(e.to_string()),
        })?;

    // Anchor the lock window on the reference instant, not the request
    // arrival, so fetch latency never skews it.
    let target_date = match duration_minutes {
        Some(minutes) => Some(quote.time + Duration::minutes(minutes as i64)),
        None => Some(quote.time),
    };

    let title = body
        .title
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| compose_title(category, identifier, direction, kind, duration_minutes));

    let new = NewPrediction {
        user_id,
        category: category.as_str().into(),
        market_type: market_type.as_str().into(),
        asset_symbol: Some(identifier.to_string()),
        asset_key,
        title,
        direction,
        kind,
        duration_minutes,
        target_date,
        reference_time: Some(quote.time),
        reference_price: quote.price,
        data_source: Some(quote.source),
    };

    let prediction = prediction_repo::insert_prediction(&state.db, &new).await?;

    counter!("predictions_created").increment(1);
    tracing::info!(
        id = %prediction.id,
        user_id = %user_id,
        asset_key = %prediction.asset_key,
        kind = %kind,
        "Prediction created"
    );

    Ok(Json(ApiResponse {
        success: true,
        data: Some(prediction),
        error: None,
    }))
}

/// GET /api/predictions — the caller's predictions, newest first.
pub async fn list(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Prediction>>>, AppError> {
    let predictions = prediction_repo::get_predictions_by_user(&state.db, user_id, 100).await?;

    Ok(Json(ApiResponse {
        success: true,
        data: Some(predictions),
        error: None,
    }))
}

// ---------------------------------------------------------------------------
// Duration derivation
// ---------------------------------------------------------------------------

/// Lock-window length in minutes. Explicit values win over the coarse
/// timeframe label, which wins over an explicit target date (clamped to at
/// least one minute). Opening mode has no countdown; its window is fixed by
/// the session-open reference instant.
fn compute_duration(
    kind: PredictionKind,
    explicit_minutes: Option<i32>,
    timeframe: Option<&str>,
    target_date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<Option<i32>, AppError> {
    if kind == PredictionKind::Opening {
        return Ok(None);
    }

    if let Some(minutes) = explicit_minutes {
        if minutes <= 0 {
            return Err(AppError::BadRequest(
                "duration_minutes must be positive".into(),
            ));
        }
        return Ok(Some(minutes));
    }

    if let Some(minutes) = timeframe.and_then(timeframe_minutes) {
        return Ok(Some(minutes));
    }

    if let Some(target) = target_date {
        let minutes = (target - now).num_minutes().max(1);
        return Ok(Some(minutes as i32));
    }

    Err(AppError::BadRequest(
        "could not determine prediction duration".into(),
    ))
}

fn timeframe_minutes(label: &str) -> Option<i32> {
    match label.trim().to_lowercase().as_str() {
        "5m" => Some(5),
        "10m" => Some(10),
        "30m" => Some(30),
        "1h" => Some(60),
        "3h" => Some(180),
        _ => None,
    }
}

fn compose_title(
    category: Category,
    identifier: &str,
    direction: Direction,
    kind: PredictionKind,
    duration_minutes: Option<i32>,
) -> String {
    let window = match kind {
        PredictionKind::Opening => "opening".to_string(),
        PredictionKind::Intraday => duration_minutes
            .map(|m| format!("{m}m"))
            .unwrap_or_else(|| "intraday".into()),
    };

    format!(
        "{category}: {} - {direction} ({window})",
        identifier.to_uppercase()
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 16, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_explicit_duration_wins() {
        let d = compute_duration(
            PredictionKind::Intraday,
            Some(45),
            Some("5m"),
            None,
            now(),
        )
        .unwrap();
        assert_eq!(d, Some(45));
    }

    #[test]
    fn test_timeframe_labels() {
        for (label, minutes) in [("5m", 5), ("10m", 10), ("30m", 30), ("1h", 60), ("3h", 180)] {
            let d = compute_duration(PredictionKind::Intraday, None, Some(label), None, now())
                .unwrap();
            assert_eq!(d, Some(minutes), "label {label}");
        }
    }

    #[test]
    fn test_target_date_clamped_to_one_minute() {
        let target = now() + Duration::seconds(10);
        let d = compute_duration(PredictionKind::Intraday, None, None, Some(target), now())
            .unwrap();
        assert_eq!(d, Some(1));
    }

    #[test]
    fn test_target_date_derivation() {
        let target = now() + Duration::minutes(90);
        let d = compute_duration(PredictionKind::Intraday, None, None, Some(target), now())
            .unwrap();
        assert_eq!(d, Some(90));
    }

    #[test]
    fn test_opening_has_no_duration() {
        let d = compute_duration(PredictionKind::Opening, Some(30), Some("5m"), None, now())
            .unwrap();
        assert_eq!(d, None);
    }

    #[test]
    fn test_underivable_duration_is_rejected() {
        assert!(compute_duration(PredictionKind::Intraday, None, None, None, now()).is_err());
    }

    #[test]
    fn test_nonpositive_duration_is_rejected() {
        assert!(
            compute_duration(PredictionKind::Intraday, Some(0), None, None, now()).is_err()
        );
    }

    #[test]
    fn test_composed_title() {
        let title = compose_title(
            Category::Crypto,
            "btc",
            Direction::Up,
            PredictionKind::Intraday,
            Some(5),
        );
        assert_eq!(title, "Crypto: BTC - Up (5m)");
    }
}
