use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::models::Category;
use crate::validation::run_category_batch;
use crate::AppState;

/// POST /api/validate/:category — run one validation batch on demand.
///
/// Used by external schedulers as an alternative to the in-process
/// interval workers; both paths share the same engine.
pub async fn trigger(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Json<Value>, AppError> {
    let category = Category::from_api_str(&category)
        .ok_or_else(|| AppError::NotFound(format!("unknown category: {category}")))?;

    let summary = run_category_batch(
        &state.db,
        &state.sources,
        category,
        state.config.validator_batch_size,
        Utc::now(),
    )
    .await?;

    if summary.details.is_empty() {
        return Ok(Json(json!({
            "message": format!("No pending {category} predictions")
        })));
    }

    Ok(Json(json!({
        "success": true,
        "processed": summary.processed,
        "details": summary.details,
    })))
}
