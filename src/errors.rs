use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Machine-checkable code for the duplicate-prediction condition.
pub const CODE_ACTIVE_PREDICTION_EXISTS: &str = "ACTIVE_PREDICTION_EXISTS";
/// Machine-checkable code for submissions while the home market is closed.
pub const CODE_MARKET_CLOSED: &str = "MARKET_CLOSED";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("An unresolved prediction already exists for this asset")]
    ActivePredictionExists,

    #[error("{0}")]
    MarketClosed(String),

    #[error("Price source unavailable: {0}")]
    Upstream(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, code) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone(), None),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".into(), None),
            AppError::ActivePredictionExists => (
                StatusCode::CONFLICT,
                self.to_string(),
                Some(CODE_ACTIVE_PREDICTION_EXISTS),
            ),
            AppError::MarketClosed(msg) => {
                (StatusCode::CONFLICT, msg.clone(), Some(CODE_MARKET_CLOSED))
            }
            AppError::Upstream(msg) => {
                tracing::warn!("Upstream price failure: {msg}");
                (StatusCode::BAD_GATEWAY, msg.clone(), None)
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".into(), None)
            }
        };

        (
            status,
            Json(ErrorBody {
                success: false,
                error: message,
                code,
            }),
        )
            .into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Internal(e.into())
    }
}
