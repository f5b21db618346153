use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::auth::require_cron_auth;
use super::handlers;
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    // Public routes — no authentication required
    let public = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::render));

    // Prediction routes — caller identity comes from the bearer subject
    let predictions = Router::new().route(
        "/api/predictions",
        get(handlers::predictions::list).post(handlers::predictions::create),
    );

    // Validator triggers — shared-secret guarded when CRON_SECRET is set
    let validators = Router::new()
        .route("/api/validate/:category", post(handlers::validate::trigger))
        .layer(middleware::from_fn(require_cron_auth));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    public
        .merge(predictions)
        .merge(validators)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
