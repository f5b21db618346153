pub mod api;
pub mod config;
pub mod db;
pub mod errors;
pub mod market;
pub mod metrics;
pub mod models;
pub mod pricing;
pub mod validation;

use crate::config::AppConfig;
use crate::pricing::{PriceSources, ReferenceResolver};

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: AppConfig,
    pub sources: PriceSources,
    pub resolver: ReferenceResolver,
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
}
