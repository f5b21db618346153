use verivo::api::router::create_router;
use verivo::config::AppConfig;
use verivo::pricing::{PriceSources, ReferenceResolver};
use verivo::validation::spawn_validators;
use verivo::{db, metrics, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    let addr = format!("{}:{}", config.host, config.port);

    tracing::info!("Connecting to database...");
    let pool = db::init_pool(&config.database_url).await?;
    tracing::info!("Database connected");

    sqlx::migrate!("./migrations").run(&pool).await?;

    let metrics_handle = metrics::init_metrics();

    let sources = PriceSources::from_config(&config)?;
    let resolver = ReferenceResolver::new(sources.clone());

    // --- Validation workers: one interval loop per asset class ---
    if config.validators_enabled {
        spawn_validators(&pool, &sources, &config);
    } else {
        tracing::info!("Validation workers disabled (VALIDATORS_ENABLED=false)");
    }

    let state = AppState {
        db: pool,
        config,
        sources,
        resolver,
        metrics_handle,
    };
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {addr}");
    axum::serve(listener, router).await?;

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();
}
