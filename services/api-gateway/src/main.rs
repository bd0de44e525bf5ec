use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, Method},
    routing::get,
    serve, Router,
};
use meridian_database::{initialize_database, PgBomStore, PostgresPool};
use meridian_utils::{bom::BomStore, init_logging, AppConfig, BomService};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};

mod handlers;
mod metrics;
mod middleware;
mod routes;

use handlers::{health_check, ACTOR_HEADER};
use middleware::*;

pub type SharedBomService = Arc<BomService<Arc<dyn BomStore>>>;

#[derive(Clone)]
pub struct AppState {
    pub postgres_pool: PostgresPool,
    pub bom: SharedBomService,
    pub config: AppConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration ({}), using defaults", e);
        AppConfig::default()
    });

    init_logging(&config.logging)?;
    info!("Starting Meridian API Gateway");

    let postgres_pool = initialize_database(&config.database).await?;
    info!("Database connection established");

    let store: Arc<dyn BomStore> = Arc::new(PgBomStore::new(postgres_pool.clone()));
    let bom = Arc::new(BomService::new(store, config.bom.clone()));

    // A cyclic graph on disk means someone wrote edges around the service
    match bom.verify_integrity().await {
        Ok(edges) => info!(edges, "BOM graph verified acyclic"),
        Err(e) => warn!(error = %e, "BOM graph failed integrity check"),
    }

    let app = create_app(AppState {
        postgres_pool,
        bom,
        config: config.clone(),
    });

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = TcpListener::bind(&addr).await?;
    info!("API Gateway listening on {}", addr);

    serve(listener, app).await?;

    Ok(())
}

fn create_app(state: AppState) -> Router {
    let config = state.config.clone();

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .nest("/api/v1", routes::create_api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(ACTOR_HEADER)]),
                )
                .layer(TimeoutLayer::new(Duration::from_secs(config.server.timeout_seconds)))
                .layer(DefaultBodyLimit::max(config.server.max_request_size))
                .layer(axum::middleware::from_fn(request_id_middleware))
                .layer(axum::middleware::from_fn(error_handling_middleware)),
        )
        .with_state(state)
}

async fn metrics_handler() -> String {
    use prometheus::TextEncoder;

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_else(|_| "Error encoding metrics".to_string())
}
