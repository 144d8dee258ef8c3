mod api;
mod cache;
mod config;
mod error;
mod indexer;
mod metrics;
mod reputation;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cache::ReputationCache;
use crate::config::AppConfig;
use crate::indexer::ScanClient;
use crate::reputation::ReputationService;

pub use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct AppState {
    pub service: ReputationService<ScanClient>,
    pub config: Arc<AppConfig>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing with pretty format
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "palisade=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false),
        )
        .init();

    println!("================================================");
    println!("           PALISADE - Starting Up               ");
    println!("================================================");

    // Load and validate configuration; bad config refuses to start.
    let config = AppConfig::load().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid config: {}", e))?;

    println!("[CONFIG] Server: {}:{}", config.server.host, config.server.port);
    println!("[CONFIG] Scan API: {}", config.scan.base_url);
    if config.scan.api_key.is_empty() {
        println!("[CONFIG] Scan API Key: *** EMPTY - PLEASE SET PALISADE__SCAN__API_KEY ***");
    } else if config.scan.api_key.len() > 8 {
        println!(
            "[CONFIG] Scan API Key: {}...{} (length: {})",
            &config.scan.api_key[..4],
            &config.scan.api_key[config.scan.api_key.len() - 4..],
            config.scan.api_key.len()
        );
    } else {
        println!("[CONFIG] Scan API Key: *** (length: {})", config.scan.api_key.len());
    }
    println!(
        "[CONFIG] Thresholds: bypass>={}, simple>={}",
        config.reputation.bypass_threshold, config.reputation.simple_threshold
    );
    println!(
        "[CONFIG] Cache: ttl={}s, max_entries={}",
        config.cache.ttl_seconds, config.cache.max_entries
    );

    tracing::info!(
        host = %config.server.host,
        port = %config.server.port,
        "Starting Palisade"
    );

    // Initialize the scan client and the shared reputation cache
    println!("[ENGINE] Initializing scan client and reputation cache...");
    let scan = ScanClient::new(&config.scan)
        .map_err(|e| anyhow::anyhow!("Failed to initialize scan client: {}", e))?;
    let cache = Arc::new(ReputationCache::new(&config.cache));
    let config = Arc::new(config);
    let service = ReputationService::new(scan, cache, config.clone());
    println!("[ENGINE] Reputation engine ready");

    // Create app state
    let state = AppState {
        service,
        config: config.clone(),
    };

    // Build router
    println!("[ROUTER] Setting up API routes...");
    let app = Router::new()
        .merge(api::create_router())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);
    println!("[ROUTER] Routes configured: /health, /api/v1/reputation/{{address}}, /api/v1/reputation/batch, /api/v1/cache");

    // Start server
    let addr: SocketAddr = config.server_addr().parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    println!("================================================");
    println!("  Server listening on http://{}", addr);
    println!("================================================");
    println!();

    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
