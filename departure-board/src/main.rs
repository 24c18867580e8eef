use departure_board::board::{Board, SettingsStore};
use departure_board::cache::{CacheConfig, CachedEfaClient};
use departure_board::config::AppConfig;
use departure_board::efa::{EfaClient, MockEfaClient, TransitSource};
use departure_board::web::{AppState, create_router};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env().expect("Invalid configuration");

    // Load persisted board settings (defaults if the file is missing)
    let settings =
        SettingsStore::open(&config.settings_path).expect("Failed to open settings file");

    let cache_config = CacheConfig::default().with_ttl(config.search_cache_ttl());

    match &config.mock_dir {
        Some(dir) => {
            let mock = MockEfaClient::from_dir(dir).expect("Failed to load mock EFA data");
            tracing::warn!(dir = %dir.display(), "serving mock EFA data");
            serve(&config, CachedEfaClient::new(mock, &cache_config), settings).await;
        }
        None => {
            let client =
                EfaClient::new(config.efa_config()).expect("Failed to create EFA client");
            tracing::info!(base_url = %config.efa_base_url, "using live EFA API");
            serve(&config, CachedEfaClient::new(client, &cache_config), settings).await;
        }
    }
}

async fn serve<S: TransitSource>(config: &AppConfig, source: S, settings: SettingsStore) {
    let board = Board::new(source, settings);

    // Poll until the first browser reports the page hidden
    board.set_active(true).await;

    let app = create_router(AppState::new(board));

    let addr = config.bind_addr;
    tracing::info!("Departure board listening on http://{addr}");
    tracing::info!("API Endpoints:");
    tracing::info!("  GET  /health                 - Health check");
    tracing::info!("  GET  /api/board              - Board state");
    tracing::info!("  POST /api/lifecycle          - Start/stop polling");
    tracing::info!("  GET  /api/stops/search?q=    - Search stops");
    tracing::info!("  GET  /api/settings           - Board settings");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listen address");
    axum::serve(listener, app).await.expect("Server error");
}
