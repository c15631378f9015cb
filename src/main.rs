//! Momentum Funnel - a session-managed HTTP server for a sign-up funnel
//!
//! This is the main entry point for the momentum-funnel application.

use std::sync::Arc;

use tokio::{net::TcpListener, sync::watch};
use tracing::info;

use momentum_funnel::{
    api::create_router,
    clock::SystemClock,
    config::Config,
    state::AppState,
    storage::{FileStore, KeyValueStore, MemoryStore},
    tasks::discount_ticker_task,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("momentum_funnel={},tower_http=info", config.log_level()))
        .init();

    info!("Starting momentum-funnel server v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, discount={}min, tick={}ms",
        config.host, config.port, config.discount_minutes, config.tick_interval_ms
    );

    let store: Arc<dyn KeyValueStore> = if config.ephemeral {
        info!("Using in-memory session store");
        Arc::new(MemoryStore::new())
    } else {
        info!("Using session store at {}", config.data_file.display());
        Arc::new(FileStore::new(&config.data_file))
    };

    // Create application state and pick up where the last run left off
    let state = Arc::new(AppState::new(
        config.port,
        config.host.clone(),
        config.discount_duration_ms(),
        Arc::new(SystemClock),
        store,
    ));
    state.restore_from_storage()?;

    // Start the discount ticker background task
    let (ticker_shutdown_tx, ticker_shutdown_rx) = watch::channel(false);
    let ticker = tokio::spawn(discount_ticker_task(
        Arc::clone(&state),
        config.tick_interval(),
        ticker_shutdown_rx,
    ));

    // Create HTTP router with all endpoints
    let app = create_router(state);

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /user/email   - Save email");
    info!("  POST /user/name    - Save name and generate promo code");
    info!("  POST /timer/start  - Start discount window");
    info!("  GET  /timer        - Current countdown");
    info!("  GET  /pricing      - Current pricing");
    info!("  POST /checkout     - Complete purchase");
    info!("  GET  /checkout     - Purchase details");
    info!("  POST /debug/reset  - Clear session");
    info!("  GET  /status       - Session overview");
    info!("  GET  /health       - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    let _ = ticker_shutdown_tx.send(true);
    if let Err(e) = ticker.await {
        tracing::warn!("Discount ticker ended abnormally: {}", e);
    }

    info!("Server shutdown complete");
    Ok(())
}
