//! Ledgerview API Server
//!
//! Main entry point: connects to the ledger database, starts the ledger
//! reader feeding the balance and history caches, and serves the HTTP API.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ledgerview_api::{AppState, create_router};
use ledgerview_core::cache::CacheConfig;
use ledgerview_core::ledger::LedgerStore;
use ledgerview_core::reader::LedgerReader;
use ledgerview_core::views::{BalanceView, HistoryView};
use ledgerview_db::{LedgerRepository, connect};
use ledgerview_shared::AppConfig;
use ledgerview_shared::types::RoutingNumber;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ledgerview=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;
    let local_route = RoutingNumber::parse(&config.ledger.local_routing_num)
        .context("Invalid ledger.local_routing_num")?;

    // Connect to database
    let db = connect(&config.database).await?;
    info!("Connected to database");
    let store: Arc<dyn LedgerStore> = Arc::new(LedgerRepository::new(db));

    // Create the cached views
    let load_timeout = config.ledger.load_timeout();
    let mut balance_cache =
        CacheConfig::new(config.balance_cache.max_size).with_load_timeout(load_timeout);
    if let Some(expiry) = config.balance_cache.expiry() {
        balance_cache = balance_cache.with_expiry(expiry);
    }
    let history_cache = CacheConfig::new(config.history_cache.max_size)
        .with_expiry(config.history_cache.expiry())
        .with_load_timeout(load_timeout);

    let balances = BalanceView::new(Arc::clone(&store), local_route.clone(), balance_cache);
    let history = HistoryView::new(
        Arc::clone(&store),
        local_route.clone(),
        config.history_cache.history_limit,
        history_cache,
    );
    info!(
        %local_route,
        balance_cache_size = config.balance_cache.max_size,
        history_cache_size = config.history_cache.max_size,
        history_limit = config.history_cache.history_limit,
        "Ledger views configured"
    );

    // Start the ledger reader
    let reader = LedgerReader::new(store, config.ledger.poll_interval())
        .with_observer(Arc::new(balances.clone()))
        .with_observer(Arc::new(history.clone()))
        .start();

    // Create application state
    let state = AppState {
        balances: Arc::new(balances),
        history: Arc::new(history),
        reader_health: reader.health(),
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    let shutdown = reader.cancel_token().clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => info!("Shutdown signal received"),
                () = shutdown.cancelled() => {}
            }
        })
        .await?;

    reader.shutdown().await;
    info!("Server stopped");

    Ok(())
}
