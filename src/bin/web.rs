use anyhow::{Context, Result};
use odds_dashboard::web::{router, AppState};
use odds_dashboard::Config;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    let config = Config::from_env();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if config.odds_api_key.is_none() {
        warn!("ODDS_API_KEY is not set, odds routes will fail until it is configured");
    }

    let bind_addr = config.bind_addr.clone();
    let app = router(Arc::new(AppState::new(config)));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;

    info!(addr = %bind_addr, "starting web server");
    println!("\nStarting web server at http://{}", bind_addr);
    println!("Press Ctrl+C to stop\n");

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
