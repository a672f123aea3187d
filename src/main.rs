use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use kraken_signal_bot::config::Config;
use kraken_signal_bot::exchange::KrakenClient;
use kraken_signal_bot::server;
use kraken_signal_bot::trading::SignalExecutor;

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .init();

    info!("Starting with {:?}", cfg);

    let client = KrakenClient::new(&cfg).context("Kraken credentials")?;
    if !cfg.secret_required() {
        warn!("SHARED_SECRET is empty; webhook requests are not authenticated");
    }
    if cfg.validate_orders {
        warn!("VALIDATE_ORDERS is on; orders are validated but never placed");
    }

    let executor = Arc::new(SignalExecutor::new(&cfg, Arc::new(client)));
    let app = server::router(executor);

    let addr = format!("{}:{}", cfg.host, cfg.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("Listening on http://{}/webhook", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;

    Ok(())
}
