use anyhow::{Context, Result};
use tracing_subscriber::{fmt, EnvFilter};

use kraken_signal_bot::config::Config;
use kraken_signal_bot::exchange::{Exchange, KrakenClient};

/// Checks credentials and connectivity without placing anything.
#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .init();

    let kraken = KrakenClient::new(&cfg).context("Kraken credentials")?;

    println!("Kraken smoke test against {}", cfg.base_url);
    println!();

    for asset in ["XETH", "USDT", "ZUSD"] {
        let balance = kraken
            .get_balance(asset)
            .await
            .with_context(|| format!("balance {}", asset))?;
        println!("  {:<6} balance: {}", asset, balance);
    }

    println!();

    for symbol in ["ETHUSD", "BTCUSD"] {
        let price = kraken
            .get_ticker_price(symbol)
            .await
            .with_context(|| format!("ticker {}", symbol))?;
        println!("  {:<6} last:    ${:.2}", symbol, price);
    }

    Ok(())
}
