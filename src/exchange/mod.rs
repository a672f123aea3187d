pub mod error;
pub mod kraken;
pub mod symbols;

pub use error::ExchangeError;
pub use kraken::{Credentials, KrakenClient};

use async_trait::async_trait;
use serde_json::Value;

use crate::models::{OrderRequest, PairInfo};

/// The exchange calls a signal needs. Symbols are user-facing; the
/// implementation normalizes them.
#[async_trait]
pub trait Exchange: Send + Sync {
    async fn get_pair_info(&self, symbol: &str) -> Result<PairInfo, ExchangeError>;
    async fn get_ticker_price(&self, symbol: &str) -> Result<f64, ExchangeError>;
    async fn get_balance(&self, asset_key: &str) -> Result<f64, ExchangeError>;
    /// Submits the order and returns Kraken's raw `result`.
    async fn add_order(&self, order: &OrderRequest) -> Result<Value, ExchangeError>;
}
