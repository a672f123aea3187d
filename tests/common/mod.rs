use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use kraken_signal_bot::config::Config;
use kraken_signal_bot::exchange::{Exchange, ExchangeError};
use kraken_signal_bot::models::{OrderRequest, PairInfo};

/// Kraken stand-in quoting a single pair at a fixed price.
pub struct MockKraken {
    pub pair: PairInfo,
    pub price: f64,
    pub balances: HashMap<String, f64>,
    pub order_error: Option<String>,
    pub orders: Mutex<Vec<OrderRequest>>,
}

impl MockKraken {
    pub fn new(pair: PairInfo, price: f64) -> Self {
        Self {
            pair,
            price,
            balances: HashMap::new(),
            order_error: None,
            orders: Mutex::new(Vec::new()),
        }
    }

    pub fn balance(mut self, asset_key: &str, amount: f64) -> Self {
        self.balances.insert(asset_key.to_string(), amount);
        self
    }

    pub fn reject(mut self, error: &str) -> Self {
        self.order_error = Some(error.to_string());
        self
    }

    pub fn orders(&self) -> Vec<OrderRequest> {
        self.orders.lock().unwrap().clone()
    }
}

#[async_trait]
impl Exchange for MockKraken {
    async fn get_pair_info(&self, _symbol: &str) -> Result<PairInfo, ExchangeError> {
        Ok(self.pair.clone())
    }

    async fn get_ticker_price(&self, _symbol: &str) -> Result<f64, ExchangeError> {
        Ok(self.price)
    }

    async fn get_balance(&self, asset_key: &str) -> Result<f64, ExchangeError> {
        Ok(self.balances.get(asset_key).copied().unwrap_or(0.0))
    }

    async fn add_order(&self, order: &OrderRequest) -> Result<Value, ExchangeError> {
        if let Some(e) = &self.order_error {
            return Err(ExchangeError::Api(vec![e.clone()]));
        }
        self.orders.lock().unwrap().push(order.clone());
        Ok(json!({
            "descr": {"order": format!("{} {} {} @ market", order.side, order.volume, order.pair)},
            "txid": ["OQCLML-BW3P3-BUCMWZ"]
        }))
    }
}

pub fn eth_usd_pair() -> PairInfo {
    PairInfo {
        pair_code: "XETHZUSD".to_string(),
        lot_decimals: 8,
        pair_decimals: 2,
        ordermin: 0.002,
    }
}

/// Config with secret `X` and a trade log path unique to `name`.
pub fn config(name: &str) -> (Config, PathBuf) {
    let path = std::env::temp_dir()
        .join(format!("kraken_signal_bot_it_{}_{}", name, std::process::id()))
        .join("trades.csv");
    let _ = std::fs::remove_file(&path);

    let mut cfg = Config::default();
    cfg.shared_secret = "X".to_string();
    cfg.trade_log_file = path.to_string_lossy().to_string();
    (cfg, path)
}
