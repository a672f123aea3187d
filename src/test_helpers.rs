use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::config::Config;
use crate::exchange::{Exchange, ExchangeError};
use crate::models::{OrderRequest, PairInfo};

/// In-memory exchange with a fixed price and balances. Records every order.
pub struct MockExchange {
    pair: PairInfo,
    price: f64,
    balances: HashMap<String, f64>,
    ticker_error: Option<String>,
    order_error: Option<String>,
    orders: Mutex<Vec<OrderRequest>>,
    calls: AtomicUsize,
}

impl MockExchange {
    pub fn eth_usd(price: f64) -> Self {
        Self {
            pair: PairInfo {
                pair_code: "XETHZUSD".to_string(),
                lot_decimals: 8,
                pair_decimals: 2,
                ordermin: 0.002,
            },
            price,
            balances: HashMap::new(),
            ticker_error: None,
            order_error: None,
            orders: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_balance(mut self, asset_key: &str, amount: f64) -> Self {
        self.balances.insert(asset_key.to_string(), amount);
        self
    }

    pub fn rejecting_orders(mut self, error: &str) -> Self {
        self.order_error = Some(error.to_string());
        self
    }

    pub fn failing_ticker(mut self, error: &str) -> Self {
        self.ticker_error = Some(error.to_string());
        self
    }

    pub fn submitted(&self) -> Vec<OrderRequest> {
        self.orders.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Exchange for MockExchange {
    async fn get_pair_info(&self, _symbol: &str) -> Result<PairInfo, ExchangeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.pair.clone())
    }

    async fn get_ticker_price(&self, _symbol: &str) -> Result<f64, ExchangeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.ticker_error {
            Some(e) => Err(ExchangeError::Api(vec![e.clone()])),
            None => Ok(self.price),
        }
    }

    async fn get_balance(&self, asset_key: &str) -> Result<f64, ExchangeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.balances.get(asset_key).copied().unwrap_or(0.0))
    }

    async fn add_order(&self, order: &OrderRequest) -> Result<Value, ExchangeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = &self.order_error {
            return Err(ExchangeError::Api(vec![e.clone()]));
        }
        self.orders.lock().unwrap().push(order.clone());
        Ok(json!({
            "descr": {
                "order": format!("{} {} {} @ market", order.side, order.volume, order.pair)
            },
            "txid": ["OUF4EM-FRGI2-MQMWZD"]
        }))
    }
}

/// Default config with secret `X` and a fresh trade log under the temp dir.
pub fn test_config(name: &str) -> Config {
    let path = std::env::temp_dir()
        .join(format!("kraken_signal_bot_{}_{}", name, std::process::id()))
        .join("trades.csv");
    let _ = std::fs::remove_file(&path);

    let mut cfg = Config::default();
    cfg.shared_secret = "X".to_string();
    cfg.trade_log_file = path.to_string_lossy().to_string();
    cfg
}
