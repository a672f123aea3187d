use anyhow::{bail, Context, Result};
use chrono::{Local, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::exchange::symbols::{base_asset_key, quote_asset_key};
use crate::exchange::Exchange;
use crate::models::{ConditionalClose, OrderRequest, Side, Signal, WebhookPayload};
use crate::trading::dedup::{dedup_key, SignalDeduplicator};
use crate::trading::sizing::size_position;
use crate::trading::trade_record::{TradeLog, TradeLogRecord};

/// How one webhook ended. Only `Placed` sent an order.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    Placed {
        exchange_result: Value,
        log: TradeLogRecord,
    },
    Duplicate,
    Skipped {
        reason: String,
    },
    Unauthorized,
    Failed {
        error: String,
    },
}

impl ExecutionOutcome {
    pub fn is_placed(&self) -> bool {
        matches!(self, ExecutionOutcome::Placed { .. })
    }

    pub fn body(&self) -> Value {
        match self {
            ExecutionOutcome::Placed {
                exchange_result,
                log,
            } => json!({"ok": true, "exchange_result": exchange_result, "log": log}),
            ExecutionOutcome::Duplicate => json!({"ok": false, "err": "duplicate"}),
            ExecutionOutcome::Skipped { reason } => json!({"ok": false, "err": reason}),
            ExecutionOutcome::Unauthorized => json!({"ok": false, "err": "bad secret"}),
            ExecutionOutcome::Failed { error } => json!({"ok": false, "err": error}),
        }
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn redacted(body: &Value) -> Value {
    let mut v = body.clone();
    if let Some(obj) = v.as_object_mut() {
        if obj.contains_key("secret") {
            obj.insert("secret".to_string(), json!("***"));
        }
    }
    v
}

/// Turns webhook alerts into sized Kraken market orders.
pub struct SignalExecutor {
    exchange: Arc<dyn Exchange>,
    dedup: SignalDeduplicator,
    trade_log: Arc<TradeLog>,
    shared_secret: String,
    equity_pct: f64,
    min_notional_usd: f64,
    fallback_base_asset: String,
    validate_orders: bool,
}

impl SignalExecutor {
    pub fn new(cfg: &Config, exchange: Arc<dyn Exchange>) -> Self {
        Self {
            exchange,
            dedup: SignalDeduplicator::new(cfg.dedup_window()),
            trade_log: Arc::new(TradeLog::new(&cfg.trade_log_file)),
            shared_secret: cfg.shared_secret.clone(),
            equity_pct: cfg.equity_pct,
            min_notional_usd: cfg.min_notional_usd,
            fallback_base_asset: cfg.fallback_base_asset.clone(),
            validate_orders: cfg.validate_orders,
        }
    }

    pub fn trade_log(&self) -> &TradeLog {
        &self.trade_log
    }

    /// Runs one alert to completion. Errors never escape; they become
    /// `Failed`.
    pub async fn execute(&self, body: &Value) -> ExecutionOutcome {
        match self.process(body).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Signal failed: {:#}", e);
                ExecutionOutcome::Failed {
                    error: format!("{:#}", e),
                }
            }
        }
    }

    async fn process(&self, body: &Value) -> Result<ExecutionOutcome> {
        info!("Incoming signal: {}", redacted(body));

        // Derived Deserialize would also fill the payload from an array by position.
        if !body.is_object() {
            bail!("Malformed webhook payload: expected a JSON object");
        }
        let payload: WebhookPayload =
            serde_json::from_value(body.clone()).context("Malformed webhook payload")?;

        if !self.shared_secret.is_empty() && !payload.secret_matches(&self.shared_secret) {
            warn!("Rejected signal: bad secret");
            return Ok(ExecutionOutcome::Unauthorized);
        }

        let signal = Signal::from_payload(&payload)?;

        let key = dedup_key(&payload);
        if self.dedup.should_suppress(&key, Instant::now()) {
            warn!(
                "Dedup: same signal inside {:?} window, skipping ({})",
                self.dedup.window(),
                key
            );
            return Ok(ExecutionOutcome::Duplicate);
        }

        let entry_price = self
            .exchange
            .get_ticker_price(&signal.symbol)
            .await
            .with_context(|| format!("Ticker lookup for {} failed", signal.symbol))?;
        let pair = self
            .exchange
            .get_pair_info(&signal.symbol)
            .await
            .with_context(|| format!("Pair lookup for {} failed", signal.symbol))?;

        let balance_key = match signal.side {
            Side::Buy => quote_asset_key(&signal.symbol).to_string(),
            Side::Sell => base_asset_key(&signal.symbol, &self.fallback_base_asset),
        };
        let balance = self
            .exchange
            .get_balance(&balance_key)
            .await
            .with_context(|| format!("Balance lookup for {} failed", balance_key))?;

        let size = size_position(signal.side, &pair, entry_price, balance, self.equity_pct);

        info!(
            "Parsed {} {} sl={} tp={} price={} {}={} qty={} notional=${:.2}",
            signal.side,
            signal.symbol,
            signal.stop_loss_or_zero(),
            signal.take_profit_or_zero(),
            entry_price,
            balance_key,
            balance,
            size.quantity,
            size.notional
        );

        if !size.is_tradeable(self.min_notional_usd) {
            let reason = format!(
                "skip: qty={} notional=${:.2} < ${:.2}",
                size.quantity, size.notional, self.min_notional_usd
            );
            warn!("{}", reason);
            return Ok(ExecutionOutcome::Skipped { reason });
        }

        let now = Utc::now();
        let userref = now.timestamp();
        let order = OrderRequest::market(&pair, signal.side, size.quantity)
            .with_close(ConditionalClose::from_levels(
                signal.stop_loss,
                signal.take_profit,
            ))
            .with_userref(userref)
            .validate_only(self.validate_orders);

        let exchange_result = self
            .exchange
            .add_order(&order)
            .await
            .with_context(|| format!("Order {} {} {} rejected", order.side, order.volume, order.pair))?;

        info!("Order accepted: {}", exchange_result);

        let log = TradeLogRecord {
            ts: now.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
            symbol: signal.symbol.clone(),
            side: signal.side,
            qty: size.quantity,
            entry_price,
            sl: signal.stop_loss_or_zero(),
            tp: signal.take_profit_or_zero(),
            notional: round2(size.notional),
            userref,
        };

        // The order is already live; a log failure is reported, not returned.
        let trade_log = Arc::clone(&self.trade_log);
        let record = log.clone();
        let written = tokio::task::spawn_blocking(move || trade_log.append(&record))
            .await
            .context("Trade log task aborted")
            .and_then(|r| r);
        if let Err(e) = written {
            error!("Trade log write failed for userref {}: {:#}", userref, e);
        }

        Ok(ExecutionOutcome::Placed {
            exchange_result,
            log,
        })
    }
}
