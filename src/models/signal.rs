use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::exchange::symbols::clean_symbol;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

impl FromStr for Side {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "buy" => Ok(Side::Buy),
            "sell" => Ok(Side::Sell),
            other => Err(SignalError::UnsupportedSide(other.to_string())),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SignalError {
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("unsupported side: {0:?}")]
    UnsupportedSide(String),
}

/// Raw webhook body. Every field is kept as untyped JSON because alert
/// templates send numbers both as JSON numbers and as strings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub secret: Option<Value>,
    #[serde(default)]
    pub symbol: Option<Value>,
    #[serde(default)]
    pub side: Option<Value>,
    #[serde(default)]
    pub sl: Option<Value>,
    #[serde(default)]
    pub tp: Option<Value>,
    #[serde(default)]
    pub sl_long: Option<Value>,
    #[serde(default)]
    pub tp_long: Option<Value>,
    #[serde(default)]
    pub sl_short: Option<Value>,
    #[serde(default)]
    pub tp_short: Option<Value>,
}

impl WebhookPayload {
    pub fn secret_matches(&self, expected: &str) -> bool {
        self.secret.as_ref().and_then(Value::as_str) == Some(expected)
    }
}

/// Best-effort numeric read: JSON numbers and numeric strings parse, anything
/// else (missing, null, text, bool) is 0.0.
pub fn parse_or_default(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Renders a raw field the way it appears in the alert text. Missing and
/// null values render as empty.
pub fn raw_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Stop-loss and take-profit as sent, before the zero-means-absent rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExitLevels {
    Unified { sl: f64, tp: f64 },
    Legacy { sl: f64, tp: f64 },
}

impl ExitLevels {
    /// `sl`/`tp` win unless both are zero, in which case the legacy fields
    /// for the signal's side are used.
    pub fn resolve(payload: &WebhookPayload, side: Side) -> Self {
        let sl = parse_or_default(payload.sl.as_ref());
        let tp = parse_or_default(payload.tp.as_ref());
        if sl != 0.0 || tp != 0.0 {
            return ExitLevels::Unified { sl, tp };
        }

        let (sl_field, tp_field) = match side {
            Side::Buy => (&payload.sl_long, &payload.tp_long),
            Side::Sell => (&payload.sl_short, &payload.tp_short),
        };
        ExitLevels::Legacy {
            sl: parse_or_default(sl_field.as_ref()),
            tp: parse_or_default(tp_field.as_ref()),
        }
    }

    pub fn values(&self) -> (f64, f64) {
        match *self {
            ExitLevels::Unified { sl, tp } | ExitLevels::Legacy { sl, tp } => (sl, tp),
        }
    }
}

/// Canonical signal, resolved once from the webhook payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub symbol: String,
    pub side: Side,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
}

impl Signal {
    pub fn from_payload(payload: &WebhookPayload) -> Result<Self, SignalError> {
        let symbol = payload
            .symbol
            .as_ref()
            .and_then(Value::as_str)
            .map(clean_symbol)
            .filter(|s| !s.is_empty())
            .ok_or(SignalError::MissingField("symbol"))?;

        let side: Side = raw_text(payload.side.as_ref()).parse()?;

        let (sl, tp) = ExitLevels::resolve(payload, side).values();

        Ok(Signal {
            symbol,
            side,
            stop_loss: Some(sl).filter(|v| *v > 0.0),
            take_profit: Some(tp).filter(|v| *v > 0.0),
        })
    }

    /// Level as written to the trade log; absent levels are 0.
    pub fn stop_loss_or_zero(&self) -> f64 {
        self.stop_loss.unwrap_or(0.0)
    }

    pub fn take_profit_or_zero(&self) -> f64 {
        self.take_profit.unwrap_or(0.0)
    }
}
