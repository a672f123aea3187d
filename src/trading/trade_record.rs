use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::models::Side;

pub const TRADE_LOG_HEADER: &str = "ts,symbol,side,qty,entry_price,sl,tp,notional,userref";

/// One accepted order, as appended to the trade log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeLogRecord {
    pub ts: String,
    pub symbol: String,
    pub side: Side,
    pub qty: f64,
    pub entry_price: f64,
    pub sl: f64,
    pub tp: f64,
    pub notional: f64,
    pub userref: i64,
}

impl TradeLogRecord {
    pub fn to_csv_row(&self) -> String {
        [
            csv_field(&self.ts),
            csv_field(&self.symbol),
            self.side.to_string(),
            self.qty.to_string(),
            self.entry_price.to_string(),
            self.sl.to_string(),
            self.tp.to_string(),
            self.notional.to_string(),
            self.userref.to_string(),
        ]
        .join(",")
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Append-only CSV of accepted orders. Rows are never rewritten.
pub struct TradeLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl TradeLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one row with a single write. The header goes into the same
    /// write when the file is new or empty.
    pub fn append(&self, record: &TradeLogRecord) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open trade log {}", self.path.display()))?;

        let is_empty = file.metadata().map(|m| m.len() == 0).unwrap_or(true);
        let mut chunk = String::new();
        if is_empty {
            chunk.push_str(TRADE_LOG_HEADER);
            chunk.push('\n');
        }
        chunk.push_str(&record.to_csv_row());
        chunk.push('\n');

        file.write_all(chunk.as_bytes())
            .with_context(|| format!("Failed to write trade log {}", self.path.display()))?;
        Ok(())
    }
}
