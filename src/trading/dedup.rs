use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::models::signal::{raw_text, WebhookPayload};

/// Fingerprint of an alert's content: symbol, side and every SL/TP field as
/// sent. Unified and legacy fields are concatenated, not merged.
pub fn dedup_key(payload: &WebhookPayload) -> String {
    let symbol = raw_text(payload.symbol.as_ref()).to_uppercase();
    let side = raw_text(payload.side.as_ref()).to_lowercase();
    let sls = [
        payload.sl.as_ref(),
        payload.sl_long.as_ref(),
        payload.sl_short.as_ref(),
    ]
    .into_iter()
    .map(raw_text)
    .collect::<String>();
    let tps = [
        payload.tp.as_ref(),
        payload.tp_long.as_ref(),
        payload.tp_short.as_ref(),
    ]
    .into_iter()
    .map(raw_text)
    .collect::<String>();
    [symbol, side, sls, tps].join("|")
}

/// Remembers the last accepted alert and drops exact repeats that arrive
/// within the window. Only one fingerprint is held at a time.
pub struct SignalDeduplicator {
    window: Duration,
    last: Mutex<Option<(String, Instant)>>,
}

impl SignalDeduplicator {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last: Mutex::new(None),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Returns true when `key` repeats the remembered alert inside the
    /// window. Otherwise `key` becomes the remembered alert. Check and
    /// replace happen under one lock.
    pub fn should_suppress(&self, key: &str, now: Instant) -> bool {
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        if let Some((prev_key, seen_at)) = last.as_ref() {
            if prev_key == key && now.saturating_duration_since(*seen_at) < self.window {
                return true;
            }
        }
        *last = Some((key.to_string(), now));
        false
    }
}
