use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const KRAKEN_BASE_URL: &str = "https://api.kraken.com";
const DEFAULT_DEDUP_WINDOW_SECS: f64 = 8.0;

#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    // Exchange
    pub base_url: String,
    pub api_key: String,
    pub api_secret: String,
    pub request_timeout_secs: u64,
    /// Send orders with `validate=true` so Kraken checks them without placing.
    pub validate_orders: bool,

    // Sizing
    pub equity_pct: f64,
    pub min_notional_usd: f64,
    /// Balance key used for sells when the symbol's base asset is not recognised.
    pub fallback_base_asset: String,

    // Webhook
    pub dedup_window_secs: f64,
    /// Empty disables the secret check.
    pub shared_secret: String,
    pub host: String,
    pub port: u16,

    // Logging
    pub trade_log_file: String,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: KRAKEN_BASE_URL.to_string(),
            api_key: String::new(),
            api_secret: String::new(),
            request_timeout_secs: 20,
            validate_orders: false,
            equity_pct: 0.30,
            min_notional_usd: 10.0,
            fallback_base_asset: "XETH".to_string(),
            dedup_window_secs: DEFAULT_DEDUP_WINDOW_SECS,
            shared_secret: String::new(),
            host: "0.0.0.0".to_string(),
            port: 5000,
            trade_log_file: "trades.csv".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("api_key", &"***")
            .field("api_secret", &"***")
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("validate_orders", &self.validate_orders)
            .field("equity_pct", &self.equity_pct)
            .field("min_notional_usd", &self.min_notional_usd)
            .field("fallback_base_asset", &self.fallback_base_asset)
            .field("dedup_window_secs", &self.dedup_window_secs)
            .field("shared_secret", &if self.shared_secret.is_empty() { "" } else { "***" })
            .field("host", &self.host)
            .field("port", &self.port)
            .field("trade_log_file", &self.trade_log_file)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Unset or unparseable
    /// values fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Config::default();
        let env = |key: &str, default: String| -> String {
            lookup(key).unwrap_or(default)
        };

        Config {
            base_url: env("KRAKEN_BASE_URL", d.base_url),
            api_key: env("API_KEY", d.api_key).trim().to_string(),
            api_secret: env("API_SECRET", d.api_secret).trim().to_string(),
            request_timeout_secs: env("REQUEST_TIMEOUT_SEC", String::new())
                .parse()
                .unwrap_or(d.request_timeout_secs),
            validate_orders: env("VALIDATE_ORDERS", "false".to_string()).to_lowercase() == "true",
            equity_pct: env("EQUITY_PCT", String::new())
                .parse()
                .unwrap_or(d.equity_pct),
            min_notional_usd: env("MIN_NOTIONAL_USD", String::new())
                .parse()
                .unwrap_or(d.min_notional_usd),
            fallback_base_asset: env("FALLBACK_BASE_ASSET", d.fallback_base_asset).to_uppercase(),
            dedup_window_secs: env("DEDUP_WINDOW_SEC", String::new())
                .parse()
                .unwrap_or(d.dedup_window_secs),
            shared_secret: env("SHARED_SECRET", d.shared_secret),
            host: env("HOST", d.host),
            port: env("PORT", String::new()).parse().unwrap_or(d.port),
            trade_log_file: env("TRADE_LOG_FILE", d.trade_log_file),
            log_level: env("LOG_LEVEL", d.log_level),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn dedup_window(&self) -> Duration {
        // Windows too large for a Duration fall back to the default.
        Duration::try_from_secs_f64(self.dedup_window_secs.max(0.0))
            .unwrap_or(Duration::from_secs_f64(DEFAULT_DEDUP_WINDOW_SECS))
    }

    pub fn secret_required(&self) -> bool {
        !self.shared_secret.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_set() {
        let cfg = Config::from_lookup(|_| None);
        assert_eq!(cfg.base_url, KRAKEN_BASE_URL);
        assert!((cfg.equity_pct - 0.30).abs() < 1e-12);
        assert!((cfg.min_notional_usd - 10.0).abs() < 1e-12);
        assert_eq!(cfg.dedup_window(), Duration::from_secs(8));
        assert_eq!(cfg.request_timeout(), Duration::from_secs(20));
        assert_eq!(cfg.port, 5000);
        assert_eq!(cfg.trade_log_file, "trades.csv");
        assert!(!cfg.secret_required());
        assert!(!cfg.validate_orders);
    }

    #[test]
    fn reads_overrides() {
        let cfg = Config::from_lookup(lookup_from(&[
            ("EQUITY_PCT", "0.5"),
            ("MIN_NOTIONAL_USD", "25"),
            ("DEDUP_WINDOW_SEC", "2.5"),
            ("SHARED_SECRET", "hunter2"),
            ("VALIDATE_ORDERS", "TRUE"),
            ("PORT", "8080"),
            ("FALLBACK_BASE_ASSET", "xxbt"),
        ]));
        assert!((cfg.equity_pct - 0.5).abs() < 1e-12);
        assert!((cfg.min_notional_usd - 25.0).abs() < 1e-12);
        assert_eq!(cfg.dedup_window(), Duration::from_millis(2500));
        assert!(cfg.secret_required());
        assert!(cfg.validate_orders);
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.fallback_base_asset, "XXBT");
    }

    #[test]
    fn garbage_numbers_fall_back() {
        let cfg = Config::from_lookup(lookup_from(&[("EQUITY_PCT", "lots"), ("PORT", "-1")]));
        assert!((cfg.equity_pct - 0.30).abs() < 1e-12);
        assert_eq!(cfg.port, 5000);
    }

    #[test]
    fn oversized_dedup_window_falls_back() {
        let mut cfg = Config::default();
        cfg.dedup_window_secs = 1e20;
        assert_eq!(cfg.dedup_window(), Duration::from_secs(8));
        cfg.dedup_window_secs = f64::INFINITY;
        assert_eq!(cfg.dedup_window(), Duration::from_secs(8));
        cfg.dedup_window_secs = -3.0;
        assert_eq!(cfg.dedup_window(), Duration::ZERO);

        let cfg = Config::from_lookup(lookup_from(&[("DEDUP_WINDOW_SEC", "1e20")]));
        assert_eq!(cfg.dedup_window(), Duration::from_secs(8));
    }

    #[test]
    fn debug_hides_credentials() {
        let mut cfg = Config::default();
        cfg.api_key = "my-key".to_string();
        cfg.api_secret = "my-secret".to_string();
        cfg.shared_secret = "shh".to_string();
        let out = format!("{:?}", cfg);
        assert!(!out.contains("my-key"));
        assert!(!out.contains("my-secret"));
        assert!(!out.contains("shh"));
    }
}
