use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use hmac::{Hmac, Mac};
use reqwest::{header::CONTENT_TYPE, Client, Response};
use serde::Deserialize;
use serde_json::Value;
use sha2::{Digest, Sha256, Sha512};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

use crate::config::Config;
use crate::exchange::symbols::normalize_pair;
use crate::exchange::{Exchange, ExchangeError};
use crate::models::signal::parse_or_default;
use crate::models::{OrderRequest, PairInfo};

type HmacSha512 = Hmac<Sha512>;

/// API key plus the HMAC key decoded from Kraken's base64 secret.
#[derive(Clone)]
pub struct Credentials {
    api_key: String,
    secret: Vec<u8>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"***")
            .field("secret", &"***")
            .finish()
    }
}

impl Credentials {
    pub fn new(api_key: &str, api_secret: &str) -> Result<Self, ExchangeError> {
        if api_key.is_empty() || api_secret.is_empty() {
            return Err(ExchangeError::Auth(
                "missing API_KEY or API_SECRET".to_string(),
            ));
        }
        let secret = STANDARD.decode(api_secret).map_err(|e| {
            ExchangeError::Auth(format!("API_SECRET must be base64 as issued by Kraken: {}", e))
        })?;
        if secret.is_empty() {
            return Err(ExchangeError::Auth("API_SECRET decodes to nothing".to_string()));
        }
        Ok(Self {
            api_key: api_key.to_string(),
            secret,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self, ExchangeError> {
        Self::new(&cfg.api_key, &cfg.api_secret)
    }
}

/// `API-Sign` value: HMAC-SHA512 keyed with the decoded secret over
/// `path || SHA256(nonce || postdata)`, base64 encoded.
pub fn sign(path: &str, nonce: u64, postdata: &str, secret: &[u8]) -> Result<String, ExchangeError> {
    let mut sha = Sha256::new();
    sha.update(nonce.to_string().as_bytes());
    sha.update(postdata.as_bytes());
    let inner = sha.finalize();

    let mut mac = HmacSha512::new_from_slice(secret)
        .map_err(|e| ExchangeError::Auth(e.to_string()))?;
    mac.update(path.as_bytes());
    mac.update(&inner);
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

#[derive(Debug, Deserialize)]
struct KrakenResponse {
    #[serde(default)]
    error: Vec<String>,
    #[serde(default)]
    result: Option<Value>,
}

impl KrakenResponse {
    fn into_result(self) -> Result<Value, ExchangeError> {
        if !self.error.is_empty() {
            return Err(ExchangeError::Api(self.error));
        }
        self.result
            .ok_or_else(|| ExchangeError::Parse("response has no result".to_string()))
    }
}

async fn read_result(resp: Response) -> Result<Value, ExchangeError> {
    let status = resp.status();
    let body = resp.text().await?;
    let parsed: KrakenResponse = serde_json::from_str(&body).map_err(|e| {
        let snippet: String = body.chars().take(200).collect();
        ExchangeError::Parse(format!("HTTP {}: {} ({})", status, e, snippet))
    })?;
    parsed.into_result()
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn first_entry(result: &Value) -> Result<(&String, &Value), ExchangeError> {
    result
        .as_object()
        .and_then(|m| m.iter().next())
        .ok_or_else(|| ExchangeError::Parse(format!("expected a keyed result, got {}", result)))
}

fn parse_pair_info(result: &Value) -> Result<PairInfo, ExchangeError> {
    let (code, info) = first_entry(result)?;
    let decimals = |key: &str, default: u32| {
        info.get(key)
            .and_then(Value::as_u64)
            .map(|v| v as u32)
            .unwrap_or(default)
    };
    Ok(PairInfo {
        pair_code: code.clone(),
        lot_decimals: decimals("lot_decimals", PairInfo::DEFAULT_LOT_DECIMALS),
        pair_decimals: decimals("pair_decimals", PairInfo::DEFAULT_PAIR_DECIMALS),
        ordermin: parse_or_default(info.get("ordermin")).max(0.0),
    })
}

fn parse_last_price(result: &Value) -> Result<f64, ExchangeError> {
    let (code, info) = first_entry(result)?;
    info.get("c")
        .and_then(|c| c.get(0))
        .and_then(number)
        .ok_or_else(|| ExchangeError::Parse(format!("no last trade price for {}", code)))
}

fn parse_balance(result: &Value, asset_key: &str) -> Result<f64, ExchangeError> {
    match result.get(asset_key) {
        None | Some(Value::Null) => Ok(0.0),
        Some(v) => number(v).ok_or_else(|| {
            ExchangeError::Parse(format!("balance for {} is not a number: {}", asset_key, v))
        }),
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Kraken REST client. Every call is a single request with the configured
/// timeout; nothing is retried.
pub struct KrakenClient {
    client: Client,
    base_url: String,
    credentials: Credentials,
    last_nonce: AtomicU64,
}

impl KrakenClient {
    pub fn new(cfg: &Config) -> Result<Self, ExchangeError> {
        let credentials = Credentials::from_config(cfg)?;
        let client = Client::builder().timeout(cfg.request_timeout()).build()?;
        Ok(Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            credentials,
            last_nonce: AtomicU64::new(0),
        })
    }

    /// Millisecond clock, bumped past the previous nonce when the clock has
    /// not moved.
    fn next_nonce(&self) -> u64 {
        let now = now_millis();
        let mut prev = self.last_nonce.load(Ordering::Relaxed);
        loop {
            let next = now.max(prev + 1);
            match self
                .last_nonce
                .compare_exchange_weak(prev, next, Ordering::SeqCst, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(actual) => prev = actual,
            }
        }
    }

    pub async fn public_call(&self, path: &str, params: &[(&str, &str)]) -> Result<Value, ExchangeError> {
        let url = format!("{}/0/public{}", self.base_url, path);
        debug!("GET {} {:?}", url, params);
        let resp = self.client.get(&url).query(params).send().await?;
        read_result(resp).await
    }

    /// Signed POST. The nonce is the first form field and the signed
    /// postdata is sent verbatim as the body.
    pub async fn private_call(
        &self,
        path: &str,
        params: Vec<(String, String)>,
    ) -> Result<Value, ExchangeError> {
        let nonce = self.next_nonce();
        let mut form = Vec::with_capacity(params.len() + 1);
        form.push(("nonce".to_string(), nonce.to_string()));
        form.extend(params);
        let postdata = serde_urlencoded::to_string(&form)
            .map_err(|e| ExchangeError::Parse(e.to_string()))?;

        let url_path = format!("/0/private{}", path);
        let signature = sign(&url_path, nonce, &postdata, &self.credentials.secret)?;

        debug!("POST {} nonce={}", url_path, nonce);
        let resp = self
            .client
            .post(format!("{}{}", self.base_url, url_path))
            .header("API-Key", &self.credentials.api_key)
            .header("API-Sign", signature)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded; charset=utf-8")
            .body(postdata)
            .send()
            .await?;
        read_result(resp).await
    }
}

#[async_trait]
impl Exchange for KrakenClient {
    async fn get_pair_info(&self, symbol: &str) -> Result<PairInfo, ExchangeError> {
        let pair = normalize_pair(symbol);
        let result = self.public_call("/AssetPairs", &[("pair", pair.as_str())]).await?;
        parse_pair_info(&result)
    }

    async fn get_ticker_price(&self, symbol: &str) -> Result<f64, ExchangeError> {
        let pair = normalize_pair(symbol);
        let result = self.public_call("/Ticker", &[("pair", pair.as_str())]).await?;
        parse_last_price(&result)
    }

    async fn get_balance(&self, asset_key: &str) -> Result<f64, ExchangeError> {
        let result = self.private_call("/Balance", Vec::new()).await?;
        parse_balance(&result, asset_key)
    }

    async fn add_order(&self, order: &OrderRequest) -> Result<Value, ExchangeError> {
        self.private_call("/AddOrder", order.to_form_params()).await
    }
}
