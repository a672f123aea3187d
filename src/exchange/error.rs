use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExchangeError {
    /// Missing or malformed API credentials. Fatal at startup.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Kraken answered with a non-empty `error` list.
    #[error("kraken error: {}", .0.join(","))]
    Api(Vec<String>),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    Parse(String),
}
