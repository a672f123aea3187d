/// Kraken still lists bitcoin under its legacy XBT ticker.
const PAIR_ALIASES: &[(&str, &str)] = &[
    ("BTCUSD", "XBTUSD"),
    ("BTCUSDT", "XBTUSDT"),
    ("XBTUSD", "XBTUSD"),
    ("XBTUSDT", "XBTUSDT"),
    ("ETHUSD", "ETHUSD"),
    ("ETHUSDT", "ETHUSDT"),
];

/// Symbol prefix -> Kraken balance key. Longer prefixes come first.
const BASE_ASSET_KEYS: &[(&str, &str)] = &[
    ("DOGE", "XXDG"),
    ("XBT", "XXBT"),
    ("BTC", "XXBT"),
    ("ETH", "XETH"),
    ("LTC", "XLTC"),
    ("XRP", "XXRP"),
    ("XLM", "XXLM"),
    ("ETC", "XETC"),
    ("SOL", "SOL"),
    ("ADA", "ADA"),
    ("DOT", "DOT"),
];

/// Drops `:` and `/` separators and upper-cases, e.g. `KRAKEN:eth/usd` ->
/// `KRAKENETHUSD`, `eth/usd` -> `ETHUSD`.
pub fn clean_symbol(symbol: &str) -> String {
    symbol
        .chars()
        .filter(|c| *c != ':' && *c != '/')
        .collect::<String>()
        .to_uppercase()
}

/// Maps a user-facing symbol to the pair code Kraken accepts. Symbols
/// without an alias pass through cleaned.
pub fn normalize_pair(symbol: &str) -> String {
    let s = clean_symbol(symbol);
    PAIR_ALIASES
        .iter()
        .find(|(from, _)| *from == s)
        .map(|(_, to)| to.to_string())
        .unwrap_or(s)
}

/// Balance key of the quote currency.
pub fn quote_asset_key(symbol: &str) -> &'static str {
    if clean_symbol(symbol).ends_with("USDT") {
        "USDT"
    } else {
        "ZUSD"
    }
}

/// Balance key of the base currency, or `fallback` when the prefix is not a
/// known asset.
pub fn base_asset_key(symbol: &str, fallback: &str) -> String {
    let s = clean_symbol(symbol);
    BASE_ASSET_KEYS
        .iter()
        .find(|(prefix, _)| s.starts_with(prefix))
        .map(|(_, key)| key.to_string())
        .unwrap_or_else(|| fallback.to_string())
}
