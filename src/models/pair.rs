
/// Trading rules for one Kraken pair, as returned by `/AssetPairs`.
#[derive(Debug, Clone, PartialEq)]
pub struct PairInfo {
    pub pair_code: String,
    pub lot_decimals: u32,
    pub pair_decimals: u32,
    pub ordermin: f64,
}

impl PairInfo {
    pub const DEFAULT_LOT_DECIMALS: u32 = 5;
    pub const DEFAULT_PAIR_DECIMALS: u32 = 2;
}
