use rust_decimal::prelude::*;

use crate::models::{PairInfo, Side};

/// Largest scale `Decimal` can carry.
const MAX_DECIMALS: u32 = 28;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionSize {
    pub quantity: f64,
    pub notional: f64,
}

impl PositionSize {
    pub fn zero() -> Self {
        Self {
            quantity: 0.0,
            notional: 0.0,
        }
    }

    pub fn is_tradeable(&self, min_notional: f64) -> bool {
        self.quantity > 0.0 && self.notional >= min_notional
    }
}

fn to_lot(qty: f64, lot_decimals: u32) -> Decimal {
    if !qty.is_finite() || qty <= 0.0 {
        return Decimal::ZERO;
    }
    let dp = lot_decimals.min(MAX_DECIMALS);
    // Shortest round-trip text keeps 0.29 as 0.29 instead of 0.28999...
    qty.to_string()
        .parse::<Decimal>()
        .ok()
        .or_else(|| Decimal::from_f64(qty))
        .unwrap_or(Decimal::ZERO)
        .round_dp_with_strategy(dp, RoundingStrategy::ToZero)
}

/// Truncates `qty` to `lot_decimals` places. Negative and non-finite input
/// becomes 0.
pub fn round_qty(qty: f64, lot_decimals: u32) -> f64 {
    to_lot(qty, lot_decimals)
        .to_string()
        .parse::<f64>()
        .unwrap_or(0.0)
}

/// `round_qty` rendered with exactly `lot_decimals` digits after the point.
pub fn format_qty(qty: f64, lot_decimals: u32) -> String {
    let mut lot = to_lot(qty, lot_decimals);
    lot.rescale(lot_decimals.min(MAX_DECIMALS));
    lot.to_string()
}

pub fn format_price(price: f64, pair_decimals: u32) -> String {
    format!("{:.*}", pair_decimals as usize, price)
}

/// Quantity before exchange minimum and lot rounding.
///
/// Buys spend `equity_pct` of the quote balance at `price`; sells flatten the
/// whole base balance (spot only, nothing is shorted).
pub fn raw_quantity(side: Side, price: f64, balance: f64, equity_pct: f64) -> f64 {
    let balance = if balance.is_finite() { balance.max(0.0) } else { 0.0 };
    match side {
        Side::Buy => {
            if !(price.is_finite() && price > 0.0) {
                return 0.0;
            }
            balance * equity_pct / price
        }
        Side::Sell => balance,
    }
}

/// Sizes an order for `side`.
///
/// `balance` is the quote balance for buys and the base balance for sells.
/// The exchange minimum is checked on the raw quantity; lot rounding happens
/// afterwards and never re-triggers the minimum.
pub fn size_position(
    side: Side,
    pair: &PairInfo,
    price: f64,
    balance: f64,
    equity_pct: f64,
) -> PositionSize {
    let raw = raw_quantity(side, price, balance, equity_pct);
    let qty = if raw < pair.ordermin { 0.0 } else { raw };
    let quantity = round_qty(qty, pair.lot_decimals);
    if quantity <= 0.0 {
        return PositionSize::zero();
    }
    PositionSize {
        quantity,
        notional: quantity * price,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(lot_decimals: u32, ordermin: f64) -> PairInfo {
        PairInfo {
            pair_code: "XETHZUSD".to_string(),
            lot_decimals,
            pair_decimals: 2,
            ordermin,
        }
    }

    #[test]
    fn round_qty_truncates_to_lot() {
        assert_eq!(round_qty(0.123456789, 4), 0.1234);
        assert_eq!(round_qty(0.29, 2), 0.29);
        assert_eq!(round_qty(1.999, 0), 1.0);
        assert_eq!(round_qty(-3.5, 4), 0.0);
        assert_eq!(round_qty(f64::NAN, 4), 0.0);
    }

    #[test]
    fn round_qty_is_idempotent() {
        for &(x, n) in &[(0.15, 8), (0.123456789, 5), (1234.5678, 2), (0.0001, 3), (7.0, 0)] {
            let once = round_qty(x, n);
            assert_eq!(round_qty(once, n), once, "x={} n={}", x, n);
            assert!(once >= 0.0);
        }
    }

    #[test]
    fn format_qty_has_exact_digits() {
        assert_eq!(format_qty(0.15, 8), "0.15000000");
        assert_eq!(format_qty(0.123456789, 5), "0.12345");
        assert_eq!(format_qty(2.0, 0), "2");
        assert_eq!(format_qty(-1.0, 3), "0.000");
        for n in 0..10u32 {
            let s = format_qty(1.23456789, n);
            let digits = s.split('.').nth(1).map(str::len).unwrap_or(0);
            assert_eq!(digits as u32, n, "{}", s);
        }
    }

    #[test]
    fn format_price_uses_pair_decimals() {
        assert_eq!(format_price(1800.0, 2), "1800.00");
        assert_eq!(format_price(0.123456, 4), "0.1235");
    }

    #[test]
    fn buy_spends_equity_fraction() {
        let raw = raw_quantity(Side::Buy, 2000.0, 1000.0, 0.30);
        assert!((raw - 0.15).abs() < 1e-12);

        let size = size_position(Side::Buy, &pair(8, 0.002), 2000.0, 1000.0, 0.30);
        assert!((size.quantity - 0.15).abs() < 1e-12);
        assert!((size.notional - 300.0).abs() < 1e-9);
    }

    #[test]
    fn buy_with_no_price_is_zero() {
        assert_eq!(raw_quantity(Side::Buy, 0.0, 1000.0, 0.30), 0.0);
        assert_eq!(raw_quantity(Side::Buy, -1.0, 1000.0, 0.30), 0.0);
        let size = size_position(Side::Buy, &pair(8, 0.0), 0.0, 1000.0, 0.30);
        assert_eq!(size, PositionSize::zero());
    }

    #[test]
    fn sell_flattens_whole_balance() {
        let size = size_position(Side::Sell, &pair(4, 0.002), 2000.0, 1.23456, 0.30);
        assert_eq!(size.quantity, 1.2345);
        assert!((size.notional - 2469.0).abs() < 1e-9);
    }

    #[test]
    fn sell_below_minimum_is_zero() {
        let size = size_position(Side::Sell, &pair(8, 0.002), 2000.0, 0.0015, 0.30);
        assert_eq!(size.quantity, 0.0);
        assert_eq!(size.notional, 0.0);
        assert!(!size.is_tradeable(10.0));
    }

    #[test]
    fn rounding_does_not_recheck_minimum() {
        // 0.0029 clears a 0.0025 minimum, truncates to 0.002 and is still sized.
        let size = size_position(Side::Sell, &pair(3, 0.0025), 5000.0, 0.0029, 0.30);
        assert_eq!(size.quantity, 0.002);
        assert!((size.notional - 10.0).abs() < 1e-9);
    }

    #[test]
    fn tradeable_requires_min_notional() {
        let size = PositionSize {
            quantity: 0.001,
            notional: 9.99,
        };
        assert!(!size.is_tradeable(10.0));
        let size = PositionSize {
            quantity: 0.001,
            notional: 10.0,
        };
        assert!(size.is_tradeable(10.0));
    }
}
