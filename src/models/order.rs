use std::fmt;

use crate::models::{PairInfo, Side};
use crate::trading::sizing::{format_price, format_qty};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOrderType {
    StopLoss,
    TakeProfit,
}

impl fmt::Display for CloseOrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl CloseOrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CloseOrderType::StopLoss => "stop-loss",
            CloseOrderType::TakeProfit => "take-profit",
        }
    }
}

/// One exit leg triggered at `trigger_price`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CloseLeg {
    pub order_type: CloseOrderType,
    pub trigger_price: f64,
}

/// Exit legs attached to an entry. Stop-loss is always the primary leg when
/// both are present; at most two legs exist.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionalClose {
    legs: Vec<CloseLeg>,
}

impl ConditionalClose {
    pub fn from_levels(stop_loss: Option<f64>, take_profit: Option<f64>) -> Self {
        let sl = stop_loss.filter(|p| *p > 0.0).map(|p| CloseLeg {
            order_type: CloseOrderType::StopLoss,
            trigger_price: p,
        });
        let tp = take_profit.filter(|p| *p > 0.0).map(|p| CloseLeg {
            order_type: CloseOrderType::TakeProfit,
            trigger_price: p,
        });
        Self {
            legs: sl.into_iter().chain(tp).collect(),
        }
    }

    pub fn legs(&self) -> &[CloseLeg] {
        &self.legs
    }

    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub pair: String,
    pub side: Side,
    pub ordertype: &'static str,
    pub volume: String,
    pub close: ConditionalClose,
    pub userref: Option<i64>,
    pub validate: bool,
    price_decimals: u32,
}

impl OrderRequest {
    pub fn market(pair: &PairInfo, side: Side, quantity: f64) -> Self {
        Self {
            pair: pair.pair_code.clone(),
            side,
            ordertype: "market",
            volume: format_qty(quantity, pair.lot_decimals),
            close: ConditionalClose::default(),
            userref: None,
            validate: false,
            price_decimals: pair.pair_decimals,
        }
    }

    pub fn with_close(mut self, close: ConditionalClose) -> Self {
        self.close = close;
        self
    }

    pub fn with_userref(mut self, userref: i64) -> Self {
        self.userref = Some(userref);
        self
    }

    pub fn validate_only(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Flat form encoding expected by `/AddOrder`, nonce excluded.
    pub fn to_form_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("pair".to_string(), self.pair.clone()),
            ("type".to_string(), self.side.as_str().to_string()),
            ("ordertype".to_string(), self.ordertype.to_string()),
            ("volume".to_string(), self.volume.clone()),
        ];
        if let Some(userref) = self.userref {
            params.push(("userref".to_string(), userref.to_string()));
        }
        if self.validate {
            params.push(("validate".to_string(), "true".to_string()));
        }

        for (i, leg) in self.close.legs().iter().enumerate() {
            let suffix = if i == 0 { String::new() } else { (i + 1).to_string() };
            params.push((
                format!("close[ordertype{}]", suffix),
                leg.order_type.as_str().to_string(),
            ));
            params.push((
                format!("close[price{}]", suffix),
                format_price(leg.trigger_price, self.price_decimals),
            ));
        }
        params
    }
}
