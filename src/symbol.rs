//! Instrument specification.
//!
//! A `SymbolSpec` fixes how prices and quantities are rounded for one
//! instrument and which minimum order size and notional the exchange accepts.
//! Wallet amounts follow the precision of the settlement coin.

use crate::types::{round_down, round_half_up, Amount, Price, ValidationError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Settlement coin of an instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Coin {
    Usdt,
    Usdc,
    Btc,
}

impl Coin {
    /// Decimal places kept for wallet amounts in this coin.
    pub fn precision(&self) -> u32 {
        match self {
            Coin::Usdt | Coin::Usdc => 4,
            Coin::Btc => 8,
        }
    }

    pub fn round(&self, value: Decimal) -> Amount {
        Amount::new(round_half_up(value, self.precision()))
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Coin::Usdt => write!(f, "USDT"),
            Coin::Usdc => write!(f, "USDC"),
            Coin::Btc => write!(f, "BTC"),
        }
    }
}

/// Instrument category. Commission rates are keyed by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Linear,
    Inverse,
    Spot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolSpec {
    pub name: String,
    pub settle_coin: Coin,
    pub category: Category,
    pub min_order_qty: Decimal,
    pub min_notional: Decimal,
    /// Decimal places of a price.
    pub price_precision: u32,
    /// Decimal places of an order quantity.
    pub qty_precision: u32,
}

impl SymbolSpec {
    /// BTCUSDT linear perpetual.
    pub fn btc_usdt() -> Self {
        Self {
            name: "BTCUSDT".to_string(),
            settle_coin: Coin::Usdt,
            category: Category::Linear,
            min_order_qty: dec!(0.001),
            min_notional: dec!(5),
            price_precision: 2,
            qty_precision: 3,
        }
    }

    /// ETHUSDT linear perpetual.
    pub fn eth_usdt() -> Self {
        Self {
            name: "ETHUSDT".to_string(),
            settle_coin: Coin::Usdt,
            category: Category::Linear,
            min_order_qty: dec!(0.01),
            min_notional: dec!(5),
            price_precision: 2,
            qty_precision: 2,
        }
    }

    pub fn price(&self, value: Decimal) -> Result<Price, ValidationError> {
        Price::new(value, self.price_precision)
    }

    /// Price rounded to the instrument tick.
    pub fn rounded_price(&self, value: Decimal) -> Result<Price, ValidationError> {
        Price::new(round_half_up(value, self.price_precision), self.price_precision)
    }

    pub fn zero_price(&self) -> Price {
        Price::zero(self.price_precision)
    }

    pub fn round_qty(&self, qty: Decimal) -> Decimal {
        round_down(qty, self.qty_precision)
    }

    pub fn amount(&self, value: Decimal) -> Amount {
        self.settle_coin.round(value)
    }

    pub fn is_below_min_qty(&self, qty: Decimal) -> bool {
        qty < self.min_order_qty
    }

    pub fn is_below_min_notional(&self, qty: Decimal, price: Decimal) -> bool {
        qty * price < self.min_notional
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coin_rounds_amounts() {
        assert_eq!(Coin::Usdt.round(dec!(0.03748)).value(), dec!(0.0375));
        assert_eq!(Coin::Btc.round(dec!(0.123456789)).value(), dec!(0.12345679));
    }

    #[test]
    fn spec_rounds_price_and_qty() {
        let spec = SymbolSpec::btc_usdt();
        assert_eq!(spec.rounded_price(dec!(68150.005)).unwrap().value(), dec!(68150.01));
        assert_eq!(spec.round_qty(dec!(0.0019)), dec!(0.001));
        assert!(spec.rounded_price(dec!(0.001)).is_err());
    }

    #[test]
    fn minimum_checks() {
        let spec = SymbolSpec::btc_usdt();
        assert!(spec.is_below_min_qty(dec!(0.0009)));
        assert!(!spec.is_below_min_qty(dec!(0.001)));
        assert!(spec.is_below_min_notional(dec!(0.001), dec!(4000)));
        assert!(!spec.is_below_min_notional(dec!(0.001), dec!(68000)));
    }
}
