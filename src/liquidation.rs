//! Liquidation price estimation.
//!
//! The exchange force-closes the account when its margin balance drops to the
//! maintenance margin. With both sides of a symbol open, the two positions share
//! one balance: only the net exposure of the larger (main) side moves equity, so
//! the liquidation price is solved from one equation combining both positions.
//!
//! Two independent derivations are kept. `handle` is the closed form used by the
//! sandbox; `reference` finds the root of the margin balance function from two
//! sample prices. They must agree within `FORMULA_TOLERANCE`.
//!
//! A price of zero means the side carries no liquidation risk.

use crate::config::MarginParams;
use crate::position::{calculate_realized_pnl, Position};
use crate::symbol::SymbolSpec;
use crate::types::{round_half_up, Amount, Price, Side};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Maximum divergence between the two formulas, in price units.
pub const FORMULA_TOLERANCE: Decimal = dec!(0.02);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationEstimate {
    pub price: Price,
    /// Distance from the position entry. Zero with the sentinel price.
    pub distance: Decimal,
}

impl LiquidationEstimate {
    pub fn is_risk_free(&self) -> bool {
        self.price.is_zero()
    }
}

/// The side whose net exposure drives the account equity.
struct Exposure<'p> {
    main: &'p Position,
    support: Option<&'p Position>,
    net: Decimal,
}

impl<'p> Exposure<'p> {
    // none when the position is the smaller side or the pair is flat
    fn of(position: &'p Position, opposite: Option<&'p Position>) -> Option<Self> {
        let support_size = opposite.map(|o| o.size).unwrap_or(Decimal::ZERO);
        let net = position.size - support_size;
        if net <= Decimal::ZERO {
            return None;
        }
        Some(Self {
            main: position,
            support: opposite,
            net,
        })
    }

    fn net_value_at_entry(&self) -> Decimal {
        self.net * self.main.entry_price.value()
    }
}

pub struct LiquidationCalculator<'a> {
    spec: &'a SymbolSpec,
    params: &'a MarginParams,
}

impl<'a> LiquidationCalculator<'a> {
    pub fn new(spec: &'a SymbolSpec, params: &'a MarginParams) -> Self {
        Self { spec, params }
    }

    /// Closed-form estimate.
    pub fn handle(&self, position: &Position, opposite: Option<&Position>, free_balance: Amount) -> LiquidationEstimate {
        let Some(exposure) = Exposure::of(position, opposite) else {
            return self.risk_free();
        };

        let main = exposure.main;
        let entry = main.entry_price.value();
        let buffer = free_balance.value()
            + exposure.net_value_at_entry()
                * (main.leverage.initial_margin_fraction() - self.params.maintenance_margin_rate);

        let (support_size, support_entry) = match exposure.support {
            Some(s) => (s.size, s.entry_price.value()),
            None => (Decimal::ZERO, Decimal::ZERO),
        };
        let locked = main.size * entry - support_size * support_entry;

        let raw = match main.side {
            Side::Sell => (buffer + locked) / exposure.net,
            Side::Buy => (locked - buffer) / exposure.net,
        };

        self.estimate(raw, main)
    }

    /// Root of `margin balance(P) - maintenance margin` from two evaluations.
    pub fn reference(&self, position: &Position, opposite: Option<&Position>, free_balance: Amount) -> LiquidationEstimate {
        let Some(exposure) = Exposure::of(position, opposite) else {
            return self.risk_free();
        };

        let net_value = exposure.net_value_at_entry();
        let initial = net_value / exposure.main.leverage.as_decimal();
        let maintenance = net_value * self.params.maintenance_margin_rate;

        let surplus = |price: Decimal| -> Decimal {
            let mut balance = free_balance.value() + initial;
            for p in std::iter::once(exposure.main).chain(exposure.support) {
                balance += calculate_realized_pnl(p.side, p.entry_price.value(), price, p.size);
            }
            balance - maintenance
        };

        let p0 = exposure.main.entry_price.value();
        let p1 = p0 * dec!(2);
        let f0 = surplus(p0);
        let f1 = surplus(p1);
        if f1 == f0 {
            return self.risk_free();
        }
        let raw = p0 - f0 * (p1 - p0) / (f1 - f0);

        self.estimate(raw, exposure.main)
    }

    /// Absolute difference between the two formulas.
    pub fn divergence(&self, position: &Position, opposite: Option<&Position>, free_balance: Amount) -> Decimal {
        let a = self.handle(position, opposite, free_balance).price.rounded();
        let b = self.reference(position, opposite, free_balance).price.rounded();
        (a - b).abs()
    }

    fn estimate(&self, raw: Decimal, main: &Position) -> LiquidationEstimate {
        let rounded = round_half_up(raw, self.spec.price_precision);
        match Price::new(rounded, self.spec.price_precision) {
            Ok(price) => LiquidationEstimate {
                price,
                distance: (rounded - main.entry_price.value()).abs(),
            },
            Err(_) => self.risk_free(),
        }
    }

    fn risk_free(&self) -> LiquidationEstimate {
        LiquidationEstimate {
            price: self.spec.zero_price(),
            distance: Decimal::ZERO,
        }
    }
}
