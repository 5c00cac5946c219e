// 7.4: turns a parsed grid into concrete buy orders.
// an endpoint pnl percent p maps to the price where a position of `side` opened at the
// reference price would show p% roe: ref * (1 + sign * p / 100 / leverage).

use super::parser::OrdersGridDefinition;
use crate::sandbox::{HypotheticalOrder, OrderError};
use crate::symbol::SymbolSpec;
use crate::types::{Leverage, Price, Side};
use rust_decimal::Decimal;

pub struct OrdersGrid;

impl OrdersGrid {
    /// Price of a pnl percent relative to `reference`. None when out of decimal range.
    pub fn price_at(side: Side, reference: &Price, pnl_percent: Decimal, leverage: Leverage) -> Option<Decimal> {
        let move_fraction = pnl_percent / Decimal::ONE_HUNDRED / leverage.as_decimal();
        let factor = Decimal::ONE.checked_add(side.sign() * move_fraction)?;
        reference.value().checked_mul(factor)
    }

    /// `count` orders evenly spread between the endpoints, splitting
    /// `volume_percent` of `total_qty` equally.
    pub fn build(
        definition: &OrdersGridDefinition,
        side: Side,
        reference: &Price,
        total_qty: Decimal,
        leverage: Leverage,
        spec: &SymbolSpec,
    ) -> Result<Vec<HypotheticalOrder>, OrderError> {
        let count = definition.orders_count();
        let qty = total_qty * definition.volume_percent() / Decimal::ONE_HUNDRED / Decimal::from(count);

        let out_of_range = || OrderError::ConstraintViolation {
            reason: format!("grid {} leaves the price range", definition),
        };

        let from = definition.from_percent();
        let step = if count > 1 {
            let span = definition.to_percent().checked_sub(from).ok_or_else(out_of_range)?;
            span / Decimal::from(count - 1)
        } else {
            Decimal::ZERO
        };

        let context = definition.context();
        (0..count)
            .map(|i| -> Result<HypotheticalOrder, OrderError> {
                let pnl_percent = from + step * Decimal::from(i);
                let price = Self::price_at(side, reference, pnl_percent, leverage).ok_or_else(out_of_range)?;
                Ok(HypotheticalOrder::buy(spec, side, price, qty)?.with_context(context.clone()))
            })
            .collect()
    }
}
