//! Margin and commission arithmetic for hypothetical orders.
//!
//! Initial margin is order value divided by leverage. Opening an order also
//! reserves the fee to close it at the bankruptcy price, which sits below the
//! entry for a long and above it for a short, so the commission charged
//! for a buy differs from the one charged for a sell.
//!
//! Every amount is rounded to the settlement coin's precision.

use crate::config::FeeConfig;
use crate::symbol::SymbolSpec;
use crate::types::{Amount, Leverage, Side, ValidationError};
use rust_decimal::Decimal;

pub struct CostCalculator<'a> {
    spec: &'a SymbolSpec,
    fees: &'a FeeConfig,
}

impl<'a> CostCalculator<'a> {
    pub fn new(spec: &'a SymbolSpec, fees: &'a FeeConfig) -> Self {
        Self { spec, fees }
    }

    /// qty * price / leverage
    pub fn order_margin(&self, price: Decimal, qty: Decimal, leverage: u32) -> Result<Amount, ValidationError> {
        let leverage = validate(price, qty, leverage)?;
        Ok(self.spec.amount(qty * price / leverage.as_decimal()))
    }

    /// Taker commission on the order value.
    pub fn open_fee(&self, price: Decimal, qty: Decimal) -> Result<Amount, ValidationError> {
        validate_volume(price, qty)?;
        Ok(self.spec.amount(qty * price * self.taker_rate()))
    }

    /// Commission to close at the bankruptcy price of a position opened by this order.
    pub fn close_fee(
        &self,
        price: Decimal,
        qty: Decimal,
        leverage: u32,
        side: Side,
    ) -> Result<Amount, ValidationError> {
        let leverage = validate(price, qty, leverage)?;
        let bankruptcy = bankruptcy_price(price, leverage, side);
        Ok(self.spec.amount(qty * bankruptcy * self.taker_rate()))
    }

    /// Margin plus open and close commission: what the exchange requires to be available.
    pub fn total_buy_cost(
        &self,
        price: Decimal,
        qty: Decimal,
        leverage: u32,
        side: Side,
    ) -> Result<Amount, ValidationError> {
        let margin = self.order_margin(price, qty, leverage)?;
        let open = self.open_fee(price, qty)?;
        let close = self.close_fee(price, qty, leverage, side)?;
        Ok(margin.add(open).add(close))
    }

    /// Commission charged when a stop closes `qty` at `price`.
    pub fn execution_fee(&self, price: Decimal, qty: Decimal) -> Result<Amount, ValidationError> {
        self.open_fee(price, qty)
    }

    fn taker_rate(&self) -> Decimal {
        self.fees.taker_rate(self.spec.category)
    }
}

/// Price at which the position's initial margin is fully lost.
pub fn bankruptcy_price(entry: Decimal, leverage: Leverage, side: Side) -> Decimal {
    match side {
        Side::Buy => entry * (Decimal::ONE - leverage.initial_margin_fraction()),
        Side::Sell => entry * (Decimal::ONE + leverage.initial_margin_fraction()),
    }
}

fn validate_volume(price: Decimal, qty: Decimal) -> Result<(), ValidationError> {
    if qty <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveQty(qty));
    }
    if price <= Decimal::ZERO {
        return Err(ValidationError::NonPositivePrice(price));
    }
    Ok(())
}

fn validate(price: Decimal, qty: Decimal, leverage: u32) -> Result<Leverage, ValidationError> {
    validate_volume(price, qty)?;
    Leverage::new(leverage)
}
