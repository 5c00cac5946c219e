// 3.0: one position per side. pnl = (exit - entry) * size * sign(side).
// 3.1 has increase/reduce at the bottom. the opposite side is never referenced from here,
// it is looked up on the owning snapshot.

use crate::symbol::{Coin, SymbolSpec};
use crate::types::{Amount, Leverage, Price, Side, Timestamp, ValidationError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub side: Side,
    pub symbol: String,
    pub entry_price: Price,
    pub size: Decimal,
    pub leverage: Leverage,
    pub initial_margin: Amount,
    /// Zero when the position carries no liquidation risk.
    pub liquidation_price: Price,
    pub opened_at: Option<Timestamp>,
}

impl Position {
    pub fn new(
        side: Side,
        symbol: impl Into<String>,
        entry_price: Price,
        size: Decimal,
        leverage: Leverage,
        initial_margin: Amount,
    ) -> Self {
        Self {
            side,
            symbol: symbol.into(),
            entry_price,
            size,
            leverage,
            initial_margin,
            liquidation_price: Price::zero(entry_price.precision()),
            opened_at: None,
        }
    }

    /// Position whose initial margin is derived from entry, size and leverage.
    pub fn open(
        spec: &SymbolSpec,
        side: Side,
        entry_price: Decimal,
        size: Decimal,
        leverage: Leverage,
    ) -> Result<Self, ValidationError> {
        if size <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveQty(size));
        }
        let entry = spec.price(entry_price)?;
        let margin = spec.amount(size * entry_price / leverage.as_decimal());
        Ok(Self::new(side, spec.name.clone(), entry, size, leverage, margin))
    }

    pub fn with_liquidation_price(mut self, price: Price) -> Self {
        self.liquidation_price = price;
        self
    }

    pub fn with_opened_at(mut self, timestamp: Timestamp) -> Self {
        self.opened_at = Some(timestamp);
        self
    }

    pub fn is_long(&self) -> bool {
        self.side.is_long()
    }

    pub fn notional_value(&self) -> Decimal {
        self.size * self.entry_price.value()
    }

    // 3.1: paper gains/losses against the mark
    pub fn unrealized_pnl(&self, mark_price: &Price) -> Decimal {
        calculate_realized_pnl(self.side, self.entry_price.value(), mark_price.value(), self.size)
    }

    /// Unrealized pnl relative to initial margin, in percent (ROE).
    pub fn pnl_percent(&self, mark_price: &Price) -> Decimal {
        if self.initial_margin.value().is_zero() {
            return Decimal::ZERO;
        }
        self.unrealized_pnl(mark_price) / self.initial_margin.value() * Decimal::ONE_HUNDRED
    }
}

// 3.2: the pnl formula. (exit - entry) * qty * sign
pub fn calculate_realized_pnl(side: Side, entry: Decimal, exit: Decimal, qty: Decimal) -> Decimal {
    (exit - entry) * qty * side.sign()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletBalance {
    pub coin: Coin,
    pub free: Amount,
    pub available: Amount,
}

impl WalletBalance {
    pub fn new(coin: Coin, free: Amount, available: Amount) -> Self {
        Self {
            coin,
            free,
            available,
        }
    }
}

/// The three reference prices the exchange publishes per symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticker {
    pub index: Price,
    pub mark: Price,
    pub last: Price,
}

impl Ticker {
    pub fn new(index: Price, mark: Price, last: Price) -> Self {
        Self { index, mark, last }
    }

    /// All three prices at one value.
    pub fn flat(price: Price) -> Self {
        Self::new(price, price, price)
    }
}

#[derive(Debug, Clone)]
pub struct PositionUpdate {
    pub new_position: Option<Position>,
    pub closed_qty: Decimal,
    pub realized_pnl: Amount,
    pub margin_released: Amount,
}

// 3.3: adds to the position. volume-weighted entry, margin accumulates
pub fn increase_position(position: &Position, qty: Decimal, fill_price: &Price, margin: Amount) -> Position {
    debug_assert!(qty > Decimal::ZERO, "increase amount must be positive");

    let new_size = position.size + qty;
    let weighted = position.size * position.entry_price.value() + qty * fill_price.value();
    let entry_value = weighted / new_size;

    let mut next = position.clone();
    next.entry_price = Price::new(entry_value, position.entry_price.precision())
        .unwrap_or(position.entry_price);
    next.size = new_size;
    next.initial_margin = position.initial_margin.add(margin);
    next
}

// 3.4: closes part of the position. a remainder at or below the minimum tradable volume
// is closed as well rather than kept as dust.
pub fn reduce_position(position: &Position, qty: Decimal, exit_price: &Price, spec: &SymbolSpec) -> PositionUpdate {
    debug_assert!(qty > Decimal::ZERO, "reduce amount must be positive");

    let mut closed = qty.min(position.size);
    let remaining = position.size - closed;
    let full_close = remaining <= spec.min_order_qty;
    if full_close {
        closed = position.size;
    }

    let realized = spec.amount(calculate_realized_pnl(
        position.side,
        position.entry_price.value(),
        exit_price.value(),
        closed,
    ));

    if full_close {
        return PositionUpdate {
            new_position: None,
            closed_qty: closed,
            realized_pnl: realized,
            margin_released: position.initial_margin,
        };
    }

    let released = spec.amount(position.initial_margin.value() * closed / position.size);
    let mut next = position.clone();
    next.size = position.size - closed;
    next.initial_margin = position.initial_margin.sub(released);

    PositionUpdate {
        new_position: Some(next),
        closed_qty: closed,
        realized_pnl: realized,
        margin_released: released,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn short_position() -> Position {
        Position::open(
            &SymbolSpec::btc_usdt(),
            Side::Sell,
            dec!(67533.43),
            dec!(0.188),
            Leverage::new(100).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn open_derives_initial_margin() {
        let pos = short_position();
        assert_eq!(pos.initial_margin.value(), dec!(126.9628));
        assert!(pos.liquidation_price.is_zero());
    }

    #[test]
    fn unrealized_pnl_short() {
        let pos = short_position();
        let spec = SymbolSpec::btc_usdt();
        let higher = spec.price(dec!(68533.43)).unwrap();
        assert_eq!(pos.unrealized_pnl(&higher), dec!(-188.000));

        let lower = spec.price(dec!(66533.43)).unwrap();
        assert_eq!(pos.unrealized_pnl(&lower), dec!(188.000));
    }

    #[test]
    fn pnl_percent_is_relative_to_margin() {
        let spec = SymbolSpec::btc_usdt();
        let pos = Position::open(&spec, Side::Buy, dec!(50000), dec!(0.1), Leverage::new(100).unwrap()).unwrap();
        // im = 50, a 1% move against = -50 = -100%
        let mark = spec.price(dec!(49500)).unwrap();
        assert_eq!(pos.pnl_percent(&mark), dec!(-100));
    }

    #[test]
    fn increase_averages_entry() {
        let spec = SymbolSpec::btc_usdt();
        let pos = Position::open(&spec, Side::Sell, dec!(67533.43), dec!(0.187), Leverage::new(100).unwrap()).unwrap();
        let fill = spec.price(dec!(68150)).unwrap();

        let next = increase_position(&pos, dec!(0.001), &fill, Amount::new(dec!(0.6815)));

        assert_eq!(next.size, dec!(0.188));
        assert_eq!(next.entry_price.value().round_dp(11), dec!(67536.70962765957));
        assert_eq!(next.initial_margin, pos.initial_margin.add(Amount::new(dec!(0.6815))));
    }

    #[test]
    fn reduce_partial_releases_proportional_margin() {
        let spec = SymbolSpec::btc_usdt();
        let pos = short_position();
        let exit = spec.price(dec!(67850)).unwrap();

        let update = reduce_position(&pos, dec!(0.001), &exit, &spec);

        let next = update.new_position.unwrap();
        assert_eq!(next.size, dec!(0.187));
        assert_eq!(next.entry_price, pos.entry_price);
        assert_eq!(update.margin_released.value(), dec!(0.6753));
        assert_eq!(next.initial_margin.value(), dec!(126.2875));
        assert_eq!(update.realized_pnl.value(), dec!(-0.3166));
    }

    #[test]
    fn reduce_full_close_removes_position() {
        let spec = SymbolSpec::btc_usdt();
        let pos = short_position();
        let exit = spec.price(dec!(67000)).unwrap();

        let update = reduce_position(&pos, dec!(0.188), &exit, &spec);

        assert!(update.new_position.is_none());
        assert_eq!(update.closed_qty, dec!(0.188));
        assert_eq!(update.margin_released, pos.initial_margin);
    }

    #[test]
    fn reduce_leaving_dust_closes_everything() {
        let spec = SymbolSpec::btc_usdt();
        let pos = short_position();
        let exit = spec.price(dec!(67000)).unwrap();

        // 0.001 would remain, which is the minimum tradable volume
        let update = reduce_position(&pos, dec!(0.187), &exit, &spec);

        assert!(update.new_position.is_none());
        assert_eq!(update.closed_qty, dec!(0.188));
    }

    #[test]
    fn reduce_more_than_size_is_clamped() {
        let spec = SymbolSpec::btc_usdt();
        let pos = short_position();
        let exit = spec.price(dec!(67000)).unwrap();

        let update = reduce_position(&pos, dec!(5), &exit, &spec);

        assert!(update.new_position.is_none());
        assert_eq!(update.closed_qty, dec!(0.188));
    }
}
