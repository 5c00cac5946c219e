// 4.1: the snapshot the sandbox works on. immutable, every applied order yields a new one.
// at most one position per side, both on the state's symbol.

use crate::position::{Position, Ticker, WalletBalance};
use crate::provider::{SnapshotError, SnapshotProvider};
use crate::symbol::SymbolSpec;
use crate::types::{Amount, Side, ValidationError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SandboxState {
    symbol: String,
    ticker: Ticker,
    free_balance: Amount,
    available_balance: Amount,
    buy: Option<Position>,
    sell: Option<Position>,
}

impl SandboxState {
    /// Snapshot without positions.
    pub fn new(symbol: impl Into<String>, ticker: Ticker, free_balance: Amount, available_balance: Amount) -> Self {
        Self {
            symbol: symbol.into(),
            ticker,
            free_balance,
            available_balance,
            buy: None,
            sell: None,
        }
    }

    pub fn from_wallet(symbol: impl Into<String>, ticker: Ticker, wallet: &WalletBalance) -> Self {
        Self::new(symbol, ticker, wallet.free, wallet.available)
    }

    /// Adds a position to its side's slot.
    pub fn with_position(mut self, position: Position) -> Result<Self, ValidationError> {
        if position.symbol != self.symbol {
            return Err(ValidationError::SymbolMismatch {
                expected: self.symbol.clone(),
                actual: position.symbol,
            });
        }
        let slot = match position.side {
            Side::Buy => &mut self.buy,
            Side::Sell => &mut self.sell,
        };
        if slot.is_some() {
            return Err(ValidationError::DuplicateSide(position.side));
        }
        *slot = Some(position);
        Ok(self)
    }

    /// Loads positions, wallet and ticker of `spec`'s symbol.
    pub fn from_provider(provider: &dyn SnapshotProvider, spec: &SymbolSpec) -> Result<Self, SnapshotError> {
        let ticker = provider
            .ticker(&spec.name)
            .ok_or_else(|| SnapshotError::NoTicker(spec.name.clone()))?;
        let wallet = provider
            .wallet(spec.settle_coin)
            .ok_or(SnapshotError::NoWallet(spec.settle_coin))?;

        let mut state = Self::from_wallet(spec.name.clone(), ticker, &wallet);
        for position in provider.positions(&spec.name) {
            state = state.with_position(position)?;
        }
        Ok(state)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    pub fn free_balance(&self) -> Amount {
        self.free_balance
    }

    pub fn available_balance(&self) -> Amount {
        self.available_balance
    }

    pub fn position(&self, side: Side) -> Option<&Position> {
        match side {
            Side::Buy => self.buy.as_ref(),
            Side::Sell => self.sell.as_ref(),
        }
    }

    /// The position on the other side of `side`, if any.
    pub fn opposite(&self, side: Side) -> Option<&Position> {
        self.position(side.opposite())
    }

    pub fn has_position(&self, side: Side) -> bool {
        self.position(side).is_some()
    }

    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.buy.iter().chain(self.sell.iter())
    }

    pub(crate) fn replace(&self, side: Side, position: Option<Position>) -> Self {
        let mut next = self.clone();
        match side {
            Side::Buy => next.buy = position,
            Side::Sell => next.sell = position,
        }
        next
    }

    pub(crate) fn with_balances(mut self, free_balance: Amount, available_balance: Amount) -> Self {
        self.free_balance = free_balance;
        self.available_balance = available_balance;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::StaticSnapshot;
    use crate::symbol::Coin;
    use crate::types::Leverage;
    use rust_decimal_macros::dec;

    fn ticker(spec: &SymbolSpec) -> Ticker {
        Ticker::flat(spec.price(dec!(50000)).unwrap())
    }

    fn position(spec: &SymbolSpec, side: Side) -> Position {
        Position::open(spec, side, dec!(50000), dec!(0.1), Leverage::new(100).unwrap()).unwrap()
    }

    #[test]
    fn positions_land_in_their_slot() {
        let spec = SymbolSpec::btc_usdt();
        let state = SandboxState::new("BTCUSDT", ticker(&spec), Amount::new(dec!(100)), Amount::new(dec!(80)))
            .with_position(position(&spec, Side::Sell))
            .unwrap();

        assert!(state.has_position(Side::Sell));
        assert!(!state.has_position(Side::Buy));
        assert_eq!(state.opposite(Side::Buy).unwrap().side, Side::Sell);
        assert_eq!(state.positions().count(), 1);
    }

    #[test]
    fn rejects_second_position_on_a_side() {
        let spec = SymbolSpec::btc_usdt();
        let result = SandboxState::new("BTCUSDT", ticker(&spec), Amount::zero(), Amount::zero())
            .with_position(position(&spec, Side::Buy))
            .and_then(|s| s.with_position(position(&spec, Side::Buy)));

        assert_eq!(result.unwrap_err(), ValidationError::DuplicateSide(Side::Buy));
    }

    #[test]
    fn rejects_foreign_symbol() {
        let spec = SymbolSpec::btc_usdt();
        let eth = SymbolSpec::eth_usdt();
        let foreign = Position::open(&eth, Side::Buy, dec!(3000), dec!(1), Leverage::new(10).unwrap()).unwrap();

        let result = SandboxState::new("BTCUSDT", ticker(&spec), Amount::zero(), Amount::zero()).with_position(foreign);

        assert!(matches!(result, Err(ValidationError::SymbolMismatch { .. })));
    }

    #[test]
    fn replace_leaves_original_untouched() {
        let spec = SymbolSpec::btc_usdt();
        let state = SandboxState::new("BTCUSDT", ticker(&spec), Amount::zero(), Amount::zero())
            .with_position(position(&spec, Side::Buy))
            .unwrap();

        let next = state.replace(Side::Buy, None);

        assert!(state.has_position(Side::Buy));
        assert!(!next.has_position(Side::Buy));
    }

    #[test]
    fn loads_from_provider() {
        let spec = SymbolSpec::btc_usdt();
        let snapshot = StaticSnapshot::new()
            .with_ticker("BTCUSDT", ticker(&spec))
            .with_wallet(WalletBalance::new(Coin::Usdt, Amount::new(dec!(100)), Amount::new(dec!(90))))
            .with_position(position(&spec, Side::Sell))
            .with_position(position(&spec, Side::Buy));

        let state = SandboxState::from_provider(&snapshot, &spec).unwrap();

        assert_eq!(state.free_balance().value(), dec!(100));
        assert_eq!(state.available_balance().value(), dec!(90));
        assert_eq!(state.positions().count(), 2);
    }

    #[test]
    fn provider_without_wallet() {
        let spec = SymbolSpec::btc_usdt();
        let snapshot = StaticSnapshot::new().with_ticker("BTCUSDT", ticker(&spec));

        assert_eq!(
            SandboxState::from_provider(&snapshot, &spec),
            Err(SnapshotError::NoWallet(Coin::Usdt))
        );
    }
}
