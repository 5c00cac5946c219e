//! Sources of account snapshots and instrument specifications.
//!
//! The sandbox never talks to an exchange. Whatever loads positions, balances
//! and prices implements these traits; the static implementations serve tests
//! and offline runs.

use crate::position::{Position, Ticker, WalletBalance};
use crate::symbol::{Coin, SymbolSpec};
use crate::types::ValidationError;
use std::collections::HashMap;

pub trait SnapshotProvider {
    /// Open positions of `symbol`, at most one per side.
    fn positions(&self, symbol: &str) -> Vec<Position>;
    fn wallet(&self, coin: Coin) -> Option<WalletBalance>;
    fn ticker(&self, symbol: &str) -> Option<Ticker>;
}

pub trait SymbolSpecProvider {
    fn spec(&self, symbol: &str) -> Option<SymbolSpec>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SnapshotError {
    #[error("no ticker for {0}")]
    NoTicker(String),

    #[error("no {0} wallet balance")]
    NoWallet(Coin),

    #[error("invalid snapshot: {0}")]
    Invalid(#[from] ValidationError),
}

/// In-memory snapshot.
#[derive(Debug, Clone, Default)]
pub struct StaticSnapshot {
    positions: Vec<Position>,
    wallets: HashMap<Coin, WalletBalance>,
    tickers: HashMap<String, Ticker>,
}

impl StaticSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.positions.push(position);
        self
    }

    pub fn with_wallet(mut self, wallet: WalletBalance) -> Self {
        self.wallets.insert(wallet.coin, wallet);
        self
    }

    pub fn with_ticker(mut self, symbol: impl Into<String>, ticker: Ticker) -> Self {
        self.tickers.insert(symbol.into(), ticker);
        self
    }
}

impl SnapshotProvider for StaticSnapshot {
    fn positions(&self, symbol: &str) -> Vec<Position> {
        self.positions.iter().filter(|p| p.symbol == symbol).cloned().collect()
    }

    fn wallet(&self, coin: Coin) -> Option<WalletBalance> {
        self.wallets.get(&coin).copied()
    }

    fn ticker(&self, symbol: &str) -> Option<Ticker> {
        self.tickers.get(symbol).copied()
    }
}

#[derive(Debug, Clone, Default)]
pub struct StaticSymbolSpecs {
    specs: HashMap<String, SymbolSpec>,
}

impl StaticSymbolSpecs {
    pub fn new() -> Self {
        Self::default()
    }

    /// BTCUSDT and ETHUSDT linear perpetuals.
    pub fn defaults() -> Self {
        Self::new().with(SymbolSpec::btc_usdt()).with(SymbolSpec::eth_usdt())
    }

    pub fn with(mut self, spec: SymbolSpec) -> Self {
        self.specs.insert(spec.name.clone(), spec);
        self
    }
}

impl SymbolSpecProvider for StaticSymbolSpecs {
    fn spec(&self, symbol: &str) -> Option<SymbolSpec> {
        self.specs.get(symbol).cloned()
    }
}
