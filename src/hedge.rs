//! Hedge classification.
//!
//! A hedge is a pair of opposite positions on one symbol. The main position is
//! the one carrying more initial margin; the support position exists to cap the
//! main position's liquidation risk. A hedge is derived on demand from a
//! snapshot and never stored.
//!
//! Main and support are a margin classification. Liquidation risk follows net
//! size instead: only the larger side can be liquidated (see
//! `LiquidationCalculator`). With equal leverage the two agree. With mixed
//! leverage a support can outsize the main, and `exposed_position` then names
//! the support.
//!
//! Support is considered enough once its initial margin reaches a required
//! percent of the main initial margin. The required percent is staged by the
//! main position's current pnl: the deeper the main is in loss, the more
//! support it needs.

use crate::config::ConfigError;
use crate::position::Position;
use crate::sandbox::SandboxState;
use crate::types::{Price, Side};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HedgeError {
    #[error("both positions are on the {0} side")]
    SameSide(Side),

    #[error("positions belong to different symbols: {0} and {1}")]
    SymbolMismatch(String, String),
}

/// Required support percent once the main pnl percent is at or below `main_pnl_percent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportBracket {
    pub main_pnl_percent: Decimal,
    pub required_percent: Decimal,
}

impl SupportBracket {
    pub fn new(main_pnl_percent: Decimal, required_percent: Decimal) -> Self {
        Self {
            main_pnl_percent,
            required_percent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportRatioConfig {
    /// Used when no bracket applies.
    pub default_percent: Decimal,
    /// Hard floor for any required percent.
    pub min_percent: Decimal,
    pub brackets: Vec<SupportBracket>,
}

impl Default for SupportRatioConfig {
    fn default() -> Self {
        Self {
            default_percent: dec!(30),
            min_percent: dec!(15),
            brackets: vec![
                SupportBracket::new(dec!(-100), dec!(45)),
                SupportBracket::new(dec!(-200), dec!(60)),
                SupportBracket::new(dec!(-300), dec!(75)),
            ],
        }
    }
}

impl SupportRatioConfig {
    /// Required support/main initial margin percent for the given main pnl percent.
    pub fn required_percent(&self, main_pnl_percent: Decimal) -> Decimal {
        // deepest threshold the pnl has reached wins
        let staged = self
            .brackets
            .iter()
            .filter(|b| main_pnl_percent <= b.main_pnl_percent)
            .min_by(|a, b| a.main_pnl_percent.cmp(&b.main_pnl_percent))
            .map(|b| b.required_percent)
            .unwrap_or(self.default_percent);

        staged.max(self.min_percent)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| -> Result<(), ConfigError> { Err(ConfigError::InvalidSupport { reason }) };
        if self.min_percent < Decimal::ZERO {
            return invalid("min percent must not be negative".to_string());
        }
        if self.default_percent <= Decimal::ZERO {
            return invalid("default percent must be positive".to_string());
        }
        if let Some(b) = self.brackets.iter().find(|b| b.required_percent <= Decimal::ZERO) {
            return invalid(format!("bracket at {}% requires a non-positive ratio", b.main_pnl_percent));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Hedge<'a> {
    main: &'a Position,
    support: &'a Position,
}

impl<'a> Hedge<'a> {
    pub fn create(a: &'a Position, b: &'a Position) -> Result<Self, HedgeError> {
        if a.side == b.side {
            return Err(HedgeError::SameSide(a.side));
        }
        if a.symbol != b.symbol {
            return Err(HedgeError::SymbolMismatch(a.symbol.clone(), b.symbol.clone()));
        }

        let (main, support) = match compare_weight(a, b) {
            Ordering::Less => (b, a),
            _ => (a, b),
        };
        Ok(Self { main, support })
    }

    /// Hedge of the snapshot, if both sides are open.
    pub fn from_state(state: &'a SandboxState) -> Option<Self> {
        let buy = state.position(Side::Buy)?;
        let sell = state.position(Side::Sell)?;
        Self::create(buy, sell).ok()
    }

    pub fn main_position(&self) -> &'a Position {
        self.main
    }

    pub fn support_position(&self) -> &'a Position {
        self.support
    }

    /// Side whose net size carries the liquidation risk. None when both sizes match.
    pub fn exposed_position(&self) -> Option<&'a Position> {
        match self.main.size.cmp(&self.support.size) {
            Ordering::Greater => Some(self.main),
            Ordering::Less => Some(self.support),
            Ordering::Equal => None,
        }
    }

    pub fn is_support_position(&self, position: &Position) -> bool {
        position.side == self.support.side && position.symbol == self.support.symbol
    }

    pub fn is_main_position(&self, position: &Position) -> bool {
        position.side == self.main.side && position.symbol == self.main.symbol
    }

    /// Support initial margin as a percent of main initial margin.
    pub fn support_rate(&self) -> Decimal {
        let main_margin = self.main.initial_margin.value();
        if main_margin.is_zero() {
            return Decimal::ZERO;
        }
        self.support.initial_margin.value() / main_margin * Decimal::ONE_HUNDRED
    }

    pub fn main_pnl_percent(&self, mark_price: &Price) -> Decimal {
        self.main.pnl_percent(mark_price)
    }

    pub fn required_support_rate(&self, mark_price: &Price, config: &SupportRatioConfig) -> Decimal {
        config.required_percent(self.main_pnl_percent(mark_price))
    }

    pub fn need_increase_support(&self, mark_price: &Price, config: &SupportRatioConfig) -> bool {
        self.support_rate() < self.required_support_rate(mark_price, config)
    }
}

// larger margin first, then earlier open, then larger size; sell wins a full tie
fn compare_weight(a: &Position, b: &Position) -> Ordering {
    a.initial_margin
        .cmp(&b.initial_margin)
        .then_with(|| match (a.opened_at, b.opened_at) {
            (Some(x), Some(y)) => y.cmp(&x),
            _ => Ordering::Equal,
        })
        .then_with(|| a.size.cmp(&b.size))
        .then_with(|| if a.side.is_short() { Ordering::Greater } else { Ordering::Less })
}
