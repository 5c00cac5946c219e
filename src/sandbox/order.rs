//! Hypothetical orders and the reasons the sandbox rejects them.

use crate::config::ConfigError;
use crate::symbol::SymbolSpec;
use crate::types::{Amount, Price, Side, ValidationError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderError {
    #[error("invalid order: {0}")]
    Validation(#[from] ValidationError),

    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: Amount, available: Amount },

    #[error("order violates symbol constraints: {reason}")]
    ConstraintViolation { reason: String },

    #[error("no {side} position to stop")]
    NoPosition { side: Side },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Buy opens or increases a side, Stop closes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderKind {
    Buy,
    Stop,
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderKind::Buy => write!(f, "buy"),
            OrderKind::Stop => write!(f, "stop"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFlags {
    pub with_opposite_order: bool,
    pub close_by_market: bool,
    pub with_short_stop: bool,
}

/// Metadata riding along with an order. Known tags become flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderContext {
    pub flags: OrderFlags,
    pub extra: BTreeMap<String, String>,
}

impl OrderContext {
    pub fn from_tags<S: AsRef<str>>(tags: &[S]) -> Self {
        let mut ctx = Self::default();
        for tag in tags {
            match tag.as_ref() {
                "wOO" => ctx.flags.with_opposite_order = true,
                "cBM" => ctx.flags.close_by_market = true,
                "wSS" => ctx.flags.with_short_stop = true,
                other => {
                    ctx.extra.insert(other.to_string(), String::new());
                }
            }
        }
        ctx
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        match tag {
            "wOO" => self.flags.with_opposite_order,
            "cBM" => self.flags.close_by_market,
            "wSS" => self.flags.with_short_stop,
            other => self.extra.contains_key(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HypotheticalOrder {
    kind: OrderKind,
    side: Side,
    price: Price,
    qty: Decimal,
    context: OrderContext,
}

impl HypotheticalOrder {
    pub fn buy(spec: &SymbolSpec, side: Side, price: Decimal, qty: Decimal) -> Result<Self, OrderError> {
        Self::new(spec, OrderKind::Buy, side, price, qty)
    }

    pub fn stop(spec: &SymbolSpec, side: Side, price: Decimal, qty: Decimal) -> Result<Self, OrderError> {
        Self::new(spec, OrderKind::Stop, side, price, qty)
    }

    // validate raw input, round to the instrument, then check exchange minimums
    pub fn new(spec: &SymbolSpec, kind: OrderKind, side: Side, price: Decimal, qty: Decimal) -> Result<Self, OrderError> {
        if qty <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveQty(qty).into());
        }
        let price = spec.rounded_price(price)?;
        let qty = spec.round_qty(qty);

        if spec.is_below_min_qty(qty) {
            return Err(OrderError::ConstraintViolation {
                reason: format!("qty {} below minimum {}", qty, spec.min_order_qty),
            });
        }
        if spec.is_below_min_notional(qty, price.value()) {
            return Err(OrderError::ConstraintViolation {
                reason: format!("value {} below minimum {}", qty * price.value(), spec.min_notional),
            });
        }

        Ok(Self {
            kind,
            side,
            price,
            qty,
            context: OrderContext::default(),
        })
    }

    pub fn with_context(mut self, context: OrderContext) -> Self {
        self.context = context;
        self
    }

    pub fn kind(&self) -> OrderKind {
        self.kind
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn price(&self) -> Price {
        self.price
    }

    pub fn qty(&self) -> Decimal {
        self.qty
    }

    pub fn context(&self) -> &OrderContext {
        &self.context
    }
}

impl fmt::Display for HypotheticalOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} @ {}", self.kind, self.side, self.qty, self.price)
    }
}
