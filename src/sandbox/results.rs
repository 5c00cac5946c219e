// 4.3: outcome of one order and of a whole run.

use super::order::{HypotheticalOrder, OrderError};
use super::state::SandboxState;
use crate::config::ConfigError;
use crate::types::{Amount, Side};

/// One order's outcome. A rejected order leaves the state untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderExecutionResult {
    input_state: SandboxState,
    order: HypotheticalOrder,
    output_state: SandboxState,
    fail_reason: Option<OrderError>,
    pnl: Option<Amount>,
}

impl OrderExecutionResult {
    pub fn applied(
        input_state: SandboxState,
        order: HypotheticalOrder,
        output_state: SandboxState,
        pnl: Option<Amount>,
    ) -> Self {
        Self {
            input_state,
            order,
            output_state,
            fail_reason: None,
            pnl,
        }
    }

    pub fn rejected(input_state: SandboxState, order: HypotheticalOrder, reason: OrderError) -> Self {
        Self {
            output_state: input_state.clone(),
            input_state,
            order,
            fail_reason: Some(reason),
            pnl: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.fail_reason.is_none()
    }

    pub fn fail_reason(&self) -> Option<&OrderError> {
        self.fail_reason.as_ref()
    }

    /// Realized pnl of a stop, before commission.
    pub fn pnl(&self) -> Option<Amount> {
        self.pnl
    }

    pub fn order(&self) -> &HypotheticalOrder {
        &self.order
    }

    pub fn input_state(&self) -> &SandboxState {
        &self.input_state
    }

    pub fn output_state(&self) -> &SandboxState {
        &self.output_state
    }
}

/// Results of one run, in order. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionStepResult {
    items: Vec<OrderExecutionResult>,
}

impl ExecutionStepResult {
    pub(crate) fn new(items: Vec<OrderExecutionResult>) -> Result<Self, SandboxError> {
        if items.is_empty() {
            return Err(SandboxError::NoOrders);
        }
        Ok(Self { items })
    }

    pub fn items(&self) -> &[OrderExecutionResult] {
        &self.items
    }

    pub fn first_item(&self) -> &OrderExecutionResult {
        &self.items[0]
    }

    pub fn last_item(&self) -> &OrderExecutionResult {
        &self.items[self.items.len() - 1]
    }

    pub fn items_count(&self) -> usize {
        self.items.len()
    }

    pub fn state_before(&self) -> &SandboxState {
        self.first_item().input_state()
    }

    pub fn state_after(&self) -> &SandboxState {
        self.last_item().output_state()
    }

    /// Sum over successful items, `None` when nothing succeeded.
    pub fn total_pnl(&self) -> Option<Amount> {
        let mut executed = self.items.iter().filter(|i| i.is_success()).peekable();
        executed.peek()?;
        Some(executed.filter_map(|i| i.pnl()).sum())
    }

    pub fn position_opened_through_step(&self, side: Side) -> bool {
        !self.state_before().has_position(side) && self.state_after().has_position(side)
    }

    pub fn position_closed_through_step(&self, side: Side) -> bool {
        self.state_before().has_position(side) && !self.state_after().has_position(side)
    }

    pub fn failed_items(&self) -> impl Iterator<Item = &OrderExecutionResult> {
        self.items.iter().filter(|i| !i.is_success())
    }

    pub fn is_fully_successful(&self) -> bool {
        self.items.iter().all(|i| i.is_success())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SandboxError {
    #[error("sandbox has no state loaded")]
    StateNotLoaded,

    #[error("no orders to process")]
    NoOrders,

    #[error("state symbol {actual} does not match sandbox symbol {expected}")]
    SymbolMismatch { expected: String, actual: String },

    #[error("unknown symbol {0}")]
    UnknownSymbol(String),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}
