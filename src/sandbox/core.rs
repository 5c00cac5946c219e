// 4.0 sandbox/core.rs: threads a snapshot through hypothetical orders.
// the sandbox owns nothing but the current state; each order's output feeds the next.

use super::apply::{apply_order, ApplyContext};
use super::order::HypotheticalOrder;
use super::results::{ExecutionStepResult, OrderExecutionResult, SandboxError};
use super::state::SandboxState;
use crate::config::SandboxConfig;
use crate::provider::SymbolSpecProvider;
use crate::symbol::SymbolSpec;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SandboxPhase {
    Unloaded,
    Idle,
}

/** 4.1: one instrument, one config, at most one loaded state */
#[derive(Debug, Clone)]
pub struct Sandbox {
    spec: SymbolSpec,
    config: SandboxConfig,
    state: Option<SandboxState>,
}

impl Sandbox {
    pub fn new(spec: SymbolSpec, config: SandboxConfig) -> Result<Self, SandboxError> {
        config.validate()?;
        Ok(Self {
            spec,
            config,
            state: None,
        })
    }

    pub fn for_symbol(
        specs: &dyn SymbolSpecProvider,
        symbol: &str,
        config: SandboxConfig,
    ) -> Result<Self, SandboxError> {
        let spec = specs
            .spec(symbol)
            .ok_or_else(|| SandboxError::UnknownSymbol(symbol.to_string()))?;
        Self::new(spec, config)
    }

    pub fn spec(&self) -> &SymbolSpec {
        &self.spec
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    pub fn phase(&self) -> SandboxPhase {
        match self.state {
            Some(_) => SandboxPhase::Idle,
            None => SandboxPhase::Unloaded,
        }
    }

    pub fn state(&self) -> Option<&SandboxState> {
        self.state.as_ref()
    }

    pub fn set_state(&mut self, state: SandboxState) -> Result<(), SandboxError> {
        if state.symbol() != self.spec.name {
            return Err(SandboxError::SymbolMismatch {
                expected: self.spec.name.clone(),
                actual: state.symbol().to_string(),
            });
        }
        self.state = Some(state);
        Ok(())
    }

    /// Applies `orders` in sequence and leaves the sandbox at the last output state.
    pub fn process_orders(&mut self, orders: &[HypotheticalOrder]) -> Result<ExecutionStepResult, SandboxError> {
        if orders.is_empty() {
            return Err(SandboxError::NoOrders);
        }
        let mut current = self.state.clone().ok_or(SandboxError::StateNotLoaded)?;

        let ctx = ApplyContext::new(&self.spec, &self.config);
        let mut items = Vec::with_capacity(orders.len());
        for order in orders {
            let result = apply_order(&current, order, &ctx);
            log_result(&result);
            current = result.output_state().clone();
            items.push(result);
        }

        let step = ExecutionStepResult::new(items)?;
        if self.config.verbose {
            info!(
                symbol = %self.spec.name,
                orders = step.items_count(),
                failed = step.failed_items().count(),
                free = %step.state_after().free_balance(),
                available = %step.state_after().available_balance(),
                "sandbox run finished"
            );
        }

        self.state = Some(current);
        Ok(step)
    }

    pub fn process_order(&mut self, order: &HypotheticalOrder) -> Result<OrderExecutionResult, SandboxError> {
        let step = self.process_orders(std::slice::from_ref(order))?;
        Ok(step.first_item().clone())
    }
}

fn log_result(result: &OrderExecutionResult) {
    match result.fail_reason() {
        None => debug!(
            order = %result.order(),
            pnl = ?result.pnl().map(|p| p.value()),
            free = %result.output_state().free_balance(),
            "order applied"
        ),
        Some(reason) => debug!(order = %result.order(), %reason, "order rejected"),
    }
}

/// Runs `orders` against `state` without keeping a sandbox around.
pub fn simulate(
    spec: &SymbolSpec,
    config: &SandboxConfig,
    state: &SandboxState,
    orders: &[HypotheticalOrder],
) -> Result<ExecutionStepResult, SandboxError> {
    let mut sandbox = Sandbox::new(spec.clone(), config.clone())?;
    sandbox.set_state(state.clone())?;
    sandbox.process_orders(orders)
}
