//! Pre-trade safety checks.
//!
//! Every check answers one question about a candidate set of orders by
//! running them through the sandbox first. `run_checks` stops at the first
//! failure.

use crate::config::SandboxConfig;
use crate::hedge::Hedge;
use crate::sandbox::{recompute_liquidations, simulate, ApplyContext, HypotheticalOrder, SandboxState};
use crate::symbol::SymbolSpec;
use crate::types::{Price, Side};
use rust_decimal::Decimal;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckResult {
    Success,
    Failure { reason: String, retryable: bool },
}

impl CheckResult {
    pub fn failure(reason: impl Into<String>, retryable: bool) -> Self {
        CheckResult::Failure {
            reason: reason.into(),
            retryable,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CheckResult::Success)
    }
}

/// Snapshot and candidate orders a check looks at.
#[derive(Debug, Clone, Copy)]
pub struct CheckContext<'a> {
    pub spec: &'a SymbolSpec,
    pub config: &'a SandboxConfig,
    pub state: &'a SandboxState,
    pub orders: &'a [HypotheticalOrder],
}

impl<'a> CheckContext<'a> {
    // orders applied on top of the snapshot, liquidations fresh
    fn resulting_state(&self, orders: &[HypotheticalOrder]) -> Result<SandboxState, String> {
        let state = if orders.is_empty() {
            self.state.clone()
        } else {
            let step = simulate(self.spec, self.config, self.state, orders).map_err(|e| e.to_string())?;
            step.state_after().clone()
        };
        Ok(recompute_liquidations(&state, &ApplyContext::new(self.spec, self.config)))
    }
}

pub trait TradingCheck {
    fn name(&self) -> &'static str;
    fn check(&self, ctx: &CheckContext<'_>) -> CheckResult;
}

pub fn run_checks(checks: &[&dyn TradingCheck], ctx: &CheckContext<'_>) -> CheckResult {
    for check in checks {
        if let CheckResult::Failure { reason, retryable } = check.check(ctx) {
            debug!(check = check.name(), %reason, retryable, "check failed");
            return CheckResult::failure(format!("{}: {}", check.name(), reason), retryable);
        }
    }
    CheckResult::Success
}

/// Distance between a liquidation price and the mark, in percent of the mark.
/// `None` for the risk-free sentinel.
pub fn liquidation_distance_percent(liquidation: &Price, mark: &Price) -> Option<Decimal> {
    if liquidation.is_zero() || mark.is_zero() {
        return None;
    }
    Some((liquidation.value() - mark.value()).abs() / mark.value() * Decimal::ONE_HUNDRED)
}

fn distance_failure(state: &SandboxState, side: Side, min_percent: Decimal) -> Option<String> {
    let position = state.position(side)?;
    let distance = liquidation_distance_percent(&position.liquidation_price, &state.ticker().mark)?;
    (distance < min_percent).then(|| {
        format!(
            "{} liquidation {} is {:.2}% from mark, minimum {}%",
            side,
            position.liquidation_price,
            distance,
            min_percent
        )
    })
}

/// Every candidate order must be accepted.
pub struct SandboxExecutionCheck;

impl TradingCheck for SandboxExecutionCheck {
    fn name(&self) -> &'static str {
        "sandbox_execution"
    }

    fn check(&self, ctx: &CheckContext<'_>) -> CheckResult {
        let step = match simulate(ctx.spec, ctx.config, ctx.state, ctx.orders) {
            Ok(step) => step,
            Err(e) => return CheckResult::failure(e.to_string(), false),
        };
        let rejection = step.failed_items().next().map(|item| {
            let reason = item.fail_reason().map(|r| r.to_string()).unwrap_or_default();
            format!("{} rejected: {}", item.order(), reason)
        });
        match rejection {
            Some(reason) => CheckResult::failure(reason, false),
            None => CheckResult::Success,
        }
    }
}

/// No liquidation price may end up closer to the mark than the configured distance.
pub struct LiquidationDistanceCheck;

impl TradingCheck for LiquidationDistanceCheck {
    fn name(&self) -> &'static str {
        "liquidation_distance"
    }

    fn check(&self, ctx: &CheckContext<'_>) -> CheckResult {
        let state = match ctx.resulting_state(ctx.orders) {
            Ok(state) => state,
            Err(reason) => return CheckResult::failure(reason, false),
        };
        let min = ctx.config.safety.min_liquidation_distance_percent;

        [Side::Buy, Side::Sell]
            .into_iter()
            .find_map(|side| distance_failure(&state, side, min))
            .map(|reason| CheckResult::failure(reason, true))
            .unwrap_or(CheckResult::Success)
    }
}

/// Closing the support position at mark must keep the main position safe.
pub struct SupportCloseCheck;

impl TradingCheck for SupportCloseCheck {
    fn name(&self) -> &'static str {
        "support_close"
    }

    fn check(&self, ctx: &CheckContext<'_>) -> CheckResult {
        let Some(hedge) = Hedge::from_state(ctx.state) else {
            return CheckResult::Success;
        };
        let support = hedge.support_position();
        let main_side = hedge.main_position().side;

        let mark = ctx.state.ticker().mark.value();
        let close = match HypotheticalOrder::stop(ctx.spec, support.side, mark, support.size) {
            Ok(order) => order,
            Err(e) => return CheckResult::failure(e.to_string(), false),
        };

        let state = match ctx.resulting_state(std::slice::from_ref(&close)) {
            Ok(state) => state,
            Err(reason) => return CheckResult::failure(reason, false),
        };
        match distance_failure(&state, main_side, ctx.config.safety.min_liquidation_distance_percent) {
            Some(reason) => CheckResult::failure(format!("after closing support, {}", reason), true),
            None => CheckResult::Success,
        }
    }
}
