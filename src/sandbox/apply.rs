//! Pure order application.
//!
//! `apply_order` maps a state and an order to a result without touching
//! anything else. Business failures (not enough balance, nothing to stop)
//! come back as a rejected result carrying the reason, never as an error.

use super::order::{HypotheticalOrder, OrderError, OrderKind};
use super::results::OrderExecutionResult;
use super::state::SandboxState;
use crate::config::SandboxConfig;
use crate::liquidation::LiquidationCalculator;
use crate::margin::CostCalculator;
use crate::position::{increase_position, reduce_position, Position};
use crate::symbol::SymbolSpec;
use crate::types::{Amount, Side};

/// Instrument and settings an order is applied under.
#[derive(Debug, Clone, Copy)]
pub struct ApplyContext<'a> {
    pub spec: &'a SymbolSpec,
    pub config: &'a SandboxConfig,
}

impl<'a> ApplyContext<'a> {
    pub fn new(spec: &'a SymbolSpec, config: &'a SandboxConfig) -> Self {
        Self { spec, config }
    }

    fn costs(&self) -> CostCalculator<'a> {
        CostCalculator::new(self.spec, &self.config.fees)
    }
}

pub fn apply_order(state: &SandboxState, order: &HypotheticalOrder, ctx: &ApplyContext<'_>) -> OrderExecutionResult {
    let outcome = match order.kind() {
        OrderKind::Buy => apply_buy(state, order, ctx).map(|next| (next, None)),
        OrderKind::Stop => apply_stop(state, order, ctx).map(|(next, pnl)| (next, Some(pnl))),
    };

    match outcome {
        Ok((next, pnl)) => OrderExecutionResult::applied(state.clone(), order.clone(), next, pnl),
        Err(reason) => OrderExecutionResult::rejected(state.clone(), order.clone(), reason),
    }
}

/// Opens or increases the order's side.
pub fn apply_buy(
    state: &SandboxState,
    order: &HypotheticalOrder,
    ctx: &ApplyContext<'_>,
) -> Result<SandboxState, OrderError> {
    let side = order.side();
    let price = order.price();
    let qty = order.qty();
    let existing = state.position(side);

    let leverage = match existing {
        Some(p) => p.leverage,
        None => ctx.config.margin.leverage()?,
    };

    let costs = ctx.costs();
    let required = costs.total_buy_cost(price.value(), qty, leverage.value(), side)?;
    if required > state.available_balance() {
        return Err(OrderError::InsufficientBalance {
            required,
            available: state.available_balance(),
        });
    }

    let margin = costs.order_margin(price.value(), qty, leverage.value())?;
    let fee = costs.open_fee(price.value(), qty)?;

    let position = match existing {
        Some(p) => increase_position(p, qty, &price, margin),
        None => Position::new(side, state.symbol(), price, qty, leverage, margin),
    };

    let spent = margin.add(fee);
    let next = state.replace(side, Some(position)).with_balances(
        state.free_balance().sub(spent),
        state.available_balance().sub(spent),
    );
    Ok(recompute_liquidations(&next, ctx))
}

/// Closes up to the order's qty on its side. Returns the new state and the realized pnl.
pub fn apply_stop(
    state: &SandboxState,
    order: &HypotheticalOrder,
    ctx: &ApplyContext<'_>,
) -> Result<(SandboxState, Amount), OrderError> {
    let side = order.side();
    let position = state.position(side).ok_or(OrderError::NoPosition { side })?;
    let exit = order.price();

    let update = reduce_position(position, order.qty(), &exit, ctx.spec);
    let fee = ctx.costs().execution_fee(exit.value(), update.closed_qty)?;

    let delta = update.margin_released.add(update.realized_pnl).sub(fee);
    let next = state.replace(side, update.new_position).with_balances(
        state.free_balance().add(delta),
        state.available_balance().add(delta),
    );
    Ok((recompute_liquidations(&next, ctx), update.realized_pnl))
}

/// Liquidation price of every open side against the state's free balance.
pub fn recompute_liquidations(state: &SandboxState, ctx: &ApplyContext<'_>) -> SandboxState {
    let calc = LiquidationCalculator::new(ctx.spec, &ctx.config.margin);
    let mut next = state.clone();

    for side in [Side::Buy, Side::Sell] {
        if let Some(position) = state.position(side) {
            let estimate = calc.handle(position, state.opposite(side), state.free_balance());
            let updated = position.clone().with_liquidation_price(estimate.price);
            next = next.replace(side, Some(updated));
        }
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::position::Ticker;
    use crate::types::Leverage;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn state_with(spec: &SymbolSpec, free: Decimal, available: Decimal, positions: Vec<Position>) -> SandboxState {
        let ticker = Ticker::flat(spec.price(dec!(67800)).unwrap());
        let mut state = SandboxState::new(spec.name.clone(), ticker, Amount::new(free), Amount::new(available));
        for p in positions {
            state = state.with_position(p).unwrap();
        }
        state
    }

    fn short(spec: &SymbolSpec, size: Decimal) -> Position {
        Position::open(spec, Side::Sell, dec!(67533.43), size, Leverage::new(100).unwrap()).unwrap()
    }

    #[test]
    fn buy_opens_new_side_at_default_leverage() {
        let spec = SymbolSpec::btc_usdt();
        let config = SandboxConfig::default();
        let ctx = ApplyContext::new(&spec, &config);
        let state = state_with(&spec, dec!(100), dec!(100), vec![]);
        let order = HypotheticalOrder::buy(&spec, Side::Buy, dec!(50000), dec!(0.01)).unwrap();

        let next = apply_buy(&state, &order, &ctx).unwrap();

        let pos = next.position(Side::Buy).unwrap();
        assert_eq!(pos.leverage.value(), 100);
        assert_eq!(pos.initial_margin.value(), dec!(5));
        // margin 5 + fee 0.275
        assert_eq!(next.free_balance().value(), dec!(94.725));
        assert_eq!(next.available_balance().value(), dec!(94.725));
        assert!(!pos.liquidation_price.is_zero());
        assert!(pos.liquidation_price.value() < dec!(50000));
    }

    #[test]
    fn out_of_range_default_leverage_rejects_fresh_side() {
        let spec = SymbolSpec::btc_usdt();
        let mut config = SandboxConfig::default();
        config.margin.default_leverage = 150;
        let ctx = ApplyContext::new(&spec, &config);
        let state = state_with(&spec, dec!(100), dec!(100), vec![short(&spec, dec!(0.1))]);

        let fresh = HypotheticalOrder::buy(&spec, Side::Buy, dec!(50000), dec!(0.01)).unwrap();
        assert!(matches!(
            apply_buy(&state, &fresh, &ctx),
            Err(OrderError::Config(ConfigError::InvalidMargin { .. }))
        ));

        // an existing side keeps its own leverage
        let more = HypotheticalOrder::buy(&spec, Side::Sell, dec!(67800), dec!(0.001)).unwrap();
        assert!(apply_buy(&state, &more, &ctx).is_ok());
    }

    #[test]
    fn buy_beyond_available_is_rejected() {
        let spec = SymbolSpec::btc_usdt();
        let config = SandboxConfig::default();
        let ctx = ApplyContext::new(&spec, &config);
        let state = state_with(&spec, dec!(100), dec!(5), vec![]);
        let order = HypotheticalOrder::buy(&spec, Side::Buy, dec!(50000), dec!(0.01)).unwrap();

        let result = apply_order(&state, &order, &ctx);

        assert!(!result.is_success());
        assert_eq!(result.output_state(), &state);
        assert!(matches!(
            result.fail_reason(),
            Some(OrderError::InsufficientBalance { .. })
        ));
    }

    #[test]
    fn stop_without_position_is_rejected() {
        let spec = SymbolSpec::btc_usdt();
        let config = SandboxConfig::default();
        let ctx = ApplyContext::new(&spec, &config);
        let state = state_with(&spec, dec!(100), dec!(100), vec![short(&spec, dec!(0.1))]);
        let order = HypotheticalOrder::stop(&spec, Side::Buy, dec!(67000), dec!(0.01)).unwrap();

        let result = apply_order(&state, &order, &ctx);

        assert_eq!(result.fail_reason(), Some(&OrderError::NoPosition { side: Side::Buy }));
        assert_eq!(result.pnl(), None);
    }

    #[test]
    fn stop_credits_margin_and_pnl_minus_fee() {
        let spec = SymbolSpec::btc_usdt();
        let config = SandboxConfig::default();
        let ctx = ApplyContext::new(&spec, &config);
        let state = state_with(&spec, dec!(97.7787), dec!(34.2720), vec![short(&spec, dec!(0.188))]);
        let order = HypotheticalOrder::stop(&spec, Side::Sell, dec!(67850), dec!(0.001)).unwrap();

        let (next, pnl) = apply_stop(&state, &order, &ctx).unwrap();

        // released 0.6753, pnl -0.3166, fee 0.0373
        assert_eq!(pnl.value(), dec!(-0.3166));
        assert_eq!(next.free_balance().value(), dec!(98.1001));
        assert_eq!(next.available_balance().value(), dec!(34.5934));
        assert_eq!(next.position(Side::Sell).unwrap().size, dec!(0.187));
    }

    #[test]
    fn full_stop_removes_side() {
        let spec = SymbolSpec::btc_usdt();
        let config = SandboxConfig::default();
        let ctx = ApplyContext::new(&spec, &config);
        let state = state_with(&spec, dec!(100), dec!(100), vec![short(&spec, dec!(0.1))]);
        let order = HypotheticalOrder::stop(&spec, Side::Sell, dec!(67000), dec!(0.1)).unwrap();

        let (next, _) = apply_stop(&state, &order, &ctx).unwrap();

        assert!(!next.has_position(Side::Sell));
    }

    #[test]
    fn recompute_marks_support_risk_free() {
        let spec = SymbolSpec::btc_usdt();
        let config = SandboxConfig::default();
        let ctx = ApplyContext::new(&spec, &config);
        let long = Position::open(&spec, Side::Buy, dec!(61933.88), dec!(0.1), Leverage::new(100).unwrap()).unwrap();
        let state = state_with(&spec, dec!(97.7787), dec!(34.2720), vec![short(&spec, dec!(0.188)), long]);

        let next = recompute_liquidations(&state, &ctx);

        assert_eq!(next.position(Side::Sell).unwrap().liquidation_price.value(), dec!(75345.34));
        assert!(next.position(Side::Buy).unwrap().liquidation_price.is_zero());
    }
}
